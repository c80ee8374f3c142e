//! Single-call execution with retry and exponential backoff.
//!
//! [`RequestClient::execute`] builds the full URL (endpoint, caller query,
//! site selector, key), then tries up to `max_attempts` times. Any failure
//! is retried: no response, a non-2xx status, a body that is not a JSON
//! object, or a body carrying an embedded error object. Between attempts
//! the task sleeps `base * min(64, 2^attempt)`.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ApiConfig, RetryPolicy};
use crate::error::ClientError;
use crate::transport::Transport;

/// Maximum number of body characters kept in a [`ClientError::Status`].
const ERROR_BODY_LIMIT: usize = 512;

/// Issues API calls one at a time with retry.
#[derive(Debug)]
pub struct RequestClient<T> {
    transport: T,
    config: ApiConfig,
    retry: RetryPolicy,
}

impl<T: Transport> RequestClient<T> {
    /// Create a client over the given transport.
    pub const fn new(transport: T, config: ApiConfig, retry: RetryPolicy) -> Self {
        Self {
            transport,
            config,
            retry,
        }
    }

    /// The API settings this client was built with.
    pub const fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// The retry policy this client was built with.
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// The underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Build `{base}/{endpoint}?{query}&site={site}&key={key}`.
    ///
    /// The query may be empty; the key is omitted when not configured.
    pub fn build_url(&self, endpoint: &str, query: &str) -> String {
        let mut url = format!(
            "{}/{}?",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        if !query.is_empty() {
            url.push_str(query);
            url.push('&');
        }
        url.push_str("site=");
        url.push_str(&self.config.site);
        if !self.config.key.is_empty() {
            url.push_str("&key=");
            url.push_str(&self.config.key);
        }
        url
    }

    /// Call `endpoint` and return the parsed JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RequestFailed`] wrapping the last cause once
    /// every attempt has failed.
    pub async fn execute(&self, endpoint: &str, query: &str) -> Result<Value, ClientError> {
        self.execute_as(endpoint, query).await
    }

    /// Call `endpoint` and decode the payload into `R`.
    ///
    /// A payload that parses as JSON but does not decode into `R` counts as
    /// a failed attempt, like any other payload failure.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RequestFailed`] wrapping the last cause once
    /// every attempt has failed.
    pub async fn execute_as<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &str,
    ) -> Result<R, ClientError> {
        let url = self.build_url(endpoint, query);
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt: u32 = 1;

        loop {
            match self.attempt_once::<R>(&url).await {
                Ok(payload) => {
                    if attempt > 1 {
                        debug!(endpoint, attempt, "API request succeeded after retry");
                    }
                    return Ok(payload);
                }
                Err(err) if attempt >= max_attempts => {
                    return Err(ClientError::RequestFailed {
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
                Err(err) => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(
                        endpoint,
                        query,
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "API request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }

    /// One attempt: fetch, check status, parse, check for an embedded error.
    async fn attempt_once<R: DeserializeOwned>(&self, url: &str) -> Result<R, ClientError> {
        let response = self.transport.get(url).await?;

        if !response.is_success() {
            return Err(ClientError::Status {
                status: response.status,
                body: response.body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        let payload: Value = serde_json::from_str(&response.body)?;
        check_payload(&payload)?;
        Ok(serde_json::from_value(payload)?)
    }
}

/// Reject payloads that are not objects or that carry an error object.
///
/// The API reports errors either as a nested `error` object or as
/// top-level `error_id` / `error_name` / `error_message` fields.
fn check_payload(payload: &Value) -> Result<(), ClientError> {
    if !payload.is_object() {
        return Err(ClientError::Decode(serde::de::Error::custom(
            "expected a JSON object",
        )));
    }

    if let Some(error) = payload.get("error") {
        return Err(api_error(error, "error_id", "error_name", "message"));
    }

    if payload.get("error_id").is_some() {
        return Err(api_error(payload, "error_id", "error_name", "error_message"));
    }

    Ok(())
}

fn api_error(source: &Value, id_key: &str, name_key: &str, message_key: &str) -> ClientError {
    let text = |key: &str| {
        source
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    };
    ClientError::Api {
        id: source.get(id_key).and_then(Value::as_i64).unwrap_or_default(),
        name: text(name_key),
        message: text(message_key),
    }
}
