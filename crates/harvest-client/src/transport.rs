//! The HTTP seam under the request client.
//!
//! [`Transport`] performs exactly one GET and reports what came back. It
//! does not judge the status or the body; classification and retry live
//! in [`RequestClient`](crate::RequestClient). The production
//! implementation wraps a shared [`reqwest::Client`]; tests script
//! responses instead.

use std::future::Future;

use crate::config::ApiConfig;
use crate::error::ClientError;

/// Status and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpResponse {
    /// A 200 response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Performs a single HTTP GET.
pub trait Transport: Send + Sync {
    /// Fetch `url` and return its status and body.
    ///
    /// Fails with [`ClientError::Transport`] only when no response was
    /// obtained at all.
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, ClientError>> + Send;
}

/// Production transport backed by [`reqwest`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with the configured user agent and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the TLS backend cannot be
    /// initialized.
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout())
            .connect_timeout(config.request_timeout())
            .gzip(true)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, ClientError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Transport(format!("request timeout: {}", e.without_url()))
            } else if e.is_connect() {
                ClientError::Transport(format!("connection failed: {}", e.without_url()))
            } else {
                ClientError::Transport(format!("request failed: {}", e.without_url()))
            }
        })?;

        let status = response.status().as_u16();
        // Reading the body consumes the response, so the connection is
        // released on every path out of this function.
        let body = response.text().await.map_err(|e| {
            ClientError::Transport(format!("failed to read response body: {}", e.without_url()))
        })?;

        Ok(HttpResponse { status, body })
    }
}
