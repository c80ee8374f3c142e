//! Error types for the API client.
//!
//! Every per-attempt failure is retryable: transport errors, non-success
//! statuses, unparseable bodies, and well-formed bodies carrying an
//! embedded error object. Once the attempt budget is spent the last cause
//! is wrapped in [`ClientError::RequestFailed`].

/// Errors that can occur while calling the API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("API returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },

    /// The body was not the JSON shape we expected.
    #[error("response decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The body carried an embedded error object.
    #[error("API error {id} ({name}): {message}")]
    Api {
        /// Numeric error id.
        id: i64,
        /// Error name (e.g. `throttle_violation`).
        name: String,
        /// Human-readable message.
        message: String,
    },

    /// Every attempt failed.
    #[error("request failed after {attempts} attempts: {source}")]
    RequestFailed {
        /// Number of attempts made.
        attempts: u32,
        /// The last failure observed.
        #[source]
        source: Box<ClientError>,
    },
}

impl ClientError {
    /// Number of attempts behind this error (1 for single-attempt failures).
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::RequestFailed { attempts, .. } => *attempts,
            _ => 1,
        }
    }
}
