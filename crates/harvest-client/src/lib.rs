//! Resilient client for the Stack Exchange REST API.
//!
//! The client issues one HTTP call at a time, retries failures with
//! exponential backoff, and hands callers a parsed payload or a terminal
//! [`ClientError::RequestFailed`]. On top of it, [`CatalogApi`] builds the
//! paged and batched requests the collector needs and hides the
//! `has_more` continuation loop from its callers.
//!
//! # Architecture
//!
//! ```text
//! CatalogApi (stats, pages, multi-id batches)
//!     |
//!     +-- RequestClient (URL building, retry, backoff, payload checks)
//!             |
//!             +-- Transport (reqwest in production, scripted in tests)
//! ```
//!
//! # Modules
//!
//! - [`config`] -- API endpoint and retry policy settings
//! - [`error`] -- [`ClientError`] taxonomy
//! - [`transport`] -- The [`Transport`] seam and its `reqwest` implementation
//! - [`request`] -- [`RequestClient::execute`] with retry and backoff
//! - [`query`] -- [`CatalogApi`] domain queries

pub mod config;
pub mod error;
pub mod query;
pub mod request;
pub mod transport;

#[cfg(test)]
mod scripted;

// Re-export primary types for convenience.
pub use config::{ApiConfig, RetryPolicy};
pub use error::ClientError;
pub use query::CatalogApi;
pub use request::RequestClient;
pub use transport::{HttpResponse, ReqwestTransport, Transport};
