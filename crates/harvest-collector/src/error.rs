//! Error types for the collector binary.
//!
//! [`CollectorError`] is the top-level error type that wraps all possible
//! failure modes during startup, collection, and serving.

/// Top-level error for the collector binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: harvest_core::config::ConfigError,
    },

    /// The HTTP client could not be built.
    #[error("client error: {source}")]
    Client {
        /// The underlying client error.
        #[from]
        source: harvest_client::ClientError,
    },

    /// Connecting to or migrating the database failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        #[from]
        source: harvest_db::DbError,
    },

    /// The collection run failed.
    #[error("collection error: {source}")]
    Collect {
        /// The underlying collection error.
        #[from]
        source: harvest_core::CollectError,
    },

    /// The read API server failed.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: harvest_observer::ServerError,
    },

    /// The command line could not be understood.
    #[error("usage: harvest-collector [collect|serve] (got `{0}`)")]
    Usage(String),
}
