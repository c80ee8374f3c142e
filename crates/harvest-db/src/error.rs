//! Error types for the data layer.
//!
//! Pool and migration failures surface as [`DbError`]. Failures while
//! writing a run surface as [`PersistError`], which names the record kind
//! whose batch failed.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// The record kinds the writer lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Question rows and their tags and identifiers.
    Question,
    /// Answer rows and their identifiers.
    Answer,
    /// Comment rows and their identifiers.
    Comment,
}

impl core::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Question => f.write_str("question"),
            Self::Answer => f.write_str("answer"),
            Self::Comment => f.write_str("comment"),
        }
    }
}

/// Errors that can occur while persisting a run.
///
/// The failing transaction has been rolled back by the time one of these
/// is returned. Nothing is retried at this layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// No connection could be obtained, or a transaction could not start.
    #[error("connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// A batch of one record kind failed.
    #[error("failed to write {kind} batch starting at row {offset}: {source}")]
    Batch {
        /// Record kind being written.
        kind: RecordKind,
        /// Index of the batch's first record.
        offset: usize,
        /// The statement error.
        #[source]
        source: sqlx::Error,
    },

    /// Relaxing or restoring integrity enforcement failed. A deferred
    /// constraint violated at restore time surfaces here.
    #[error("integrity toggle failed: {0}")]
    Integrity(#[source] sqlx::Error),

    /// Writing the last-update marker or committing the run failed.
    #[error("failed to finalize run: {0}")]
    Finalize(#[source] sqlx::Error),
}
