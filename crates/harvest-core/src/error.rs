//! Error types for the collection lifecycle.

use harvest_client::ClientError;

use crate::state::CollectionState;

/// A state change that the transition rules forbid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// `from` cannot move to `to`.
    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition {
        /// Current state.
        from: CollectionState,
        /// Rejected target state.
        to: CollectionState,
    },
}

/// Errors from reading or writing the checkpoint file.
///
/// These never abort a run: a failed load starts fresh and a failed save
/// is logged. They surface only from the fallible inner API.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// Reading, writing or renaming the file failed.
    #[error("checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file content is not a valid checkpoint.
    #[error("checkpoint serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that end a collection run.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// An API call failed after exhausting its retries.
    #[error("API request failed: {0}")]
    Client(#[from] ClientError),

    /// A phase tried an illegal state change.
    #[error(transparent)]
    InvalidTransition(#[from] StateError),

    /// The record sink rejected the collected records.
    #[error("failed to persist collected records: {source}")]
    Persistence {
        /// The sink's error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The checkpoint already records a completed run.
    #[error("collection already completed; remove the checkpoint to start a new run")]
    AlreadyCompleted,
}
