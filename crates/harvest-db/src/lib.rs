//! `PostgreSQL` persistence for the Q&A harvester.
//!
//! A finished collection run lands here in one call. The writer streams
//! each record kind through batched `UNNEST` inserts that skip rows whose
//! key already exists, fanning each record out to its owner, tags, and
//! the identifiers mentioned in its body.
//!
//! # Architecture
//!
//! ```text
//! Collector (harvest-core)
//!     |
//!     +-- RecordSink::persist --> BatchWriter
//!             |-- owner / question / tag / api rows    (per batch)
//!             |-- answer and comment rows              (per batch)
//!             +-- last_update marker                   (once per run)
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool and configuration
//! - [`writer`] -- Batched, conflict-tolerant record writer
//! - [`extract`] -- Identifier extraction from post bodies
//! - [`last_update`] -- Single-row "last successful run" marker
//! - [`error`] -- Shared error types

pub mod error;
pub mod extract;
pub mod last_update;
pub mod postgres;
pub mod writer;

// Re-export primary types for convenience.
pub use error::{DbError, PersistError, RecordKind};
pub use extract::{IdentifierExtractor, PrefixExtractor};
pub use last_update::LastUpdateStore;
pub use postgres::{PostgresConfig, PostgresPool};
pub use writer::BatchWriter;
