//! Collection lifecycle for the Q&A harvester.
//!
//! This crate owns the resumable part of a run: the validated
//! [`CollectionState`] machine, the crash-safe [`CollectionCheckpoint`], and
//! the [`Collector`] that drives phases in order, deduplicates fetched
//! records, and hands the finished record sets to a [`RecordSink`].
//!
//! # Modules
//!
//! - [`config`] -- `harvest-config.yaml` loading into typed structs.
//! - [`state`] -- [`CollectionState`] with transition legality.
//! - [`checkpoint`] -- Durable progress record with atomic save.
//! - [`dedup`] -- Identifier-keyed ordered record sets.
//! - [`source`] -- [`CatalogSource`] and [`RecordSink`] seams.
//! - [`orchestrator`] -- The [`Collector`] phase driver.
//! - [`error`] -- Shared error types.

pub mod checkpoint;
pub mod config;
pub mod dedup;
pub mod error;
pub mod orchestrator;
pub mod source;
pub mod state;

pub use checkpoint::CollectionCheckpoint;
pub use config::{HarvestConfig, IntegrityMode};
pub use dedup::RecordSet;
pub use error::{CheckpointError, CollectError, StateError};
pub use orchestrator::Collector;
pub use source::{CatalogSource, RecordSink};
pub use state::CollectionState;
