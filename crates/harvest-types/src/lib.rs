//! Shared type definitions for the Q&A harvest pipeline.
//!
//! This crate is the single source of truth for the records the pipeline
//! fetches from the Stack Exchange API and lands in `PostgreSQL`. Every
//! other crate in the workspace speaks in these types.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for externally assigned identifiers
//! - [`records`] -- Question, answer, comment, and owner records
//! - [`envelope`] -- The API response envelope (`items` + `has_more`)

pub mod envelope;
pub mod ids;
pub mod records;

// Re-export all public types at crate root for convenience.
pub use envelope::{Envelope, Totals};
pub use ids::{AccountId, AnswerId, CommentId, PostId, QuestionId, UserId};
pub use records::{Answer, Comment, Keyed, Owner, PostKind, Question, DELETED_DISPLAY_NAME};
