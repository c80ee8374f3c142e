//! Read API for the Q&A harvester.
//!
//! An Axum HTTP server exposing the single value downstream consumers
//! need from a collection run: when the last successful run completed.
//!
//! | Method | Path | Response |
//! |--------|------|----------|
//! | `GET` | `/api/last-update` | `{"last_update": "<RFC3339>"}`, or 404 before the first completed run |
//!
//! The value comes from a [`LastUpdateReader`]: the `last_update` table in
//! production, a fixed value in tests.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::{AppState, LastUpdateReader};
