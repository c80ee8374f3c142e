//! Shared application state for the read API.

use chrono::{DateTime, Utc};
use harvest_db::{DbError, LastUpdateStore};
use sqlx::PgPool;

/// Where the last-update timestamp is read from.
#[derive(Debug, Clone)]
pub enum LastUpdateReader {
    /// The `last_update` table.
    Postgres(PgPool),
    /// A fixed value; `None` means no run has completed.
    Fixed(Option<DateTime<Utc>>),
}

impl LastUpdateReader {
    /// Time of the last completed run, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database query fails.
    pub async fn latest(&self) -> Result<Option<DateTime<Utc>>, DbError> {
        match self {
            Self::Postgres(pool) => LastUpdateStore::new(pool).latest().await,
            Self::Fixed(at) => Ok(*at),
        }
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Source of the last-update timestamp.
    pub reader: LastUpdateReader,
}

impl AppState {
    /// State reading from `PostgreSQL`.
    pub const fn from_pool(pool: PgPool) -> Self {
        Self {
            reader: LastUpdateReader::Postgres(pool),
        }
    }

    /// State serving a fixed timestamp.
    pub const fn fixed(at: Option<DateTime<Utc>>) -> Self {
        Self {
            reader: LastUpdateReader::Fixed(at),
        }
    }
}
