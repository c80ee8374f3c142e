//! The single-row "last successful run" marker.
//!
//! The writer stamps it at the end of every successful run; the read API
//! serves it back.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::error::DbError;

/// Operations on the `last_update` table.
pub struct LastUpdateStore<'a> {
    pool: &'a PgPool,
}

impl<'a> LastUpdateStore<'a> {
    /// Create a store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Time of the last completed run, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn latest(&self) -> Result<Option<DateTime<Utc>>, DbError> {
        let row: Option<(DateTime<Utc>,)> =
            sqlx::query_as(r"SELECT last_update_time FROM last_update WHERE id")
                .fetch_optional(self.pool)
                .await?;
        Ok(row.map(|(at,)| at))
    }

    /// Set the marker to `at`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the upsert fails.
    pub async fn record(&self, at: DateTime<Utc>) -> Result<(), DbError> {
        let mut conn = self.pool.acquire().await?;
        record_on(&mut conn, at).await?;
        Ok(())
    }
}

/// Upsert the marker on an existing connection or transaction.
pub(crate) async fn record_on(conn: &mut PgConnection, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"INSERT INTO last_update (id, last_update_time) VALUES (TRUE, $1)
          ON CONFLICT (id) DO UPDATE SET last_update_time = EXCLUDED.last_update_time",
    )
    .bind(at)
    .execute(conn)
    .await?;
    Ok(())
}
