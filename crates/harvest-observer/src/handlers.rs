//! REST endpoint handlers for the read API.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::SecondsFormat;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /api/last-update -- time of the last completed run
// ---------------------------------------------------------------------------

/// Return the completion time of the last successful run as RFC 3339.
///
/// Responds 404 until a run has completed.
pub async fn get_last_update(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let at = state
        .reader
        .latest()
        .await?
        .ok_or_else(|| ObserverError::NotFound(String::from("no completed run recorded")))?;

    Ok(Json(serde_json::json!({
        "last_update": at.to_rfc3339_opts(SecondsFormat::Secs, true),
    })))
}
