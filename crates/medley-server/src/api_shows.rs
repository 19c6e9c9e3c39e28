//! Show API handlers.

use crate::error::{json_body, ApiError};
use crate::AppState;
use axum::{body::Bytes, extract::Extension, response::Json};
use chrono::{DateTime, SecondsFormat, Utc};
use medley_venues::{create_show, list_shows, ListingError, NewShow};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct CreateShowRequest {
    pub artist_id: i64,
    pub venue_id: i64,
    pub start_time: String,
}

/// GET /shows
pub async fn list_shows_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.pool.clone();
    let shows = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        list_shows(&conn).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({ "success": true, "shows": shows })))
}

/// POST /shows
pub async fn create_show_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let payload: CreateShowRequest = json_body(&body)?;

    // Normalize the start time to UTC; reject anything that is not a
    // parseable RFC 3339 timestamp so stored values stay comparable.
    let start_time = DateTime::parse_from_rfc3339(&payload.start_time)
        .map_err(|_| {
            ApiError::BadRequest("start_time must be an RFC 3339 timestamp".to_string())
        })?
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Secs, true);

    let new_show = NewShow {
        artist_id: payload.artist_id,
        venue_id: payload.venue_id,
        start_time,
    };

    let pool = state.pool.clone();
    let created = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        create_show(&conn, &new_show).map_err(|e| {
            // A show pointing at a missing artist or venue trips FK
            // enforcement -> 422.
            if let ListingError::Database(rusqlite::Error::SqliteFailure(code, _)) = &e {
                if code.code == rusqlite::ffi::ErrorCode::ConstraintViolation {
                    return ApiError::Unprocessable(
                        "show references an unknown artist or venue".to_string(),
                    );
                }
            }
            ApiError::from(e)
        })
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({ "success": true, "created": created })))
}
