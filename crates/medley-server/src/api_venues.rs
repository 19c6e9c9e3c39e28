//! Venue API handlers.

use crate::error::{json_body, ApiError};
use crate::{now_rfc3339, AppState};
use axum::{
    body::Bytes,
    extract::{Extension, Path},
    response::Json,
};
use medley_venues::{
    create_venue, delete_venue, get_venue, list_venues_grouped, search_venues, update_venue,
    venue_shows, NewVenue, Venue, VenueShow, VenueUpdate,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Maximum length for a venue or artist name.
pub(crate) const MAX_NAME_LEN: usize = 256;

#[derive(Deserialize)]
pub struct CreateVenueRequest {
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    pub search_term: String,
}

/// A venue detail page: the record plus its shows split around now.
#[derive(Serialize)]
pub struct VenueDetail {
    #[serde(flatten)]
    pub venue: Venue,
    pub past_shows: Vec<VenueShow>,
    pub upcoming_shows: Vec<VenueShow>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

/// GET /venues
///
/// Venues grouped by locality, each with its upcoming-show count.
pub async fn list_venues_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.pool.clone();
    let now = now_rfc3339();
    let areas = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        list_venues_grouped(&conn, &now).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({ "success": true, "areas": areas })))
}

/// POST /venues
pub async fn create_venue_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let payload: CreateVenueRequest = json_body(&body)?;

    if payload.name.is_empty() || payload.name.len() > MAX_NAME_LEN {
        return Err(ApiError::BadRequest("venue name must be 1-256 bytes".to_string()));
    }

    let new_venue = NewVenue {
        name: payload.name,
        genres: payload.genres,
        city: payload.city,
        state: payload.state,
        address: payload.address,
        phone: payload.phone,
        image_link: payload.image_link,
        facebook_link: payload.facebook_link,
        website: payload.website,
        seeking_talent: payload.seeking_talent,
        seeking_description: payload.seeking_description,
    };

    let pool = state.pool.clone();
    let created = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        create_venue(&conn, &new_venue).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({ "success": true, "created": created })))
}

/// POST /venues/search
pub async fn search_venues_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let payload: SearchRequest = json_body(&body)?;

    let pool = state.pool.clone();
    let now = now_rfc3339();
    let data = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        search_venues(&conn, &payload.search_term, &now).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({
        "success": true,
        "count": data.len(),
        "data": data,
    })))
}

/// GET /venues/:venueId
pub async fn get_venue_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(venue_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.pool.clone();
    let now = now_rfc3339();
    let detail = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        let venue = get_venue(&conn, venue_id)?;
        let shows = venue_shows(&conn, venue_id, &now)?;
        Ok::<_, ApiError>(VenueDetail {
            venue,
            past_shows_count: shows.past.len(),
            upcoming_shows_count: shows.upcoming.len(),
            past_shows: shows.past,
            upcoming_shows: shows.upcoming,
        })
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({ "success": true, "venue": detail })))
}

/// PATCH /venues/:venueId
pub async fn update_venue_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(venue_id): Path<i64>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updates: VenueUpdate = json_body(&body)?;

    if let Some(name) = &updates.name {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(ApiError::BadRequest("venue name must be 1-256 bytes".to_string()));
        }
    }

    let pool = state.pool.clone();
    let venue = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        update_venue(&conn, venue_id, &updates)?;
        get_venue(&conn, venue_id).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({ "success": true, "venue": venue })))
}

/// DELETE /venues/:venueId
pub async fn delete_venue_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(venue_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        delete_venue(&conn, venue_id).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({ "success": true, "deleted": venue_id })))
}
