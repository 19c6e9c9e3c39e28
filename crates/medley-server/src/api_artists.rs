//! Artist API handlers.

use crate::api_venues::MAX_NAME_LEN;
use crate::error::{json_body, ApiError};
use crate::{now_rfc3339, AppState};
use axum::{
    body::Bytes,
    extract::{Extension, Path},
    response::Json,
};
use medley_venues::{
    artist_shows, create_artist, get_artist, list_artists, search_artists, update_artist, Artist,
    ArtistShow, ArtistUpdate, NewArtist,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct CreateArtistRequest {
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    pub search_term: String,
}

#[derive(Serialize)]
pub struct ArtistRef {
    pub id: i64,
    pub name: String,
}

/// An artist detail page: the record plus its shows split around now.
#[derive(Serialize)]
pub struct ArtistDetail {
    #[serde(flatten)]
    pub artist: Artist,
    pub past_shows: Vec<ArtistShow>,
    pub upcoming_shows: Vec<ArtistShow>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

/// GET /artists
pub async fn list_artists_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.pool.clone();
    let artists = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        list_artists(&conn).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    let artists: Vec<ArtistRef> = artists
        .into_iter()
        .map(|(id, name)| ArtistRef { id, name })
        .collect();

    Ok(Json(json!({ "success": true, "artists": artists })))
}

/// POST /artists
pub async fn create_artist_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let payload: CreateArtistRequest = json_body(&body)?;

    if payload.name.is_empty() || payload.name.len() > MAX_NAME_LEN {
        return Err(ApiError::BadRequest("artist name must be 1-256 bytes".to_string()));
    }

    let new_artist = NewArtist {
        name: payload.name,
        genres: payload.genres,
        city: payload.city,
        state: payload.state,
        phone: payload.phone,
        image_link: payload.image_link,
        facebook_link: payload.facebook_link,
        website: payload.website,
        seeking_venue: payload.seeking_venue,
        seeking_description: payload.seeking_description,
    };

    let pool = state.pool.clone();
    let created = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        create_artist(&conn, &new_artist).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({ "success": true, "created": created })))
}

/// POST /artists/search
pub async fn search_artists_handler(
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
        search_artists(&conn, &payload.search_term, &now).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({
        "success": true,
        "count": data.len(),
        "data": data,
    })))
}

/// GET /artists/:artistId
pub async fn get_artist_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(artist_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.pool.clone();
    let now = now_rfc3339();
    let detail = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        let artist = get_artist(&conn, artist_id)?;
        let shows = artist_shows(&conn, artist_id, &now)?;
        Ok::<_, ApiError>(ArtistDetail {
            artist,
            past_shows_count: shows.past.len(),
            upcoming_shows_count: shows.upcoming.len(),
            past_shows: shows.past,
            upcoming_shows: shows.upcoming,
        })
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({ "success": true, "artist": detail })))
}

/// PATCH /artists/:artistId
pub async fn update_artist_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(artist_id): Path<i64>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updates: ArtistUpdate = json_body(&body)?;

    if let Some(name) = &updates.name {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(ApiError::BadRequest("artist name must be 1-256 bytes".to_string()));
        }
    }

    let pool = state.pool.clone();
    let artist = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        update_artist(&conn, artist_id, &updates)?;
        get_artist(&conn, artist_id).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({ "success": true, "artist": artist })))
}
