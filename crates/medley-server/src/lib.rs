//! Medley server library logic.
//!
//! Three independent backends live here, one router each: the venues
//! listing service, the trivia question API, and the drink menu API.
//! Each binary builds its own router over its own database pool; nothing
//! is shared across apps at runtime.

pub mod api_artists;
pub mod api_drinks;
pub mod api_questions;
pub mod api_quizzes;
pub mod api_shows;
pub mod api_venues;
pub mod boot;
pub mod config;
pub mod error;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use chrono::{SecondsFormat, Utc};
use medley_auth::Keyring;
use medley_db::DbPool;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state for the venues and trivia backends.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
}

/// Application state for the menu backend.
#[derive(Clone)]
pub struct MenuState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Trusted token signing keys.
    pub keyring: Keyring,
}

/// Maximum request body size (2 MiB). Protects against OOM from oversized payloads.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// The current wall-clock time as an RFC 3339 UTC string, the format
/// show times are stored in.
pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// CORS policy for the JSON APIs: any origin, the methods the route
/// tables use, and the two headers clients send.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Builds the venues application router.
pub fn venues_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/venues",
            get(api_venues::list_venues_handler).post(api_venues::create_venue_handler),
        )
        .route("/venues/search", post(api_venues::search_venues_handler))
        .route(
            "/venues/{venueId}",
            get(api_venues::get_venue_handler)
                .patch(api_venues::update_venue_handler)
                .delete(api_venues::delete_venue_handler),
        )
        .route(
            "/artists",
            get(api_artists::list_artists_handler).post(api_artists::create_artist_handler),
        )
        .route("/artists/search", post(api_artists::search_artists_handler))
        .route(
            "/artists/{artistId}",
            get(api_artists::get_artist_handler).patch(api_artists::update_artist_handler),
        )
        .route(
            "/shows",
            get(api_shows::list_shows_handler).post(api_shows::create_show_handler),
        )
        .fallback(error::not_found)
        .method_not_allowed_fallback(error::method_not_allowed)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}

/// Builds the trivia application router.
pub fn trivia_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/categories", get(api_questions::get_categories_handler))
        .route(
            "/categories/{categoryId}/questions",
            get(api_questions::questions_by_category_handler),
        )
        .route(
            "/questions",
            get(api_questions::list_questions_handler)
                .post(api_questions::create_question_handler),
        )
        .route(
            "/questions/search",
            post(api_questions::search_questions_handler),
        )
        .route(
            "/questions/{questionId}",
            delete(api_questions::delete_question_handler),
        )
        .route("/quizzes", post(api_quizzes::play_quiz_handler))
        .fallback(error::not_found)
        .method_not_allowed_fallback(error::method_not_allowed)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .layer(Extension(Arc::new(state)))
}

/// Builds the menu application router.
///
/// The public listing is open; every other drink route sits behind the
/// bearer-token middleware (which knows which paths it guards, since
/// `GET /drinks` and `POST /drinks` share a path but not a policy).
pub fn menu_app(state: MenuState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/drinks",
            get(api_drinks::get_drinks_handler).post(api_drinks::create_drink_handler),
        )
        .route("/drinks-detail", get(api_drinks::get_drinks_detail_handler))
        .route(
            "/drinks/{drinkId}",
            patch(api_drinks::update_drink_handler).delete(api_drinks::delete_drink_handler),
        )
        .fallback(error::not_found)
        .method_not_allowed_fallback(error::method_not_allowed)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(axum::middleware::from_fn(middleware::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .layer(Extension(Arc::new(state)))
}
