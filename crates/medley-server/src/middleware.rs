//! Bearer-token authentication middleware for the menu backend.

use crate::error::ApiError;
use crate::MenuState;
use axum::{
    body::Body,
    http::{header, Method, Request},
    middleware::Next,
    response::Response,
};
use medley_auth::Claims;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wrapper for verified [`Claims`] stored in request extensions.
#[derive(Clone, Debug)]
pub struct AuthContext(pub Claims);

/// Whether a route sits behind bearer authentication.
///
/// The public listing (`GET /drinks`) and everything outside the drink
/// routes pass through; unknown paths still reach the 404 fallback
/// unauthenticated, the way an unrouted request never hits a guard.
fn requires_auth(method: &Method, path: &str) -> bool {
    if method == Method::OPTIONS {
        return false;
    }
    match path {
        "/drinks" => method != Method::GET,
        "/drinks-detail" => true,
        p => p.starts_with("/drinks/"),
    }
}

/// Middleware authenticating requests via `Authorization: Bearer`.
///
/// Verifies the token against the keyring and stores the claims in the
/// request extensions for handlers to enforce their scope. Any defect in
/// the token itself is a 401; scope enforcement (403) happens per
/// handler.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    if !requires_auth(req.method(), req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let state = req
        .extensions()
        .get::<Arc<MenuState>>()
        .ok_or_else(|| ApiError::internal("menu state missing from request extensions"))?
        .clone();

    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let token = medley_auth::bearer_token(header_value)?;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let claims = state.keyring.verify(token, now)?;

    req.extensions_mut().insert(AuthContext(claims));

    Ok(next.run(req).await)
}
