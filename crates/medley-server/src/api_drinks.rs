//! Drink API handlers.
//!
//! `GET /drinks` is public and returns the short recipe form; every
//! other route demands its own permission scope from the verified token.

use crate::error::{json_body, ApiError};
use crate::middleware::AuthContext;
use crate::MenuState;
use axum::{
    body::Bytes,
    extract::{Extension, Path},
    response::Json,
};
use medley_menu::{
    create_drink, delete_drink, get_drink, list_drinks, update_drink, Drink, DrinkUpdate,
    Ingredient, IngredientPart, NewDrink,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Scope required for the full-recipe listing.
pub const SCOPE_DRINKS_DETAIL: &str = "get:drinks-detail";
/// Scope required to create a drink.
pub const SCOPE_POST_DRINKS: &str = "post:drinks";
/// Scope required to update a drink.
pub const SCOPE_PATCH_DRINKS: &str = "patch:drinks";
/// Scope required to delete a drink.
pub const SCOPE_DELETE_DRINKS: &str = "delete:drinks";

#[derive(Deserialize)]
pub struct CreateDrinkRequest {
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// A drink in the public listing: recipe reduced to colors and parts.
#[derive(Serialize)]
pub struct ShortDrink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<IngredientPart>,
}

impl From<&Drink> for ShortDrink {
    fn from(drink: &Drink) -> Self {
        ShortDrink {
            id: drink.id,
            title: drink.title.clone(),
            recipe: drink.short(),
        }
    }
}

/// GET /drinks (public)
pub async fn get_drinks_handler(
    Extension(state): Extension<Arc<MenuState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.pool.clone();
    let drinks = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        list_drinks(&conn).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    let drinks: Vec<ShortDrink> = drinks.iter().map(ShortDrink::from).collect();
    Ok(Json(json!({ "success": true, "drinks": drinks })))
}

/// GET /drinks-detail
pub async fn get_drinks_detail_handler(
    Extension(state): Extension<Arc<MenuState>>,
    Extension(AuthContext(claims)): Extension<AuthContext>,
) -> Result<Json<serde_json::Value>, ApiError> {
    claims.require(SCOPE_DRINKS_DETAIL)?;

    let pool = state.pool.clone();
    let drinks = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        list_drinks(&conn).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({ "success": true, "drinks": drinks })))
}

/// POST /drinks
pub async fn create_drink_handler(
    Extension(state): Extension<Arc<MenuState>>,
    Extension(AuthContext(claims)): Extension<AuthContext>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    claims.require(SCOPE_POST_DRINKS)?;

    let payload: CreateDrinkRequest = json_body(&body)?;
    if payload.title.is_empty() {
        return Err(ApiError::Unprocessable("title must be non-empty".to_string()));
    }
    if payload.recipe.is_empty() {
        return Err(ApiError::Unprocessable("recipe must be non-empty".to_string()));
    }

    let new_drink = NewDrink {
        title: payload.title,
        recipe: payload.recipe,
    };

    let pool = state.pool.clone();
    let drink = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        let id = create_drink(&conn, &new_drink)?;
        get_drink(&conn, id).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({ "success": true, "drinks": [drink] })))
}

/// PATCH /drinks/:drinkId
pub async fn update_drink_handler(
    Extension(state): Extension<Arc<MenuState>>,
    Extension(AuthContext(claims)): Extension<AuthContext>,
    Path(drink_id): Path<i64>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    claims.require(SCOPE_PATCH_DRINKS)?;

    let updates: DrinkUpdate = json_body(&body)?;
    if let Some(title) = &updates.title {
        if title.is_empty() {
            return Err(ApiError::Unprocessable("title must be non-empty".to_string()));
        }
    }

    let pool = state.pool.clone();
    let drink = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        update_drink(&conn, drink_id, &updates)?;
        get_drink(&conn, drink_id).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({ "success": true, "drinks": [drink] })))
}

/// DELETE /drinks/:drinkId
pub async fn delete_drink_handler(
    Extension(state): Extension<Arc<MenuState>>,
    Extension(AuthContext(claims)): Extension<AuthContext>,
    Path(drink_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    claims.require(SCOPE_DELETE_DRINKS)?;

    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        delete_drink(&conn, drink_id).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({ "success": true, "delete": drink_id })))
}
