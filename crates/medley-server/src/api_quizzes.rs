//! Quiz API handler.

use crate::error::{json_body, ApiError};
use crate::AppState;
use axum::{body::Bytes, extract::Extension, response::Json};
use medley_trivia::next_quiz_question;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct QuizRequest {
    #[serde(default)]
    pub previous_questions: Vec<i64>,
    pub quiz_category: Option<QuizCategory>,
}

/// The category the client is quizzing on. `id` 0 means all categories;
/// `type` is display-only and ignored here.
#[derive(Deserialize)]
pub struct QuizCategory {
    pub id: Option<i64>,
    #[serde(rename = "type")]
    #[allow(dead_code)]
    pub kind: Option<String>,
}

/// POST /quizzes
///
/// Draws one random question from the category, excluding those already
/// played. `question` is null once the pool is exhausted.
pub async fn play_quiz_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let payload: QuizRequest = json_body(&body)?;

    let category_id = payload
        .quiz_category
        .and_then(|c| c.id)
        .ok_or_else(|| ApiError::Unprocessable("quiz_category.id is required".to_string()))?;
    let previous = payload.previous_questions;

    let pool = state.pool.clone();
    let question = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        next_quiz_question(&conn, category_id, &previous).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({ "success": true, "question": question })))
}
