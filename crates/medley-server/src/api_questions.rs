//! Question and category API handlers.

use crate::error::{json_body, ApiError};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Extension, Path, Query},
    response::Json,
};
use medley_trivia::{
    create_question, delete_question, list_categories, list_questions, questions_by_category,
    search_questions, NewQuestion, TriviaError,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
}

#[derive(Deserialize)]
pub struct CreateQuestionRequest {
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: u8,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    #[serde(rename = "searchTerm")]
    pub search_term: String,
}

/// GET /categories
pub async fn get_categories_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.pool.clone();
    let categories = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        list_categories(&conn).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({ "success": true, "categories": categories })))
}

/// GET /questions?page=N
///
/// Ten questions per page; a page past the end is a 404.
pub async fn list_questions_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let page = params.page.unwrap_or(1).max(1);

    let pool = state.pool.clone();
    let (page_data, categories) = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        let page_data = list_questions(&conn, page)?;
        let categories = list_categories(&conn)?;
        Ok::<_, ApiError>((page_data, categories))
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    if page_data.questions.is_empty() {
        return Err(ApiError::NotFound("resource not found".to_string()));
    }

    Ok(Json(json!({
        "success": true,
        "questions": page_data.questions,
        "total_questions": page_data.total_questions,
        "categories": categories,
        "current_category": null,
    })))
}

/// POST /questions
pub async fn create_question_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let payload: CreateQuestionRequest = json_body(&body)?;

    if payload.question.is_empty() || payload.answer.is_empty() {
        return Err(ApiError::Unprocessable(
            "question and answer must be non-empty".to_string(),
        ));
    }
    if !(1..=5).contains(&payload.difficulty) {
        return Err(ApiError::Unprocessable(
            "difficulty must be between 1 and 5".to_string(),
        ));
    }

    let new_question = NewQuestion {
        question: payload.question,
        answer: payload.answer,
        category: payload.category,
        difficulty: payload.difficulty,
    };

    let pool = state.pool.clone();
    let (created, page_data) = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        let created = create_question(&conn, &new_question).map_err(|e| {
            // An unknown category trips FK enforcement -> 422.
            if let TriviaError::Database(rusqlite::Error::SqliteFailure(code, _)) = &e {
                if code.code == rusqlite::ffi::ErrorCode::ConstraintViolation {
                    return ApiError::Unprocessable(
                        "question references an unknown category".to_string(),
                    );
                }
            }
            ApiError::from(e)
        })?;
        let page_data = list_questions(&conn, 1)?;
        Ok::<_, ApiError>((created, page_data))
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({
        "success": true,
        "created": created,
        "questions": page_data.questions,
        "total_questions": page_data.total_questions,
    })))
}

/// DELETE /questions/:questionId
pub async fn delete_question_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(question_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.pool.clone();
    let page_data = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        delete_question(&conn, question_id)?;
        let page_data = list_questions(&conn, 1)?;
        Ok::<_, ApiError>(page_data)
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({
        "success": true,
        "deleted": question_id,
        "questions": page_data.questions,
        "total_questions": page_data.total_questions,
    })))
}

/// POST /questions/search
pub async fn search_questions_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<PageParams>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let payload: SearchRequest = json_body(&body)?;
    let page = params.page.unwrap_or(1).max(1);

    let pool = state.pool.clone();
    let page_data = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        search_questions(&conn, &payload.search_term, page).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({
        "success": true,
        "questions": page_data.questions,
        "total_questions": page_data.total_questions,
    })))
}

/// GET /categories/:categoryId/questions
pub async fn questions_by_category_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(category_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = state.pool.clone();
    let (category, questions, categories) = tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::internal(format!("db connection failed: {}", e)))?;
        let (category, questions) = questions_by_category(&conn, category_id)?;
        let categories = list_categories(&conn)?;
        Ok::<_, ApiError>((category, questions, categories))
    })
    .await
    .map_err(|e| ApiError::internal(format!("task join error: {}", e)))??;

    Ok(Json(json!({
        "success": true,
        "total_questions": questions.len(),
        "questions": questions,
        "categories": categories,
        "current_category": category,
    })))
}
