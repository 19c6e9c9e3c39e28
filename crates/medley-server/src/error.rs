//! API error type and the fixed JSON error envelope.
//!
//! Every failure leaves the service as
//! `{"success": false, "error": <status>, "message": <text>}`. Domain
//! errors convert into the matching HTTP status; database and join
//! failures are logged and collapse to 500 without leaking detail.

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("unprocessable: {0}")]
    Unprocessable(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Shorthand for the common join-error / pool-error mapping.
    pub fn internal(context: impl std::fmt::Display) -> Self {
        ApiError::Internal(context.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Internal details stay in the log, not on the wire.
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "internal server error".to_string()
            }
            ApiError::MethodNotAllowed => "method not allowed".to_string(),
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Unprocessable(msg) => msg.clone(),
        };

        let body = Json(serde_json::json!({
            "success": false,
            "error": status.as_u16(),
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<medley_venues::ListingError> for ApiError {
    fn from(e: medley_venues::ListingError) -> Self {
        use medley_venues::ListingError;
        match e {
            ListingError::VenueNotFound(_) | ListingError::ArtistNotFound(_) => {
                ApiError::NotFound(e.to_string())
            }
            ListingError::Database(_) | ListingError::Json(_) => ApiError::internal(e),
        }
    }
}

impl From<medley_trivia::TriviaError> for ApiError {
    fn from(e: medley_trivia::TriviaError) -> Self {
        use medley_trivia::TriviaError;
        match e {
            TriviaError::QuestionNotFound(_) | TriviaError::CategoryNotFound(_) => {
                ApiError::NotFound(e.to_string())
            }
            TriviaError::Database(_) => ApiError::internal(e),
        }
    }
}

impl From<medley_menu::MenuError> for ApiError {
    fn from(e: medley_menu::MenuError) -> Self {
        use medley_menu::MenuError;
        match e {
            MenuError::NotFound(_) => ApiError::NotFound(e.to_string()),
            MenuError::DuplicateTitle(_) => ApiError::Unprocessable(e.to_string()),
            MenuError::Database(_) | MenuError::Json(_) => ApiError::internal(e),
        }
    }
}

impl From<medley_auth::AuthError> for ApiError {
    fn from(e: medley_auth::AuthError) -> Self {
        match e {
            medley_auth::AuthError::MissingPermission(_) => ApiError::Forbidden(e.to_string()),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

/// Parses a JSON request body.
///
/// A body that is not JSON at all is a 400; JSON of the wrong shape is
/// a 422, matching the fixed error-handler statuses.
pub fn json_body<T: DeserializeOwned>(bytes: &Bytes) -> Result<T, ApiError> {
    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|_| ApiError::BadRequest("request body is not valid JSON".to_string()))?;
    serde_json::from_value(value)
        .map_err(|e| ApiError::Unprocessable(format!("unprocessable request body: {}", e)))
}

/// Fallback for unknown paths.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("resource not found".to_string())
}

/// Fallback for known paths hit with the wrong method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn envelope_shape_is_fixed() {
        let response = ApiError::NotFound("resource not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], 404);
        assert_eq!(json["message"], "resource not found");
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_detail() {
        let response = ApiError::internal("db connection failed: secret path").into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], 500);
        assert_eq!(json["message"], "internal server error");
    }

    #[test]
    fn json_body_distinguishes_400_from_422() {
        #[derive(serde::Deserialize)]
        struct Shape {
            #[allow(dead_code)]
            name: String,
        }

        let not_json = Bytes::from_static(b"not json at all");
        assert!(matches!(
            json_body::<Shape>(&not_json),
            Err(ApiError::BadRequest(_))
        ));

        let wrong_shape = Bytes::from_static(b"{\"other\": 1}");
        assert!(matches!(
            json_body::<Shape>(&wrong_shape),
            Err(ApiError::Unprocessable(_))
        ));

        let ok = Bytes::from_static(b"{\"name\": \"x\"}");
        assert!(json_body::<Shape>(&ok).is_ok());
    }
}
