//! HTTP error responses.
//!
//! Every error body is `{"error": "<message>"}`; 422 bodies also carry the
//! offending field as `location`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

/// Body of a 404.
pub const NOT_FOUND_MESSAGE: &str = "Not Found";

/// Body of a 401.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Handler-boundary error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{message}")]
    Unprocessable { location: String, message: String },
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    /// Detail is logged, never returned.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found() -> Self {
        ApiError::NotFound(NOT_FOUND_MESSAGE.to_string())
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string())
    }
}

impl From<noteful_core::Error> for ApiError {
    fn from(err: noteful_core::Error) -> Self {
        use noteful_core::Error;

        match err {
            Error::Validation(msg) => ApiError::BadRequest(msg),
            Error::InvalidFolder(_) | Error::InvalidTag(_) => ApiError::BadRequest(err.to_string()),
            Error::Conflict(msg) => ApiError::BadRequest(msg),
            Error::Unprocessable { field, message } => ApiError::Unprocessable {
                location: field,
                message,
            },
            Error::NotFound(_) => ApiError::not_found(),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Database(_)
            | Error::Crypto(_)
            | Error::Serialization(_)
            | Error::Internal(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": msg }),
            ),
            ApiError::Unprocessable { location, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!({ "error": message, "location": location }),
            ),
            ApiError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "error": msg }),
            ),
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": msg }),
            ),
            ApiError::Internal(detail) => {
                error!(subsystem = "api", error = %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "Internal Server Error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
