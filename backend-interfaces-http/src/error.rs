use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use backend_application::AppError;

#[derive(Debug)]
pub enum HttpError {
    Unauthorized,
    BadRequest(String),
    Conflict(String),
    NotFound,
    Internal(String),
}

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        match value {
            AppError::Unauthorized => HttpError::Unauthorized,
            AppError::Validation(msg) => HttpError::BadRequest(msg),
            AppError::Duplicate(id) => {
                HttpError::Conflict(format!("scan event '{}' already recorded", id))
            }
            AppError::AlreadyClaimed(entrant) => {
                HttpError::Conflict(format!("entrant '{}' already claimed an entry", entrant))
            }
            AppError::Storage(err) => HttpError::Internal(err.to_string()),
            AppError::Render(err) => HttpError::Internal(err.to_string()),
            AppError::Internal(err) => HttpError::Internal(err.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            HttpError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, format!("bad request: {}", msg)),
            HttpError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            HttpError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            HttpError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
