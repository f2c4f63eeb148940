use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::attendance::AttendanceError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Minting error: {0}")]
    Minting(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Minting(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_message = match self {
            AppError::Database(ref e) => {
                tracing::error!(error = %e, "Database error");
                "Database error".to_string()
            }
            AppError::Validation(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Minting(msg) => msg,
        };

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

impl From<AttendanceError> for AppError {
    fn from(err: AttendanceError) -> Self {
        match err {
            AttendanceError::Database(e) => AppError::Database(e),
            AttendanceError::RegistrationNotFound | AttendanceError::AttendanceNotFound => {
                AppError::NotFound(err.to_string())
            }
            AttendanceError::RegistrationEventMismatch
            | AttendanceError::AttendanceEventMismatch
            | AttendanceError::UserMismatch => AppError::Validation(err.to_string()),
            AttendanceError::NotEventCreator(_) => AppError::Forbidden(err.to_string()),
            AttendanceError::AlreadyConfirmed | AttendanceError::AlreadyMinted => {
                AppError::Conflict(err.to_string())
            }
            AttendanceError::Minting(_) => AppError::Minting(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
