use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    Json,
};

use crate::error::{AppError, Result};

/// Unwraps a JSON body, reporting any rejection as a 400
pub fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Rejected request body");
            Err(AppError::Validation(
                "Invalid JSON in request body".to_string(),
            ))
        }
    }
}

/// Unwraps path parameters, reporting malformed ids as a 400
pub fn path_params<T>(params: std::result::Result<Path<T>, PathRejection>) -> Result<T> {
    params
        .map(|Path(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// A required, non-blank string field
pub fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
