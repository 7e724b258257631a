use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kairos_availability::{HoldError, HoldRejection};
use kairos_core::EngineError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, format!("{msg} not found")),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => AppError::ValidationError(msg),
            EngineError::NotFound(entity) => AppError::NotFoundError(entity),
            EngineError::Conflict(msg) => AppError::ConflictError(msg),
            EngineError::Inconsistency(msg) | EngineError::Internal(msg) => {
                AppError::InternalServerError(msg)
            }
        }
    }
}

impl From<HoldError> for AppError {
    fn from(err: HoldError) -> Self {
        match err {
            HoldError::Rejected(HoldRejection::OutsideSchedule) => {
                AppError::ValidationError(HoldRejection::OutsideSchedule.to_string())
            }
            HoldError::Rejected(reason) => AppError::ConflictError(reason.to_string()),
            HoldError::Engine(e) => e.into(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
