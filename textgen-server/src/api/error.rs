use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::types::ErrorResponse;
use crate::errors::ServiceError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Service(ServiceError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Service(ServiceError::ModelLoad(_))
            | ApiError::Service(ServiceError::Generation(_))
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert ApiError into HTTP response
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Service(ServiceError::Validation(e)) => {
                tracing::debug!(error = %e, "Rejected request");
            }
            ApiError::Service(ServiceError::ModelLoad(e)) => {
                tracing::error!(error = %e, "Model load error");
            }
            ApiError::Service(ServiceError::Generation(e)) => {
                tracing::error!(error = %e, "Generation error");
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
            }
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
