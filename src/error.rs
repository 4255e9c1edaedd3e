use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::models::campaign::FieldErrors;
use crate::models::job::JobStatus;

/// API-boundary error taxonomy, mapped to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("campaign validation failed")]
    Validation(FieldErrors),

    #[error("Job not found")]
    JobNotFound,

    #[error("Job not completed yet (status: {0})")]
    NotReady(JobStatus),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Compliance check failed: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::JobNotFound | Self::ImageNotFound(_) => StatusCode::NOT_FOUND,
            Self::NotReady(_) => StatusCode::CONFLICT,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::Validation(errors) => json!({
                "detail": self.to_string(),
                "errors": errors,
            }),
            _ => json!({ "detail": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
