//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use medshare_core::error::{AppError, ErrorCode, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Broad error category.
    pub error: String,
    /// Machine-readable sharing reason, when one applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
}

/// An [`AppError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// Status code and response body for this error.
    pub fn parts(&self) -> (StatusCode, ApiErrorResponse) {
        let err = &self.0;

        // A failed ownership check must not reveal that the patient exists.
        if err.is(ErrorCode::NotOwner) {
            return (
                StatusCode::NOT_FOUND,
                ApiErrorResponse {
                    error: ErrorKind::NotFound.to_string(),
                    code: Some(ErrorCode::PatientNotFound.as_str().to_string()),
                    message: "Patient not found".to_string(),
                },
            );
        }

        let status = match err.kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Validation | ErrorKind::InvalidState | ErrorKind::Expired => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Database
            | ErrorKind::Configuration
            | ErrorKind::Serialization
            | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if err.kind.is_fatal() {
            "An internal error occurred".to_string()
        } else {
            err.message.clone()
        };

        (
            status,
            ApiErrorResponse {
                error: err.kind.to_string(),
                code: err.code.map(|c| c.as_str().to_string()),
                message,
            },
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.kind.is_fatal() {
            tracing::error!(
                kind = %self.0.kind,
                error = %self.0.message,
                source = ?self.0.source,
                "Internal server error"
            );
        }

        let (status, body) = self.parts();
        (status, Json(body)).into_response()
    }
}
