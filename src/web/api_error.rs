// JSON error responses for the HTTP API.
//
// Every failure leaves the API as `{ "error": "<message>" }`. Server-side
// failures get a generic message; the details only go to the log.

use crate::core::moderation::{ModerationError, ValidationError};
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<ModerationError> for ApiError {
    fn from(err: ModerationError) -> Self {
        match err {
            ModerationError::Validation(e) => e.into(),
            ModerationError::InvalidToken => {
                ApiError::new(StatusCode::UNAUTHORIZED, "Invalid token")
            }
            ModerationError::InvalidMasterKey => {
                ApiError::new(StatusCode::FORBIDDEN, "Invalid master key")
            }
            ModerationError::NotFound(msg) => ApiError::not_found(msg),
            ModerationError::Conflict(msg) => ApiError::new(StatusCode::CONFLICT, msg),
            ModerationError::Upstream(msg) => {
                tracing::error!(error = %msg, "Upstream service failed");
                ApiError::new(StatusCode::BAD_GATEWAY, "Upstream service failed")
            }
            ModerationError::Storage(msg) => {
                tracing::error!(error = %msg, "Storage failure");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::bad_request("Photo must be 5 MB or smaller")
        } else {
            tracing::debug!(error = %err, "Malformed multipart submission");
            ApiError::bad_request("Malformed form data")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
