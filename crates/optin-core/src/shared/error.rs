//! Core Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("a subscription for this email already exists")]
    AlreadyExists,

    #[error("user unknown or locked")]
    UserUnknownOrLocked,

    #[error("false token")]
    FalseToken,

    #[error("stale subscription version for {email}")]
    Conflict { email: String },

    #[error("notification send failed: {0}")]
    Send(#[from] crate::notify::NotifyError),

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),

    #[error("deserialization error: {0}")]
    Deserialization(#[from] bson::de::Error),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Error response body
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            CoreError::AlreadyExists => (StatusCode::CONFLICT, "ALREADY_EXISTS"),
            CoreError::UserUnknownOrLocked => (StatusCode::NOT_FOUND, "USER_UNKNOWN_OR_LOCKED"),
            CoreError::FalseToken => (StatusCode::BAD_REQUEST, "FALSE_TOKEN"),
            CoreError::Conflict { .. } => (StatusCode::CONFLICT, "STALE_VERSION"),
            CoreError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
