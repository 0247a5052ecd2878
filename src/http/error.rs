//! Mapping of service failures onto HTTP responses.

use super::dto::{ErrorResponse, ValidationErrorResponse};
use crate::task::{
    domain::{FieldErrors, UniqueField},
    services::TaskServiceError,
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Message returned for unknown or malformed task identifiers.
pub const NOT_FOUND_MESSAGE: &str = "Tarefa nao encontrada.";
/// Message returned for move requests without a valid direction.
pub const INVALID_DIRECTION_MESSAGE: &str = "Direction deve ser 'up' ou 'down'.";
/// Message returned for any unexpected failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Erro interno do servidor.";

/// Error returned by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The payload failed field validation.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// The task does not exist or its identifier is malformed.
    #[error("{}", NOT_FOUND_MESSAGE)]
    NotFound,

    /// A unique field collided with another task.
    #[error("{0}")]
    Conflict(UniqueField),

    /// The move direction is missing or unknown.
    #[error("{}", INVALID_DIRECTION_MESSAGE)]
    InvalidDirection,

    /// Any other failure; details are logged, never returned.
    #[error("internal error: {0}")]
    Internal(#[source] TaskServiceError),
}

impl ApiError {
    /// Returns the HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidDirection => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TaskServiceError> for ApiError {
    fn from(err: TaskServiceError) -> Self {
        match err {
            TaskServiceError::Validation(errors) => Self::Validation(errors),
            TaskServiceError::InvalidDirection(_) => Self::InvalidDirection,
            TaskServiceError::NotFound(_) => Self::NotFound,
            TaskServiceError::Conflict(field) => Self::Conflict(field),
            TaskServiceError::Repository(_) => Self::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            Self::Validation(errors) => {
                return (status, Json(ValidationErrorResponse { errors })).into_response();
            }
            Self::NotFound => NOT_FOUND_MESSAGE,
            Self::Conflict(field) => field.message(),
            Self::InvalidDirection => INVALID_DIRECTION_MESSAGE,
            Self::Internal(source) => {
                error!(error = %source, "request failed");
                INTERNAL_ERROR_MESSAGE
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
