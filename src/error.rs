use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::repository::RepositoryError;
use crate::storage::StorageError;

pub type AppResult<T> = Result<T, AppError>;

/// Failures of the assignment coordinator. Handlers log these and reduce
/// them to an [`AppError`] with a generic message.
#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("metadata repository failure: {0}")]
    Repository(#[from] RepositoryError),
    #[error("bucket {bucket} unavailable: {source}")]
    BucketUnavailable {
        bucket: String,
        #[source]
        source: StorageError,
    },
    #[error("failed to list assignments: {0}")]
    ListFailed(#[source] Box<AssignmentError>),
    #[error("object {key} not found")]
    ObjectNotFound { key: String },
    #[error("failed to read object {key}: {source}")]
    ObjectReadError {
        key: String,
        #[source]
        source: StorageError,
    },
    #[error("object {key} does not hold valid JSON: {source}")]
    MalformedPayload {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write object {key}: {source}")]
    WriteFailed {
        key: String,
        #[source]
        source: StorageError,
    },
    #[error("assignment {id} not found")]
    AssignmentNotFound { id: String },
    #[error("invalid assignment id {id:?}: {reason}")]
    InvalidId { id: String, reason: &'static str },
}

impl AssignmentError {
    /// The underlying cause of a `ListFailed`, or `self` for every other kind.
    pub fn cause(&self) -> &AssignmentError {
        match self {
            AssignmentError::ListFailed(inner) => inner.cause(),
            other => other,
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
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

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Maps a coordinator failure onto the public surface: only a missing
    /// assignment on update and a malformed id are distinguished, everything
    /// else becomes a 500 carrying `fallback`.
    pub fn from_assignment(error: &AssignmentError, fallback: &str) -> Self {
        match error {
            AssignmentError::AssignmentNotFound { .. } => Self::not_found("Assignment not found"),
            AssignmentError::InvalidId { reason, .. } => {
                Self::bad_request(format!("Invalid assignment id: {reason}"))
            }
            _ => Self::internal(fallback),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = Json(ErrorResponse {
            message: self.message,
        });
        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}
