//! Error types for the HTTP API.
//!
//! Every error is rendered as the standard envelope with `success: false`:
//!
//! ```json
//! {"success": false, "message": "...", "errors": {"field": ["..."]}}
//! ```

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::error;

/// Field name to validation messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// API error type.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or unknown bearer token.
    #[error("Unauthenticated.")]
    Unauthenticated,

    /// The authenticated user may not perform the action.
    #[error("{0}")]
    Forbidden(String),

    /// A resource named in the path does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request was understood but violates a rule.
    #[error("{message}")]
    Validation {
        /// Summary message
        message: String,
        /// Per-field messages, if the failure is tied to request fields
        errors: Option<FieldErrors>,
    },

    /// Anything the client cannot fix. Details are logged, never returned.
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// A validation error without field details.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            errors: None,
        }
    }

    /// A validation error attributed to one request field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.clone()]);
        Self::Validation {
            message,
            errors: Some(errors),
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        let errors = match self {
            Self::Validation { errors, .. } => errors,
            _ => None,
        };

        let body = ErrorBody {
            success: false,
            message,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<taskboard::Error> for ApiError {
    fn from(err: taskboard::Error) -> Self {
        use taskboard::Error;

        match err {
            Error::TaskNotFound(_) => Self::NotFound("Task not found.".to_string()),
            Error::UserNotFound(_) => Self::NotFound("User not found.".to_string()),
            Error::DependencyNotFound { .. } | Error::DependencyIdNotFound { .. } => {
                Self::NotFound("Dependency not found.".to_string())
            }
            Error::Forbidden(message) => Self::Forbidden(message),
            Error::SelfDependency(_) => Self::field("depends_on_task_id", err.to_string()),
            Error::DuplicateDependency { .. }
            | Error::CircularDependency { .. }
            | Error::DependentsExist { .. }
            | Error::IncompleteDependencies { .. }
            | Error::InvalidStatusTransition { .. }
            | Error::Validation(_) => Self::validation(err.to_string()),
            Error::Io(_) | Error::Json(_) | Error::Storage(_) | Error::Config(_) => {
                error!(error = %err, "Store failure");
                Self::Internal
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        // Non-numeric ids can never name an existing resource
        Self::NotFound("Resource not found.".to_string())
    }
}
