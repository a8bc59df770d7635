// src/errors.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::raddb::RadDbError;
use crate::tracker_service::TrackerError;

pub type Result<T> = core::result::Result<T, ApiError>;

/// One failed input constraint.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub path: String,
    pub code: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    PreconditionFailed(String),

    #[error("Request body is too large")]
    PayloadTooLarge,

    #[error("Input validation failed")]
    ValidationFailed(Vec<Issue>),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine readable code used by the procedure surface.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::MethodNotAllowed => "METHOD_NOT_SUPPORTED",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::PreconditionFailed(_) => "PRECONDITION_FAILED",
            ApiError::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ApiError::ValidationFailed(_) => "BAD_REQUEST",
            ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Message safe to hand to a client. Internal causes are never exposed.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Internal(cause) => {
                error!("Internal error: {}", cause);
                "Internal Error".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Wrapped form used by `/api/trpc`.
    pub fn into_rpc_response(self) -> Response {
        let status = self.status();
        let mut body = json!({
            "code": self.code(),
            "message": self.public_message(),
            "httpStatus": status.as_u16(),
        });
        if let ApiError::ValidationFailed(issues) = &self {
            body["issues"] = json!(issues);
        }
        (status, Json(json!({ "error": body }))).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::ValidationFailed(issues) => (status, Json(issues)).into_response(),
            other => (status, Json(json!({ "error": other.public_message() }))).into_response(),
        }
    }
}

impl From<TrackerError> for ApiError {
    fn from(e: TrackerError) -> Self {
        match e {
            TrackerError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            TrackerError::AlreadyExists(what) => ApiError::Conflict(format!("{} already exists", what)),
            TrackerError::Forbidden(reason) => ApiError::Forbidden(reason),
            TrackerError::OrganizationRequired => {
                ApiError::PreconditionFailed("An active organization is required".to_string())
            }
            TrackerError::Db(e) => ApiError::Internal(e.to_string()),
            TrackerError::Serialization(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<RadDbError> for ApiError {
    fn from(e: RadDbError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidToken(_) => ApiError::Unauthorized,
            other => ApiError::Internal(other.to_string()),
        }
    }
}
