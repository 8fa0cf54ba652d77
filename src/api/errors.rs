use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::request_workflow::{ErrorKind, WorkflowError};

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    code: &'static str,
    message: String,
}

/// Error returned by handlers; each variant carries a stable code and a message.
#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str, String),
    BadRequest(&'static str, String),
    NotFound(&'static str, String),
    Conflict(&'static str, String),
    TooManyRequests(&'static str),
    Internal(&'static str, String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal("INTERNAL_ERROR", context.to_string())
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::BadRequest("VALIDATION_ERROR", message.into())
    }

    pub(crate) fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden("NO_PERMISSION", message.into())
    }

    fn parts(self) -> (StatusCode, &'static str, String) {
        match self {
            Self::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message.to_string())
            }
            Self::Forbidden(code, message) => (StatusCode::FORBIDDEN, code, message),
            Self::BadRequest(code, message) => (StatusCode::BAD_REQUEST, code, message),
            Self::NotFound(code, message) => (StatusCode::NOT_FOUND, code, message),
            Self::Conflict(code, message) => (StatusCode::CONFLICT, code, message),
            Self::TooManyRequests(message) => {
                (StatusCode::TOO_MANY_REQUESTS, "TOO_MANY_REQUESTS", message.to_string())
            }
            Self::Internal(code, message) => (StatusCode::INTERNAL_SERVER_ERROR, code, message),
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        let code = err.code();
        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(code, err.to_string()),
            ErrorKind::Validation | ErrorKind::State => Self::BadRequest(code, err.to_string()),
            ErrorKind::Conflict => Self::Conflict(code, err.to_string()),
            ErrorKind::Forbidden => Self::Forbidden(code, err.to_string()),
            ErrorKind::Internal => {
                tracing::error!(error = ?err, code, "Request workflow failed");
                let message = match err {
                    WorkflowError::Store(_) => "Internal server error".to_string(),
                    other => other.to_string(),
                };
                Self::Internal(code, message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let unauthorized = matches!(self, Self::Unauthorized(_));
        let (status, code, message) = self.parts();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(code, error = %message, "Internal server error");
        }

        let mut response =
            (status, Json(ErrorResponse { success: false, code, message })).into_response();
        if unauthorized {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
