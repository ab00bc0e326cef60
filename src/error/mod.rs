//! Centralized API error handling
//!
//! This module provides a unified error type for API responses with proper
//! HTTP status code mapping and JSON error responses. Authentication failures
//! collapse to one generic message so callers cannot tell which check failed,
//! and internal errors never echo their cause.

use axum::{
    extract::rejection::JsonRejection,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Token has expired")]
    TokenExpired,

    #[error("{0}")]
    InvalidToken(&'static str),

    #[error("Too many requests")]
    TooManyRequests,

    /// The payload is logged, never sent to the client
    #[error("Internal server error")]
    InternalError(String),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::MalformedRequest(_) => "MALFORMED_REQUEST",
            ApiError::AuthenticationFailed => "AUTHENTICATION_FAILED",
            ApiError::TokenExpired => "TOKEN_EXPIRED",
            ApiError::InvalidToken(_) => "INVALID_TOKEN",
            ApiError::TooManyRequests => "TOO_MANY_REQUESTS",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::AuthenticationFailed
            | ApiError::TokenExpired
            | ApiError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        match &self {
            ApiError::InternalError(detail) => {
                tracing::error!(error = %detail, code = %error_code, "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %message, code = %error_code, "Client error occurred");
            }
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                message,
            },
        };

        match self {
            ApiError::TooManyRequests => {
                (status, [(header::RETRY_AFTER, "1")], Json(body)).into_response()
            }
            _ => (status, Json(body)).into_response(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MalformedRequest(reason) => ApiError::MalformedRequest(reason),
            AuthError::InvalidSignature(_) | AuthError::AccountNotFound => {
                ApiError::AuthenticationFailed
            }
            AuthError::TokenExpired => ApiError::TokenExpired,
            AuthError::InvalidToken(_) => ApiError::InvalidToken("Invalid token"),
            AuthError::InternalError(detail) => ApiError::InternalError(detail),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedRequest(rejection.body_text())
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;
