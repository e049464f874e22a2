// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tradedesk_common::{ErrorBody, ErrorDetail};

use crate::auth::TokenError;
use crate::storage::StoreError;
use crate::validation::ValidationError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Weak password: {0}")]
    WeakPassword(String),

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid refresh token: {0}")]
    RefreshTokenInvalid(#[source] TokenError),

    #[error("Refresh token expired")]
    RefreshTokenExpired,

    #[error("User not found")]
    UserNotFound,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after_secs: u64 },

    #[error("Circuit open for {0}")]
    CircuitOpen(String),

    #[error("Upstream timed out for {0}")]
    UpstreamTimeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_)
            | AppError::InvalidEmail(_)
            | AppError::WeakPassword(_)
            | AppError::UserAlreadyExists
            | AppError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AppError::RefreshTokenInvalid(_)
            | AppError::RefreshTokenExpired
            | AppError::UserNotFound
            | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::CircuitOpen(_) | AppError::UpstreamTimeout(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "VAL_001",
            AppError::InvalidEmail(_) => "VAL_002",
            AppError::WeakPassword(_) => "VAL_003",
            AppError::UserAlreadyExists => "CONFLICT_001",
            AppError::Unauthorized(_) => "AUTH_001",
            AppError::InvalidCredentials => "AUTH_002",
            AppError::RefreshTokenInvalid(_) => "AUTH_003",
            AppError::RefreshTokenExpired => "AUTH_004",
            AppError::UserNotFound => "AUTH_005",
            AppError::NotFound(_) => "NF_001",
            AppError::RateLimitExceeded { .. } => "RATE_001",
            AppError::CircuitOpen(_) => "AVAIL_001",
            AppError::UpstreamTimeout(_) => "AVAIL_002",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Message shown to clients. Internal details never leave the server.
    pub fn client_message(&self) -> String {
        match self {
            AppError::InvalidCredentials => "Email or password is incorrect".to_string(),
            AppError::RefreshTokenInvalid(_) => "Refresh token is invalid".to_string(),
            AppError::RateLimitExceeded { .. } => {
                "Too many login attempts, please try again later".to_string()
            },
            AppError::CircuitOpen(_) | AppError::UpstreamTimeout(_) => {
                "Service temporarily unavailable, please try again later".to_string()
            },
            AppError::Internal(_) => "Something went wrong, please try again later".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let AppError::Internal(detail) = &self {
            tracing::error!(%detail, "request failed with internal error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.client_message(),
            },
        };

        let mut response = (status, axum::Json(body)).into_response();
        if let AppError::RateLimitExceeded { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidEmail(msg) => AppError::InvalidEmail(msg),
            ValidationError::WeakPassword(msg) => AppError::WeakPassword(msg),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => AppError::UserAlreadyExists,
            other => AppError::Internal(other.to_string()),
        }
    }
}
