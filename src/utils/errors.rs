//! Error handling for CampusFlow
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy. Every ledger and aggregate
//! error is translated into a status code and a user-facing message at the
//! HTTP boundary through [`IntoResponse`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::ModuleKind;

/// Main error type for CampusFlow application
#[derive(Error, Debug)]
pub enum CampusFlowError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid module configuration: {0}")]
    InvalidModuleConfig(String),

    #[error("Event not found")]
    EventNotFound { event_id: Uuid },

    #[error("Registration not found")]
    RegistrationNotFound { registration_id: Uuid },

    #[error("{module} is not enabled for this event")]
    ModuleNotEnabled { module: ModuleKind },

    #[error("You are already registered for this event")]
    AlreadyRegistered { event_id: Uuid, user_id: Uuid },

    #[error("Event registration is full")]
    CapacityExceeded { event_id: Uuid, limit: u32 },

    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Not authorized, no valid token")]
    Unauthenticated,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

/// Language model client errors
///
/// These never reach an HTTP caller: the chat bridge swaps in the local
/// responder whenever one of them occurs.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("request timed out")]
    Timeout,

    #[error("rate limited by provider")]
    RateLimited,

    #[error("provider rejected credentials")]
    Unauthorized,

    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias for CampusFlow operations
pub type Result<T> = std::result::Result<T, CampusFlowError>;

/// Result type alias for language model calls
pub type UpstreamResult<T> = std::result::Result<T, UpstreamError>;

impl CampusFlowError {
    /// HTTP status this error maps to at the request boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            CampusFlowError::Validation(_)
            | CampusFlowError::InvalidModuleConfig(_)
            | CampusFlowError::ModuleNotEnabled { .. }
            | CampusFlowError::AlreadyRegistered { .. }
            | CampusFlowError::CapacityExceeded { .. } => StatusCode::BAD_REQUEST,
            CampusFlowError::EventNotFound { .. }
            | CampusFlowError::RegistrationNotFound { .. } => StatusCode::NOT_FOUND,
            CampusFlowError::Unauthorized(_)
            | CampusFlowError::Unauthenticated
            | CampusFlowError::Jwt(_) => StatusCode::UNAUTHORIZED,
            CampusFlowError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            CampusFlowError::Validation(_) => "VALIDATION_ERROR",
            CampusFlowError::InvalidModuleConfig(_) => "INVALID_MODULE_CONFIG",
            CampusFlowError::ModuleNotEnabled { .. } => "MODULE_NOT_ENABLED",
            CampusFlowError::AlreadyRegistered { .. } => "CONFLICT",
            CampusFlowError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            CampusFlowError::EventNotFound { .. }
            | CampusFlowError::RegistrationNotFound { .. } => "NOT_FOUND",
            CampusFlowError::Unauthorized(_) => "UNAUTHORIZED",
            CampusFlowError::Unauthenticated | CampusFlowError::Jwt(_) => "UNAUTHENTICATED",
            CampusFlowError::RateLimitExceeded => "RATE_LIMITED",
            _ => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            CampusFlowError::Database(_) => false,
            CampusFlowError::Migration(_) => false,
            CampusFlowError::Redis(_) => true,
            CampusFlowError::Http(_) => true,
            CampusFlowError::Serialization(_) => false,
            CampusFlowError::Io(_) => true,
            CampusFlowError::UrlParse(_) => false,
            CampusFlowError::Jwt(_) => false,
            CampusFlowError::Config(_) => false,
            CampusFlowError::Validation(_) => false,
            CampusFlowError::InvalidModuleConfig(_) => false,
            CampusFlowError::EventNotFound { .. } => false,
            CampusFlowError::RegistrationNotFound { .. } => false,
            CampusFlowError::ModuleNotEnabled { .. } => false,
            CampusFlowError::AlreadyRegistered { .. } => false,
            CampusFlowError::CapacityExceeded { .. } => false,
            CampusFlowError::Unauthorized(_) => false,
            CampusFlowError::Unauthenticated => false,
            CampusFlowError::RateLimitExceeded => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CampusFlowError::Database(_) => ErrorSeverity::Critical,
            CampusFlowError::Migration(_) => ErrorSeverity::Critical,
            CampusFlowError::Config(_) => ErrorSeverity::Critical,
            CampusFlowError::Unauthorized(_) => ErrorSeverity::Warning,
            CampusFlowError::Unauthenticated => ErrorSeverity::Warning,
            CampusFlowError::Jwt(_) => ErrorSeverity::Warning,
            CampusFlowError::RateLimitExceeded => ErrorSeverity::Warning,
            CampusFlowError::Validation(_)
            | CampusFlowError::InvalidModuleConfig(_)
            | CampusFlowError::EventNotFound { .. }
            | CampusFlowError::RegistrationNotFound { .. }
            | CampusFlowError::ModuleNotEnabled { .. }
            | CampusFlowError::AlreadyRegistered { .. }
            | CampusFlowError::CapacityExceeded { .. } => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Message safe to show to an end user
    ///
    /// Infrastructure failures are collapsed into a generic sentence so that
    /// driver or connection details never leak.
    pub fn user_message(&self) -> String {
        if self.status_code().is_server_error() {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Error response body (JSON)
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
}

impl IntoResponse for CampusFlowError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self.severity() {
            ErrorSeverity::Critical | ErrorSeverity::Error => {
                tracing::error!(status = %status, error = %self, severity = %self.severity(), "Request failed");
            }
            ErrorSeverity::Warning => {
                tracing::warn!(status = %status, error = %self, "Request rejected");
            }
            ErrorSeverity::Info => {
                tracing::debug!(status = %status, error = %self, "Request rejected");
            }
        }

        let body = ErrorResponse {
            code: self.code(),
            message: self.user_message(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_errors_map_to_bad_request() {
        let event_id = Uuid::new_v4();
        let errors = [
            CampusFlowError::Validation("missing title".to_string()),
            CampusFlowError::ModuleNotEnabled { module: ModuleKind::Registration },
            CampusFlowError::AlreadyRegistered { event_id, user_id: Uuid::new_v4() },
            CampusFlowError::CapacityExceeded { event_id, limit: 1 },
        ];

        for error in errors {
            assert_eq!(error.status_code(), StatusCode::BAD_REQUEST, "{error}");
        }
    }

    #[test]
    fn test_user_facing_messages() {
        let error = CampusFlowError::ModuleNotEnabled { module: ModuleKind::Voting };
        assert_eq!(error.to_string(), "Voting is not enabled for this event");

        let error = CampusFlowError::CapacityExceeded { event_id: Uuid::new_v4(), limit: 3 };
        assert_eq!(error.user_message(), "Event registration is full");
    }

    #[test]
    fn test_internal_errors_are_hidden() {
        let error = CampusFlowError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.user_message(), "An internal error occurred");
        assert_eq!(error.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_authorization_errors() {
        assert_eq!(CampusFlowError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            CampusFlowError::Unauthorized("not the organizer".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert!(CampusFlowError::RateLimitExceeded.is_recoverable());
    }
}
