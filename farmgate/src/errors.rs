use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Authenticated but token-less: the password-reset flow must complete first
    #[error("Password reset required")]
    DegradedSession,

    /// The remote marketplace backend could not be reached
    #[error("Backend unavailable while attempting to {operation}")]
    BackendUnavailable { operation: String },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::DegradedSession => StatusCode::FORBIDDEN,
            Error::BackendUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::DegradedSession => "Password reset required before continuing".to_string(),
            Error::BackendUnavailable { .. } => "The marketplace is temporarily unavailable. Please try again.".to_string(),
            Error::BadRequest { message } => message.clone(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::BackendUnavailable { .. } => {
                tracing::warn!("Backend error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::DegradedSession => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let user_message = self.user_message();
        (status, user_message).into_response()
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::Unauthenticated { message: None }.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(Error::DegradedSession.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            Error::BackendUnavailable {
                operation: "login".to_string()
            }
            .status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            Error::BadRequest {
                message: "bad".to_string()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_user_messages_do_not_leak_internals() {
        let err = Error::Internal {
            operation: "connect to 10.0.0.3:5432".to_string(),
        };
        assert_eq!(err.user_message(), "Internal server error");

        // Backend failures surface as a generic retryable message
        let err = Error::BackendUnavailable {
            operation: "fetch session from http://backend:8080".to_string(),
        };
        assert!(!err.user_message().contains("backend:8080"));
    }
}
