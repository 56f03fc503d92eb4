/**
 * Backend Error Types
 *
 * This module defines the error taxonomy shared by the dispatchers, the
 * stores and the HTTP handlers.
 *
 * # Error Categories
 *
 * - `DecodingError` - Malformed input (frame, envelope payload, status string)
 * - `AuthenticationError` - Capability token invalid, expired or unverifiable
 * - `ForbiddenError` - Valid capability used outside its scope
 * - `RouteNotFound` - No handler registered for an action
 * - `StorageError` - Backend failure or timeout
 *
 * Store reads and deletes never fail on a missing record; absence is a normal
 * outcome and is reported through the return value instead.
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::SharedError;

/// Backend-specific error types
///
/// Each variant maps to one HTTP status code, used both for HTTP responses
/// and for the `status` field of live-channel error replies.
///
/// # Usage
///
/// ```rust
/// use threadwatch::backend::error::BackendError;
///
/// let err = BackendError::forbidden("capability is scoped to another thread");
/// assert_eq!(err.status_code().as_u16(), 403);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Input could not be decoded into the expected type
    #[error("Decoding error: {message}")]
    DecodingError {
        /// Human-readable error message
        message: String,
    },

    /// Capability token missing, malformed, expired or with a bad signature
    #[error("Authentication error: {message}")]
    AuthenticationError {
        /// Human-readable error message
        message: String,
    },

    /// Capability is valid but does not cover the requested thread or right
    #[error("Forbidden: {message}")]
    ForbiddenError {
        /// Human-readable error message
        message: String,
    },

    /// No handler is registered under the requested action name
    #[error("No route for action '{action}'")]
    RouteNotFound {
        /// The action name exactly as received
        action: String,
    },

    /// Storage backend failure or timeout
    #[error("Storage error: {message}")]
    StorageError {
        /// Human-readable error message
        message: String,
    },

    /// A handler failed in a way that is not one of the categories above
    #[error("Internal error: {message}")]
    InternalError {
        /// Human-readable error message
        message: String,
    },

    /// A required piece of configuration is missing at startup
    #[error("Not configured: {message}")]
    NotConfigured {
        /// Human-readable error message
        message: String,
    },
}

impl BackendError {
    /// Create a new decoding error
    pub fn decoding(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    /// Create a new authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::AuthenticationError {
            message: message.into(),
        }
    }

    /// Create a new forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::ForbiddenError {
            message: message.into(),
        }
    }

    /// Create a new route-not-found error
    pub fn route_not_found(action: impl Into<String>) -> Self {
        Self::RouteNotFound {
            action: action.into(),
        }
    }

    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError {
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::NotConfigured {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `DecodingError` - 400 Bad Request
    /// - `AuthenticationError` - 401 Unauthorized
    /// - `ForbiddenError` - 403 Forbidden
    /// - `RouteNotFound` - 404 Not Found
    /// - `StorageError` - 500 Internal Server Error
    /// - `InternalError` - 500 Internal Server Error
    /// - `NotConfigured` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DecodingError { .. } => StatusCode::BAD_REQUEST,
            Self::AuthenticationError { .. } => StatusCode::UNAUTHORIZED,
            Self::ForbiddenError { .. } => StatusCode::FORBIDDEN,
            Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::StorageError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotConfigured { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<SharedError> for BackendError {
    fn from(err: SharedError) -> Self {
        Self::decoding(err.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::decoding(err.to_string())
    }
}

impl From<sqlx::Error> for BackendError {
    fn from(err: sqlx::Error) -> Self {
        Self::storage(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for BackendError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::storage(format!("migration failed: {}", err))
    }
}

impl From<tokio::time::error::Elapsed> for BackendError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::storage("storage operation timed out")
    }
}

impl From<jsonwebtoken::errors::Error> for BackendError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::authentication(err.to_string())
    }
}

/// Result alias used throughout the backend
pub type BackendResult<T> = Result<T, BackendError>;
