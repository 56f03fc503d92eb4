//! Shared Error Types
//!
//! This module defines error types raised while validating the wire types in
//! `shared`. They are independent of the server so that clients decoding the
//! same frames get the same failures.
//!
//! # Error Categories
//!
//! - `SerializationError` - JSON serialization/deserialization failures
//! - `ValidationError` - A field is present but its value is not acceptable
//!
//! # Usage
//!
//! ```rust
//! use threadwatch::shared::error::SharedError;
//!
//! let error = SharedError::validation("itemId", "must not be empty");
//! assert!(error.to_string().contains("itemId"));
//! ```
use thiserror::Error;

/// Errors produced while decoding or validating shared types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
