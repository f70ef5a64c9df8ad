//! Custom error types for ControlClose
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for ControlClose operations
#[derive(Error, Debug)]
pub enum CloseError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models and form input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Receipt blob storage errors
    #[error("Receipt storage error: {0}")]
    Blob(String),

    /// Close submission failed as a whole
    #[error("Submission failed: {0}")]
    Submission(String),

    /// The active session may not perform the operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Notification delivery errors
    #[error("Notification error: {0}")]
    Notification(String),
}

impl CloseError {
    /// Create a "not found" error for stores
    pub fn store_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Store",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for payment methods
    pub fn payment_method_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Payment method",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for cash closes
    pub fn close_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Cash close",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for user profiles
    pub fn profile_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Profile",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<std::io::Error> for CloseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CloseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for ControlClose operations
pub type CloseResult<T> = Result<T, CloseError>;
