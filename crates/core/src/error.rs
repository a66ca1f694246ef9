//! Core Error Types
//!
//! Defines the foundational error types used across the Paper Desk workspace.
//! These error types are dependency-free (only thiserror + std) to keep the core
//! crate lightweight.
//!
//! The application crate wraps these in `AppError` alongside model and
//! configuration failures.

use thiserror::Error;

/// Core error type for the Paper Desk workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A tool with the same name is already registered
    #[error("Duplicate tool: {0} is already registered")]
    DuplicateTool(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a duplicate tool error
    pub fn duplicate_tool(name: impl Into<String>) -> Self {
        Self::DuplicateTool(name.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Convert CoreError to a string
impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}
