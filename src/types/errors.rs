//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation. Display
//! strings double as the tool-facing messages surfaced to the calling agent,
//! so they stay stable and minimal: parameter names and expectations, never
//! stack traces or internal type names.

use crate::schema::ValidationReport;
use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the toolcast core.
#[derive(Error, Debug)]
pub enum Error {
    /// Registration failed (duplicate name, unsupported signature).
    /// Fatal to that registration, not to the registry.
    #[error("registration error: {0}")]
    Registration(String),

    /// No tool registered under the requested name.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// One or more parameters failed schema validation.
    #[error("invalid arguments: {0}")]
    Validation(ValidationReport),

    /// The tool's own callable failed.
    #[error("tool execution failed: {0}")]
    Execution(String),

    /// The per-call timer elapsed before the callable resolved.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The external cancellation signal fired. Propagated to the caller,
    /// never converted into a ToolResult.
    #[error("call cancelled: {0}")]
    Cancelled(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Convenience constructors
impl Error {
    pub fn registration(msg: impl Into<String>) -> Self {
        Self::Registration(msg.into())
    }

    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }
}

impl Error {
    /// Whether this error represents the caller's own abort.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }
}
