//! Centralized error types for mailcompose.

use thiserror::Error;

/// All errors produced by the mailcompose library.
#[derive(Error, Debug)]
pub enum ComposeError {
    /// A required field is empty or invalid; the send is aborted without
    /// touching session state.
    #[error("Validation failed: {field} {reason}")]
    Validation { field: String, reason: String },

    /// A backend/network failure while loading templates or sending.
    /// Recoverable: session state is preserved so the user can retry.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed clipboard data or unparsable HTML. Recovered internally
    /// (empty result substituted); surfaced only through logs.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The requested template does not exist in the store.
    #[error("Template not found: {0}")]
    TemplateNotFound(i64),

    /// A send is already in flight; re-invocation is refused until it
    /// resolves.
    #[error("A send operation is already in progress")]
    SendInProgress,
}

/// Convenience alias for `Result<T, ComposeError>`.
pub type Result<T> = std::result::Result<T, ComposeError>;

impl ComposeError {
    /// Create a `Validation` variant for a named field.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
