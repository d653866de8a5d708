//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// relationship integrity, conflicts, authorization). Infrastructure concerns
/// belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A field failed validation (e.g. malformed or out-of-range input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A foreign reference points at a record that does not exist.
    #[error("relationship violated: {0}")]
    Relationship(String),

    /// A uniqueness or business-rule constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The target of the operation does not exist.
    #[error("not found")]
    NotFound,

    /// The actor is authenticated but lacks the privilege for this operation.
    #[error("unauthorized")]
    Unauthorized,

    /// Credential verification failed (email unknown or password mismatch).
    #[error("invalid credentials")]
    Authentication,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn relationship(msg: impl Into<String>) -> Self {
        Self::Relationship(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
