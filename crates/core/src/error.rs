//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every authorization, validation and lookup failure surfaces as one of these
/// variants. Callers match on the variant, never on the message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Token malformed, expired, badly signed, or bound to an unknown subject.
    ///
    /// The four causes are deliberately collapsed into one outcome.
    #[error("invalid or expired session token")]
    InvalidToken,

    /// Username/password pair rejected at login.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Authenticated, but not allowed to perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The targeted record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Required fields missing or malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A uniqueness rule was violated (username, email, one event per contract).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Unexpected failure (storage, IO, crypto). Reported to the exception hook.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error is an unexpected failure rather than a rejected request.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_internal_errors_are_unexpected() {
        assert!(DomainError::internal("disk full").is_internal());
        assert!(!DomainError::InvalidToken.is_internal());
        assert!(!DomainError::permission_denied("x").is_internal());
        assert!(!DomainError::not_found("x").is_internal());
        assert!(!DomainError::validation("x").is_internal());
    }

    #[test]
    fn invalid_token_message_does_not_reveal_cause() {
        assert_eq!(
            DomainError::InvalidToken.to_string(),
            "invalid or expired session token"
        );
    }
}
