//! Password hashing (bcrypt, fixed cost, fresh salt per hash).

use epicevents_core::{DomainError, DomainResult};

/// Hash a plaintext password. A new salt is generated on every call.
pub fn hash_password(password: &str, cost: u32) -> DomainResult<String> {
    bcrypt::hash(password, cost)
        .map_err(|e| DomainError::internal(format!("failed to hash password: {e}")))
}

/// Verify a plaintext password against a stored bcrypt hash.
///
/// Returns `Ok(false)` on mismatch and `Err` only when the stored hash is
/// malformed.
pub fn verify_password(password: &str, hash: &str) -> DomainResult<bool> {
    bcrypt::verify(password, hash)
        .map_err(|e| DomainError::internal(format!("invalid password hash: {e}")))
}
