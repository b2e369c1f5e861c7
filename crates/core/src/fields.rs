//! Free-text field normalization shared by every record type.
//!
//! Inputs are trimmed; required fields reject blanks, optional ones turn
//! blanks into `None`.

use crate::{DomainError, DomainResult};

pub fn required(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Blank strings clear the field.
pub fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Minimal shape check (`local@domain.tld`), lowercased.
pub fn email(value: &str) -> DomainResult<String> {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {
            Ok(value.to_lowercase())
        }
        _ => Err(DomainError::validation("invalid email format")),
    }
}
