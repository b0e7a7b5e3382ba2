//! Decimal-string amounts
//!
//! Stake, price and cost are carried as decimal strings (`"0"`, `"12.5"`) so
//! that no precision is lost between the caller and the store.

use super::error::DomainError;

/// Returns true for a non-negative decimal literal such as `"0"`, `"12"` or `"0.25"`.
pub fn is_decimal(value: &str) -> bool {
    let mut parts = value.split('.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next();

    if parts.next().is_some() || whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match fraction {
        Some(f) => !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()),
        None => true,
    }
}

/// Validate an optional decimal field (empty means "not set").
pub fn check_decimal(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.is_empty() || is_decimal(value) {
        Ok(())
    } else {
        Err(DomainError::InvalidAmount {
            field,
            value: value.to_string(),
        })
    }
}
