//! Input validation helpers
//!
//! Text length limits and checks shared by services. Request bodies with
//! simple shape rules use `validator` derives instead.

use shared::error::{AppError, ErrorCode};
use shared::models::ShippingAddress;

// ── Text length limits ──────────────────────────────────────────────

/// Product names, user names, recipient names
pub const MAX_NAME_LEN: usize = 200;

/// Review comments, product descriptions, tracking notes
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: zip code, phone, tracking number, carrier
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

/// Street addresses
pub const MAX_ADDRESS_LEN: usize = 500;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(
            AppError::with_message(ErrorCode::RequiredField, format!("{field} must not be empty"))
                .with_detail("field", field),
        );
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Map `validator` failures onto a 400
pub fn from_validation_errors(errors: validator::ValidationErrors) -> AppError {
    let fields: Vec<String> = errors.field_errors().keys().map(|k| k.to_string()).collect();
    AppError::validation(errors.to_string()).with_detail("fields", fields)
}

/// Three ASCII letters, returned upper-cased
pub fn normalize_currency(currency: &str) -> Result<String, AppError> {
    let trimmed = currency.trim();
    if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(trimmed.to_ascii_uppercase())
    } else {
        Err(AppError::with_message(
            ErrorCode::InvalidCurrency,
            format!("Invalid currency code: {currency}"),
        ))
    }
}

pub fn validate_shipping_address(address: &ShippingAddress) -> Result<(), AppError> {
    let check = || -> Result<(), AppError> {
        validate_required_text(&address.full_name, "fullName", MAX_NAME_LEN)?;
        validate_required_text(&address.address, "address", MAX_ADDRESS_LEN)?;
        validate_required_text(&address.state, "state", MAX_NAME_LEN)?;
        validate_required_text(&address.country, "country", MAX_NAME_LEN)?;
        validate_required_text(&address.zip_code, "zipCode", MAX_SHORT_TEXT_LEN)?;
        validate_optional_text(&address.email, "email", MAX_EMAIL_LEN)?;
        validate_optional_text(&address.phone_number, "phoneNumber", MAX_SHORT_TEXT_LEN)
    };
    check().map_err(|e| AppError {
        code: ErrorCode::InvalidShippingAddress,
        ..e
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Lamp", "name", MAX_NAME_LEN).is_ok());
        let err = validate_required_text("   ", "name", MAX_NAME_LEN).unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);
        assert_eq!(err.detail_str("field"), Some("name"));
        assert!(validate_required_text(&"x".repeat(201), "name", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(&None, "note", MAX_NOTE_LEN).is_ok());
        assert!(validate_optional_text(&Some("x".repeat(501)), "note", MAX_NOTE_LEN).is_err());
    }

    #[test]
    fn test_currency() {
        assert_eq!(normalize_currency("usd").unwrap(), "USD");
        assert_eq!(normalize_currency(" EUR ").unwrap(), "EUR");
        for bad in ["", "US", "USDT", "U$D", "12A"] {
            assert_eq!(
                normalize_currency(bad).unwrap_err().code,
                ErrorCode::InvalidCurrency,
                "{bad}"
            );
        }
    }

    #[test]
    fn test_shipping_address() {
        let mut address = ShippingAddress {
            full_name: "Ann".into(),
            address: "1 Main St".into(),
            state: "CA".into(),
            country: "US".into(),
            zip_code: "94000".into(),
            email: None,
            phone_number: None,
        };
        assert!(validate_shipping_address(&address).is_ok());

        address.zip_code = String::new();
        let err = validate_shipping_address(&address).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidShippingAddress);
        assert_eq!(err.detail_str("field"), Some("zipCode"));
    }
}
