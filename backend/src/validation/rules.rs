//! Common validation rules shared across request payloads.

use validator::ValidationError;

/// Validates a Colombian NIT.
///
/// Requirements:
/// - 6-15 digits
/// - Optional `-` followed by a single verification digit
pub fn validate_nit(nit: &str) -> Result<(), ValidationError> {
    let (body, check) = match nit.trim().split_once('-') {
        Some((body, check)) => (body, Some(check)),
        None => (nit.trim(), None),
    };

    if body.len() < 6 || body.len() > 15 || !body.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("nit_invalid_format"));
    }

    if let Some(check) = check {
        if check.len() != 1 || !check.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::new("nit_invalid_check_digit"));
        }
    }

    Ok(())
}

/// Validates an identity document number (cédula, passport, ...).
///
/// Requirements:
/// - 4-20 characters, ASCII letters and digits only
pub fn validate_document_number(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.len() < 4 || trimmed.len() > 20 {
        return Err(ValidationError::new("document_number_invalid_length"));
    }
    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::new("document_number_invalid_characters"));
    }
    Ok(())
}

/// Validates an employee number: 1-30 characters of letters, digits, `-` or `_`.
pub fn validate_employee_number(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > 30 {
        return Err(ValidationError::new("employee_number_invalid_length"));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::new("employee_number_invalid_characters"));
    }
    Ok(())
}

/// Rejects strings that are empty after trimming.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Validates a password against the configured minimum length.
pub fn validate_password(password: &str, min_length: usize) -> Result<(), ValidationError> {
    if password.chars().count() < min_length.max(1) {
        return Err(ValidationError::new("password_too_short"));
    }
    if password.trim().is_empty() {
        return Err(ValidationError::new("password_blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nit_accepts_digits_with_check_digit() {
        assert!(validate_nit("900123456-7").is_ok());
        assert!(validate_nit("900123456").is_ok());
    }

    #[test]
    fn nit_rejects_letters_and_long_check_digit() {
        assert!(validate_nit("90012A456").is_err());
        assert!(validate_nit("900123456-78").is_err());
        assert!(validate_nit("123").is_err());
    }

    #[test]
    fn document_number_rejects_symbols() {
        assert!(validate_document_number("1020.304").is_err());
        assert!(validate_document_number("1020304050").is_ok());
        assert!(validate_document_number("AB12").is_ok());
    }

    #[test]
    fn employee_number_allows_dashes() {
        assert!(validate_employee_number("EMP-001").is_ok());
        assert!(validate_employee_number("").is_err());
        assert!(validate_employee_number("EMP 001").is_err());
    }

    #[test]
    fn not_blank_rejects_whitespace() {
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("x").is_ok());
    }

    #[test]
    fn password_respects_min_length() {
        assert!(validate_password("short", 8).is_err());
        assert!(validate_password("long-enough", 8).is_ok());
    }
}
