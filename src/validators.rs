/// Input validators for registration payloads
/// Features:
/// 1. DoS Protection: Input length limits
/// 2. Email format validation
/// 3. Control-character rejection in free-text fields
///
/// Emails are trimmed but never case-folded: lookups are case-sensitive.

use regex::Regex;
use lazy_static::lazy_static;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 3;
const MAX_NAME_LENGTH: usize = 256;
const MAX_PHONE_LENGTH: usize = 32;
// bcrypt only looks at the first 72 bytes.
const MAX_PASSWORD_BYTES: usize = 72;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    // Optional leading '+', then digits with common separators.
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9(][0-9 ().-]*$").unwrap();
}

/// Validates email address
/// - Checks format using RFC 5322 simplified regex
/// - Verifies length constraints
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email", MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    if let Some(at_pos) = trimmed.find('@') {
        if at_pos > 64 {
            return Err(ValidationError::SuspiciousContent("email"));
        }
    }

    Ok(trimmed.to_string())
}

/// Validates a first or last name
pub fn is_valid_name(field: &'static str, name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }

    if trimmed.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong(field, MAX_NAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::SuspiciousContent(field));
    }

    Ok(trimmed.to_string())
}

pub fn is_valid_phone_number(phone: &str) -> Result<String, ValidationError> {
    let trimmed = phone.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("phoneNumber"));
    }

    if trimmed.len() > MAX_PHONE_LENGTH {
        return Err(ValidationError::TooLong("phoneNumber", MAX_PHONE_LENGTH));
    }

    if !PHONE_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("phoneNumber"));
    }

    Ok(trimmed.to_string())
}

/// Passwords are taken verbatim (no trimming); only emptiness and the bcrypt
/// input limit are checked.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_BYTES));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(is_valid_email("a@x.com").is_ok());
        assert!(is_valid_email("test.email@domain.co.uk").is_ok());
        assert!(is_valid_email("user+tag@example.com").is_ok());
    }

    #[test]
    fn test_email_is_trimmed_not_lowercased() {
        assert_eq!(is_valid_email("  Mixed@Case.com ").unwrap(), "Mixed@Case.com");
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
        assert_eq!(is_valid_email(""), Err(ValidationError::EmptyField("email")));
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());

        let long_local = format!("{}@example.com", "a".repeat(65));
        assert_eq!(
            is_valid_email(&long_local),
            Err(ValidationError::SuspiciousContent("email"))
        );
    }

    #[test]
    fn test_valid_name() {
        assert_eq!(is_valid_name("firstName", "A").unwrap(), "A");
        assert!(is_valid_name("lastName", "Jean-Pierre").is_ok());
        assert!(is_valid_name("lastName", "O'Brien").is_ok());
    }

    #[test]
    fn test_invalid_name() {
        assert_eq!(
            is_valid_name("firstName", "   "),
            Err(ValidationError::EmptyField("firstName"))
        );
        assert!(is_valid_name("lastName", &"a".repeat(257)).is_err());
        assert!(is_valid_name("lastName", "Name\0with\0null").is_err());
    }

    #[test]
    fn test_phone_numbers() {
        assert!(is_valid_phone_number("+1").is_ok());
        assert!(is_valid_phone_number("+91 98765-43210").is_ok());
        assert!(is_valid_phone_number("(555) 123.4567").is_ok());
        assert!(is_valid_phone_number("").is_err());
        assert!(is_valid_phone_number("call me").is_err());
        assert!(is_valid_phone_number("++1").is_err());
        assert!(is_valid_phone_number(&"1".repeat(33)).is_err());
    }

    #[test]
    fn test_passwords() {
        assert!(is_valid_password("secret123").is_ok());
        assert!(is_valid_password(" spaces are kept ").is_ok());
        assert_eq!(is_valid_password(""), Err(ValidationError::EmptyField("password")));
        assert!(is_valid_password(&"p".repeat(73)).is_err());
    }
}
