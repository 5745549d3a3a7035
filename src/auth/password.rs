/// Password Hashing and Verification
///
/// bcrypt with a pinned cost and a pinned output version, so stored hashes do
/// not drift when the crate's defaults change.

use bcrypt::{hash_with_result, verify, Version};

use crate::error::AuthError;

pub const BCRYPT_COST: u32 = 12;
const BCRYPT_VERSION: Version = Version::TwoB;

/// A well-formed cost-12 hash that no user owns. Logins for unknown emails
/// are verified against it so they cost the same as a wrong password.
const UNKNOWN_USER_HASH: &str = "$2b$12$o97yTRnWX54iNqEeukrOAuK84HAjvc9HtM5HR/FsSEIeItBNRjlPK";

/// Hash a password using bcrypt with a random salt
///
/// # Errors
/// `Hash` if bcrypt fails, including when the system RNG is unavailable
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    hash_with_result(password, BCRYPT_COST)
        .map(|parts| parts.format_for_version(BCRYPT_VERSION))
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Verify a password against its hash
///
/// A mismatch is `Ok(false)`, never an error.
///
/// # Errors
/// `MalformedHash` if `hash` is not a parseable bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    verify(password, hash).map_err(|e| {
        tracing::error!("Stored password hash could not be parsed: {}", e);
        AuthError::MalformedHash
    })
}

/// Spend one full bcrypt verification and fail. Used when the email is
/// unknown.
pub fn verify_unknown_user(password: &str) -> Result<bool, AuthError> {
    verify_password(password, UNKNOWN_USER_HASH).map(|_| false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = "secret123";
        let hash = hash_password(password).expect("Failed to hash password");

        assert_ne!(password, hash);
        assert!(hash.starts_with("$2b$12$"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("secret123").unwrap();
        let second = hash_password("secret123").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("secret123").expect("Failed to hash password");

        let is_valid = verify_password("secret123", &hash).expect("Failed to verify password");
        assert!(is_valid);
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("secret123").expect("Failed to hash password");

        let is_valid = verify_password("secret124", &hash).expect("Failed to verify password");
        assert!(!is_valid);
    }

    #[test]
    fn test_malformed_hash() {
        assert_eq!(verify_password("secret123", "plaintext"), Err(AuthError::MalformedHash));
        assert_eq!(verify_password("secret123", ""), Err(AuthError::MalformedHash));
    }

    #[test]
    fn test_unknown_user_hash_matches_configured_cost() {
        assert!(UNKNOWN_USER_HASH.starts_with(&format!("$2b${}$", BCRYPT_COST)));
        assert_eq!(verify_unknown_user("secret123"), Ok(false));
        assert_eq!(verify_unknown_user(""), Ok(false));
    }
}
