/// JWT Claims structure
///
/// Both token kinds carry exactly two claims: the subject (user id, string
/// encoded as RFC 7519 requires) and the expiry as a Unix timestamp. Which
/// secret signed the token is named in the header `kid`, not in the claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;

/// Identifier assigned to a user by the credential store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .map(UserId)
            .ok_or(AuthError::Unauthorized)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: UserId, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: user_id.to_string(),
            exp: expires_at.timestamp(),
        }
    }

    /// Extract user ID from claims
    ///
    /// # Errors
    /// `Unauthorized` if the subject is not a valid user id
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub.parse()
    }

    /// An `exp` equal to the current second counts as elapsed.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_claims_creation() {
        let now = Utc::now();
        let claims = Claims::new(UserId(7), now + Duration::minutes(15));

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.exp, now.timestamp() + 900);
        assert!(!claims.is_expired_at(now));
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let claims = Claims::new(UserId(7), now);

        assert!(claims.is_expired_at(now));
        assert!(!claims.is_expired_at(now - Duration::seconds(1)));
    }

    #[test]
    fn test_user_id_extraction() {
        let claims = Claims::new(UserId(42), Utc::now());
        assert_eq!(claims.user_id().unwrap(), UserId(42));
    }

    #[test]
    fn test_invalid_user_id() {
        for sub in ["", "abc", "-3", "0", "4.2", "99999999999999999999"] {
            let claims = Claims {
                sub: sub.to_string(),
                exp: 0,
            };
            assert_eq!(claims.user_id(), Err(AuthError::Unauthorized), "sub = {:?}", sub);
        }
    }

    #[test]
    fn test_missing_claim_is_rejected() {
        let parsed: Result<Claims, _> = serde_json::from_str(r#"{"sub":"1"}"#);
        assert!(parsed.is_err());

        let parsed: Result<Claims, _> = serde_json::from_str(r#"{"exp":1700000000}"#);
        assert!(parsed.is_err());
    }
}
