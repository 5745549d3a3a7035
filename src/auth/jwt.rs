/// JWT Token Issue and Verification
///
/// Access and refresh tokens are both HS256 JWTs, but each kind has its own
/// secret and its own header `kid`. Verification checks the `kid` before the
/// signature, so a token of one kind is rejected by the other kind's verifier
/// even if the two secrets were ever equal.
///
/// Expiry is compared against a caller-supplied `now` with zero leeway.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::{Claims, UserId};
use crate::configuration::JwtSettings;
use crate::error::{AuthError, ConfigError};

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn key_id(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }

    /// 15 minutes for access tokens, 7 days for refresh tokens
    pub fn lifetime(self) -> Duration {
        match self {
            TokenKind::Access => Duration::minutes(15),
            TokenKind::Refresh => Duration::days(7),
        }
    }
}

/// A freshly signed token and the instant it stops being valid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signing secrets, validated once at startup
#[derive(Clone)]
pub struct JwtKeys {
    access: Vec<u8>,
    refresh: Vec<u8>,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtKeys([redacted])")
    }
}

impl JwtKeys {
    /// # Errors
    /// Returns error if either secret is empty or both are the same
    pub fn from_settings(settings: &JwtSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            access: settings.access_secret.as_bytes().to_vec(),
            refresh: settings.refresh_secret.as_bytes().to_vec(),
        })
    }

    fn secret(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }
}

pub fn issue_access_token(
    user_id: UserId,
    keys: &JwtKeys,
    now: DateTime<Utc>,
) -> Result<IssuedToken, AuthError> {
    issue_token(TokenKind::Access, user_id, keys, now)
}

pub fn issue_refresh_token(
    user_id: UserId,
    keys: &JwtKeys,
    now: DateTime<Utc>,
) -> Result<IssuedToken, AuthError> {
    issue_token(TokenKind::Refresh, user_id, keys, now)
}

/// # Errors
/// `Signing` if the secret for `kind` is empty or encoding fails
pub fn issue_token(
    kind: TokenKind,
    user_id: UserId,
    keys: &JwtKeys,
    now: DateTime<Utc>,
) -> Result<IssuedToken, AuthError> {
    let secret = keys.secret(kind);
    if secret.is_empty() {
        return Err(AuthError::Signing(format!("{} secret is empty", kind.key_id())));
    }

    let expires_at = now + kind.lifetime();
    let claims = Claims::new(user_id, expires_at);

    let mut header = Header::new(ALGORITHM);
    header.kid = Some(kind.key_id().to_string());

    let token = encode(&header, &claims, &EncodingKey::from_secret(secret))
        .map_err(|e| AuthError::Signing(e.to_string()))?;

    Ok(IssuedToken { token, expires_at })
}

pub fn verify_access_token(
    token: &str,
    keys: &JwtKeys,
    now: DateTime<Utc>,
) -> Result<UserId, AuthError> {
    verify_token(TokenKind::Access, token, keys, now)
}

pub fn verify_refresh_token(
    token: &str,
    keys: &JwtKeys,
    now: DateTime<Utc>,
) -> Result<UserId, AuthError> {
    verify_token(TokenKind::Refresh, token, keys, now)
}

/// # Errors
/// `Unauthorized` for every kind of failure; the reason is only logged
pub fn verify_token(
    kind: TokenKind,
    token: &str,
    keys: &JwtKeys,
    now: DateTime<Utc>,
) -> Result<UserId, AuthError> {
    let secret = keys.secret(kind);
    if token.is_empty() || secret.is_empty() {
        return Err(AuthError::Unauthorized);
    }

    let header = decode_header(token).map_err(|e| {
        tracing::debug!(kind = kind.key_id(), "Malformed token header: {}", e);
        AuthError::Unauthorized
    })?;
    if header.alg != ALGORITHM || header.kid.as_deref() != Some(kind.key_id()) {
        tracing::warn!(
            kind = kind.key_id(),
            presented_kid = ?header.kid,
            "Token presented to the wrong verifier"
        );
        return Err(AuthError::Unauthorized);
    }

    let mut validation = Validation::new(ALGORITHM);
    // Expiry is checked below against the injected clock.
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::warn!(kind = kind.key_id(), "JWT validation error: {}", e);
            AuthError::Unauthorized
        })?;

    if claims.is_expired_at(now) {
        tracing::debug!(kind = kind.key_id(), sub = %claims.sub, "Token expired");
        return Err(AuthError::Unauthorized);
    }

    claims.user_id()
}
