/// Cookie transport for session tokens
///
/// Every cookie written here is HttpOnly, Secure and scoped to `/`, including
/// the removal cookies sent on logout.

use actix_web::cookie::time::OffsetDateTime;
use actix_web::cookie::Cookie;
use actix_web::HttpRequest;
use chrono::{DateTime, Duration, Utc};

use crate::auth::jwt::IssuedToken;
use crate::error::AuthError;

pub const ACCESS_TOKEN_COOKIE: &str = "jwt";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

fn to_offset_datetime(at: DateTime<Utc>) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(at.timestamp()).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

pub fn session_cookie(name: &'static str, value: String, expires_at: DateTime<Utc>) -> Cookie<'static> {
    Cookie::build(name, value)
        .http_only(true)
        .secure(true)
        .path("/")
        .expires(to_offset_datetime(expires_at))
        .finish()
}

pub fn access_cookie(token: &IssuedToken) -> Cookie<'static> {
    session_cookie(ACCESS_TOKEN_COOKIE, token.token.clone(), token.expires_at)
}

pub fn refresh_cookie(token: &IssuedToken) -> Cookie<'static> {
    session_cookie(REFRESH_TOKEN_COOKIE, token.token.clone(), token.expires_at)
}

/// Empty value, expiry an hour before `now`.
pub fn removal_cookie(name: &'static str, now: DateTime<Utc>) -> Cookie<'static> {
    session_cookie(name, String::new(), now - Duration::hours(1))
}

/// # Errors
/// `MissingCookie` when the cookie is absent, empty, or the Cookie header is
/// unparseable
pub fn read_cookie(req: &HttpRequest, name: &'static str) -> Result<String, AuthError> {
    req.cookie(name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingCookie(name))
}
