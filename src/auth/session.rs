/// Session lifecycle
///
/// There is no server-side session table: a client's session state is fully
/// described by the two cookies it holds.
///
/// ```text
///   Anonymous ──login──▶ Authenticated ──15 min──▶ AccessExpired
///       ▲                     ▲                         │
///       │                     └────────refresh──────────┘
///       └──── logout (any state) / refresh token expired ┘
/// ```
///
/// Logout only clears cookies. Tokens issued before it stay cryptographically
/// valid until their own expiry.

use actix_web::cookie::Cookie;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::clock::Clock;
use crate::auth::claims::UserId;
use crate::auth::cookies::{removal_cookie, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::auth::jwt::{
    issue_access_token, issue_refresh_token, verify_access_token, verify_refresh_token, IssuedToken,
    JwtKeys,
};
use crate::auth::password::{hash_password, verify_password, verify_unknown_user};
use crate::error::{AppError, AuthError, StoreError, UniqueField};
use crate::store::{NewUser, User, UserStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No usable cookie
    Anonymous,
    /// Access cookie verifies
    Authenticated(UserId),
    /// Access cookie missing or expired, refresh cookie still verifies
    AccessExpired(UserId),
}

/// Both tokens minted by a successful login
#[derive(Debug, Clone)]
pub struct LoginTokens {
    pub user_id: UserId,
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Validated registration input
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
}

pub struct SessionManager {
    store: Arc<dyn UserStore>,
    keys: JwtKeys,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn UserStore>,
        keys: JwtKeys,
        clock: Arc<dyn Clock>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            keys,
            clock,
            store_timeout,
        }
    }

    /// Create a user. Does not log the user in.
    ///
    /// The email check and the insert are not atomic; two concurrent
    /// registrations can both pass the check, and the store's unique
    /// constraint decides which one wins. The loser still gets `EmailTaken`.
    ///
    /// # Errors
    /// - `EmailTaken` / `PhoneTaken` on a uniqueness conflict
    /// - `Hash` if the password cannot be hashed
    /// - store errors (including timeout)
    pub async fn register(&self, registration: Registration) -> Result<User, AppError> {
        let existing = self
            .bounded("find_by_email", self.store.find_by_email(&registration.email))
            .await?;
        if existing.is_some() {
            return Err(AuthError::EmailTaken.into());
        }

        let password = registration.password;
        let password_hash = run_blocking(move || hash_password(&password)).await??;

        let new_user = NewUser {
            first_name: registration.first_name,
            last_name: registration.last_name,
            email: registration.email,
            password_hash,
            phone_number: registration.phone_number,
        };

        match self.bounded("insert", self.store.insert(new_user)).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "User registered");
                Ok(user)
            }
            Err(AppError::Store(StoreError::UniqueViolation(UniqueField::Email))) => {
                Err(AuthError::EmailTaken.into())
            }
            Err(AppError::Store(StoreError::UniqueViolation(UniqueField::PhoneNumber))) => {
                Err(AuthError::PhoneTaken.into())
            }
            Err(e) => Err(e),
        }
    }

    /// Anonymous → Authenticated.
    ///
    /// # Errors
    /// - `InvalidCredentials` for an unknown email or a wrong password alike
    /// - `Signing` / `MalformedHash` / store errors as internal failures
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginTokens, AppError> {
        let password = password.to_string();
        let user = match self
            .bounded("find_by_email", self.store.find_by_email(email))
            .await?
        {
            Some(user) => user,
            None => {
                // Same bcrypt work as a wrong password.
                run_blocking(move || verify_unknown_user(&password)).await??;
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        let password_hash = user.password_hash.clone();
        let password_valid = run_blocking(move || verify_password(&password, &password_hash)).await??;
        if !password_valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        let now = self.clock.now();
        let access = issue_access_token(user.id, &self.keys, now)?;
        let refresh = issue_refresh_token(user.id, &self.keys, now)?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginTokens {
            user_id: user.id,
            access,
            refresh,
        })
    }

    /// Resolve the user behind an access token. Never consults the refresh
    /// token.
    ///
    /// # Errors
    /// `Unauthorized` if the token does not verify
    pub fn authenticate(&self, access_token: &str) -> Result<UserId, AuthError> {
        verify_access_token(access_token, &self.keys, self.clock.now())
    }

    /// AccessExpired → Authenticated. Issues a new access token only; the
    /// refresh token keeps its original expiry.
    ///
    /// # Errors
    /// `Unauthorized` if the refresh token does not verify
    pub fn refresh(&self, refresh_token: &str) -> Result<IssuedToken, AppError> {
        let now = self.clock.now();
        let user_id = verify_refresh_token(refresh_token, &self.keys, now)?;
        let access = issue_access_token(user_id, &self.keys, now)?;

        tracing::info!(user_id = %user_id, "Access token refreshed");
        Ok(access)
    }

    /// Any state → Anonymous. Returns the cookies that overwrite both tokens.
    pub fn logout(&self) -> [Cookie<'static>; 2] {
        let now = self.clock.now();
        [
            removal_cookie(ACCESS_TOKEN_COOKIE, now),
            removal_cookie(REFRESH_TOKEN_COOKIE, now),
        ]
    }

    /// Classify a client by the cookie values it presents.
    pub fn state(&self, access_token: Option<&str>, refresh_token: Option<&str>) -> SessionState {
        let now = self.clock.now();

        if let Some(user_id) = access_token.and_then(|t| verify_access_token(t, &self.keys, now).ok()) {
            return SessionState::Authenticated(user_id);
        }
        match refresh_token.and_then(|t| verify_refresh_token(t, &self.keys, now).ok()) {
            Some(user_id) => SessionState::AccessExpired(user_id),
            None => SessionState::Anonymous,
        }
    }

    /// # Errors
    /// `NotFound` if the id (taken from a valid token) has no user behind it
    pub async fn current_user(&self, user_id: UserId) -> Result<User, AppError> {
        self.bounded("find_by_id", self.store.find_by_id(user_id))
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    /// Every store call gets the same deadline; running out of time is an
    /// internal failure, never an authentication verdict.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => {
                tracing::error!(operation, timeout_ms = self.store_timeout.as_millis() as u64, "Store call timed out");
                Err(StoreError::Timeout(operation).into())
            }
        }
    }
}

/// bcrypt is deliberately slow; keep it off the async workers.
async fn run_blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))
}
