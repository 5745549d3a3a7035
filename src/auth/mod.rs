/// Authentication module
///
/// Password hashing, JWT issue/verification, cookie transport and the
/// session lifecycle built on top of them.

mod claims;
pub mod clock;
pub mod cookies;
mod jwt;
mod password;
mod session;

pub use claims::{Claims, UserId};
pub use clock::{Clock, ManualClock, SystemClock};
pub use jwt::{
    issue_access_token, issue_refresh_token, issue_token, verify_access_token, verify_refresh_token,
    verify_token, IssuedToken, JwtKeys, TokenKind,
};
pub use password::{hash_password, verify_password, BCRYPT_COST};
pub use session::{LoginTokens, Registration, SessionManager, SessionState};
