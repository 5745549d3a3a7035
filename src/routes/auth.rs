/// Authentication Routes
///
/// Registration, login, current user, access-token refresh and logout.
/// Tokens travel only in cookies; response bodies carry a short message.

use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::cookies::{access_cookie, read_cookie, refresh_cookie, REFRESH_TOKEN_COOKIE};
use crate::auth::{Registration, SessionManager};
use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::validators::{is_valid_email, is_valid_name, is_valid_password, is_valid_phone_number};

/// User registration request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /register
///
/// # Errors
/// - 400: invalid body, email or phone number already registered
/// - 500: hashing or store failure
pub async fn register(
    form: web::Json<RegisterRequest>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();

    let registration = Registration {
        first_name: is_valid_name("firstName", &form.first_name)?,
        last_name: is_valid_name("lastName", &form.last_name)?,
        email: is_valid_email(&form.email)?,
        password: {
            is_valid_password(&form.password)?;
            form.password
        },
        phone_number: is_valid_phone_number(&form.phone_number)?,
    };

    sessions.register(registration).await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "user registered successfully",
    }))
}

/// POST /login
///
/// Sets the `jwt` (15 min) and `refresh_token` (7 days) cookies.
///
/// # Errors
/// - 400: invalid body
/// - 401: invalid credentials (same response for unknown email and wrong password)
/// - 500: signing or store failure
pub async fn login(
    form: web::Json<LoginRequest>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let tokens = sessions.login(form.email.trim(), &form.password).await?;

    Ok(HttpResponse::build(StatusCode::ACCEPTED)
        .cookie(access_cookie(&tokens.access))
        .cookie(refresh_cookie(&tokens.refresh))
        .json(MessageResponse {
            message: "login successful",
        }))
}

/// GET /user
///
/// Requires a valid `jwt` cookie (checked by `JwtMiddleware`).
///
/// # Errors
/// - 401: missing, invalid or expired cookie (middleware)
/// - 404: no user behind the token's subject
pub async fn get_current_user(
    caller: web::ReqData<AuthenticatedUser>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let user = sessions.current_user(caller.user_id).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// POST /refresh
///
/// Issues a new access-token cookie from the `refresh_token` cookie. The
/// refresh token itself is not rotated. Nothing is set on failure.
///
/// # Errors
/// - 401: missing, invalid or expired refresh cookie
pub async fn refresh(
    req: HttpRequest,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = read_cookie(&req, REFRESH_TOKEN_COOKIE)?;
    let access = sessions.refresh(&refresh_token)?;

    Ok(HttpResponse::Ok()
        .cookie(access_cookie(&access))
        .json(MessageResponse {
            message: "Token refreshed successfully",
        }))
}

/// POST /logout
///
/// Overwrites both cookies with expired, empty ones. Tokens already handed
/// out remain valid until they expire on their own.
pub async fn logout(sessions: web::Data<SessionManager>) -> HttpResponse {
    let [access, refresh] = sessions.logout();

    tracing::info!("Session cookies cleared");

    HttpResponse::build(StatusCode::ACCEPTED)
        .cookie(access)
        .cookie(refresh)
        .json(MessageResponse {
            message: "Logout successful",
        })
}
