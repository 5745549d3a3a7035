use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::http::header;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::SessionManager;
use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::middleware::JwtMiddleware;
use crate::routes::{get_current_user, health_check, login, logout, refresh, register};

/// Malformed or incomplete JSON bodies become a 400 with the standard error
/// body instead of actix's plain-text default.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::from(ValidationError::MalformedBody(err.to_string())).into()
    })
}

/// Credentialed CORS for the configured browser origins. Origins are checked
/// at startup by `ApplicationSettings::validate`.
fn cors(allowed_origins: &[String]) -> Cors {
    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin.trim()))
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
        .supports_credentials()
        .max_age(3600)
}

pub fn run(
    listener: TcpListener,
    sessions: SessionManager,
    allowed_origins: Vec<String>,
) -> Result<Server, std::io::Error> {
    let sessions = web::Data::new(sessions);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(cors(&allowed_origins))
            .wrap(LoggerMiddleware)

            .app_data(sessions.clone())
            .app_data(json_config())

            .route("/", web::get().to(health_check))
            .route("/health_check", web::get().to(health_check))
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/refresh", web::post().to(refresh))
            .route("/logout", web::post().to(logout))

            // Requires a valid access-token cookie
            .service(
                web::resource("/user")
                    .wrap(JwtMiddleware::new(sessions.clone()))
                    .route(web::get().to(get_current_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
