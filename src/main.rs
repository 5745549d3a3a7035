use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;
use tripauth::auth::{JwtKeys, SessionManager, SystemClock};
use tripauth::configuration::get_configuration;
use tripauth::startup::run;
use tripauth::store::PgUserStore;
use tripauth::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // A missing .env is fine; real deployments use the environment directly.
    let _ = dotenv::dotenv();

    init_telemetry();

    tracing::info!("Starting application");

    // Refuse to start without two distinct signing secrets.
    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let keys = JwtKeys::from_settings(&configuration.jwt).map_err(|e| {
        tracing::error!("Invalid JWT configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "JWT configuration error")
    })?;

    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(configuration.database.max_connections)
        .acquire_timeout(configuration.database.timeout())
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to run migrations: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, "Migration error")
        })?;

    tracing::info!("Database ready");

    let sessions = SessionManager::new(
        Arc::new(PgUserStore::new(pool)),
        keys,
        Arc::new(SystemClock),
        configuration.database.timeout(),
    );

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, sessions, configuration.application.allowed_origins)?;
    server.await
}
