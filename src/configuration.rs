use std::time::Duration;

use crate::error::ConfigError;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed to make credentialed (cookie) requests
    pub allowed_origins: Vec<String>,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for origin in &self.allowed_origins {
            let origin = origin.trim();
            if origin == "*" {
                return Err(ConfigError::InvalidValue(
                    "application.allowed_origins cannot be `*` when cookies are sent".to_string(),
                ));
            }
            if !(origin.starts_with("http://") || origin.starts_with("https://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "application.allowed_origins: `{}` is not an http(s) origin",
                    origin
                )));
            }
        }
        Ok(())
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub max_connections: u32,
    /// Upper bound for any single credential store call
    pub timeout_milliseconds: u64,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

/// JWT signing secrets. Access and refresh tokens never share a key.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
}

// Secrets stay out of logs and panic messages.
impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("access_secret", &"[redacted]")
            .field("refresh_secret", &"[redacted]")
            .finish()
    }
}

impl JwtSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.access_secret".to_string()));
        }
        if self.refresh_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.refresh_secret".to_string()));
        }
        if self.access_secret == self.refresh_secret {
            return Err(ConfigError::InvalidValue(
                "jwt.access_secret and jwt.refresh_secret must differ".to_string(),
            ));
        }
        Ok(())
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt.validate()?;
        self.application.validate()?;
        if self.database.timeout_milliseconds == 0 {
            return Err(ConfigError::InvalidValue(
                "database.timeout_milliseconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load settings from (in increasing priority) built-in defaults, an optional
/// `configuration.{yaml,toml,json}` file, `APP_`-prefixed environment
/// variables (`APP_JWT__ACCESS_SECRET`, comma-separated
/// `APP_APPLICATION__ALLOWED_ORIGINS`), and the bare `JWT_SECRET` /
/// `JWT_REFRESH_SECRET` variables.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8080)?
        .set_default("application.allowed_origins", vec!["http://localhost:3000"])?
        .set_default("database.username", "postgres")?
        .set_default("database.password", "password")?
        .set_default("database.host", "127.0.0.1")?
        .set_default("database.port", 5432)?
        .set_default("database.database_name", "tripauth")?
        .set_default("database.max_connections", 5)?
        .set_default("database.timeout_milliseconds", 5000)?
        .set_default("jwt.access_secret", "")?
        .set_default("jwt.refresh_secret", "")?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("application.allowed_origins"),
        )
        .set_override_option("jwt.access_secret", std::env::var("JWT_SECRET").ok())?
        .set_override_option("jwt.refresh_secret", std::env::var("JWT_REFRESH_SECRET").ok())?
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt(access: &str, refresh: &str) -> JwtSettings {
        JwtSettings {
            access_secret: access.to_string(),
            refresh_secret: refresh.to_string(),
        }
    }

    #[test]
    fn test_distinct_secrets_are_accepted() {
        assert!(jwt("access-secret", "refresh-secret").validate().is_ok());
    }

    #[test]
    fn test_missing_secrets_are_rejected() {
        assert_eq!(
            jwt("", "refresh-secret").validate(),
            Err(ConfigError::MissingRequired("jwt.access_secret".to_string()))
        );
        assert_eq!(
            jwt("access-secret", "   ").validate(),
            Err(ConfigError::MissingRequired("jwt.refresh_secret".to_string()))
        );
    }

    #[test]
    fn test_shared_secret_is_rejected() {
        assert!(matches!(
            jwt("same", "same").validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", jwt("top-secret-a", "top-secret-r"));
        assert!(!rendered.contains("top-secret"));
    }

    fn application(origins: &[&str]) -> ApplicationSettings {
        ApplicationSettings {
            host: "127.0.0.1".into(),
            port: 8080,
            allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
        }
    }

    #[test]
    fn test_allowed_origins() {
        assert!(application(&[]).validate().is_ok());
        assert!(application(&["http://localhost:3000", "https://app.example.com"])
            .validate()
            .is_ok());
        assert!(matches!(
            application(&["*"]).validate(),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            application(&["localhost:3000"]).validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_connection_string() {
        let db = DatabaseSettings {
            username: "app".into(),
            password: "pw".into(),
            port: 5433,
            host: "db".into(),
            database_name: "users".into(),
            max_connections: 5,
            timeout_milliseconds: 250,
        };
        assert_eq!(db.connection_string(), "postgres://app:pw@db:5433/users");
        assert_eq!(db.timeout(), Duration::from_millis(250));
    }
}
