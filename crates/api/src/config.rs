use std::fmt;

use sqlx::postgres::PgConnectOptions;

/// Errors raised while reading configuration at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} must be a valid {expected}, got '{value}'")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Database connection settings (`DATABASE__*` variables).
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub db: String,
    pub port: u16,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Connect options for [`aoi_db::create_pool`].
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.db)
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"***")
            .field("db", &self.db)
            .field("port", &self.port)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Server configuration, built once in `main` and handed to the router and
/// [`AppState`](crate::state::AppState).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Verbose logging, including SQL statements (default: `false`).
    pub is_debug: bool,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Largest accepted request body in bytes (default: 10 MiB).
    pub max_upload_bytes: usize,
    pub database: DatabaseConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `HOST`                       | `0.0.0.0`               |
    /// | `WEB_PORT`                   | `8000`                  |
    /// | `IS_DEBUG`                   | `false`                 |
    /// | `CORS_ORIGINS`               | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                    |
    /// | `MAX_UPLOAD_BYTES`           | `10485760`              |
    /// | `DATABASE__HOST`             | required                |
    /// | `DATABASE__USER`             | required                |
    /// | `DATABASE__PASSWORD`         | required                |
    /// | `DATABASE__DB`               | required                |
    /// | `DATABASE__PORT`             | `5432`                  |
    /// | `DATABASE__MAX_CONNECTIONS`  | `20`                    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        let cors_origins = vars
            .or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database = DatabaseConfig {
            host: vars.required("DATABASE__HOST")?,
            user: vars.required("DATABASE__USER")?,
            password: vars.required("DATABASE__PASSWORD")?,
            db: vars.required("DATABASE__DB")?,
            port: vars.parsed("DATABASE__PORT", 5432, "u16")?,
            max_connections: vars.parsed("DATABASE__MAX_CONNECTIONS", 20, "u32")?,
        };

        Ok(Self {
            host: vars.or("HOST", "0.0.0.0"),
            port: vars.parsed("WEB_PORT", 8000, "u16")?,
            is_debug: vars.flag("IS_DEBUG")?,
            cors_origins,
            request_timeout_secs: vars.parsed("REQUEST_TIMEOUT_SECS", 30, "u64")?,
            max_upload_bytes: vars.parsed("MAX_UPLOAD_BYTES", 10 * 1024 * 1024, "usize")?,
            database,
        })
    }

    /// Tracing filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        if self.is_debug {
            "aoi_api=debug,aoi_db=debug,tower_http=debug,sqlx=debug"
        } else {
            "aoi_api=info,tower_http=info"
        }
    }
}

struct Vars<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    fn or(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        (self.0)(key).ok_or(ConfigError::Missing(key))
    }

    fn parsed<T: std::str::FromStr>(
        &self,
        key: &'static str,
        default: T,
        expected: &'static str,
    ) -> Result<T, ConfigError> {
        match (self.0)(key) {
            None => Ok(default),
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                key,
                expected,
                value,
            }),
        }
    }

    fn flag(&self, key: &'static str) -> Result<bool, ConfigError> {
        match (self.0)(key) {
            None => Ok(false),
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" | "" => Ok(false),
                _ => Err(ConfigError::Invalid {
                    key,
                    expected: "boolean",
                    value,
                }),
            },
        }
    }
}
