//! Server configuration.

use std::env;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DATABASE_URL: &str = "sqlite:todo.db?mode=rwc";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// SQLite connection URL.
    pub database_url: String,
    /// Maximum number of pooled database connections.
    pub max_connections: u32,
    /// Log level.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map(|url| normalize_database_url(&url))
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        if database_url.is_empty() {
            anyhow::bail!("DATABASE_URL must not be empty");
        }

        Ok(Self {
            host: env::var("TODO_SERVER_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("TODO_SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            database_url,
            max_connections: env::var("TODO_DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            log_level: env::var("TODO_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Returns the server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Turns a bare file path into a SQLite URL that creates the file if missing.
fn normalize_database_url(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() || value.starts_with("sqlite:") {
        value.to_string()
    } else {
        format!("sqlite:{value}?mode=rwc")
    }
}
