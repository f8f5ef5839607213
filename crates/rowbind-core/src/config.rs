//! Configuration schema (rowbind.toml)
//!
//! Connection settings can also come from the environment (`DB_HOST`,
//! `DB_PORT`, `DB_NAME`, `DB_USER`, `DB_PASSWORD`, `DB_SCHEMA`), optionally
//! seeded from a `.env` file.

use serde::{Deserialize, Serialize};

/// Database connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Server hostname or IP
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name
    pub name: String,

    /// Login user
    pub user: String,

    /// Login password
    #[serde(default)]
    pub password: String,

    /// Schema searched for tables
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Connect over TLS
    #[serde(default)]
    pub tls: bool,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_schema() -> String {
    "public".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            name: String::new(),
            user: String::new(),
            password: String::new(),
            schema: default_schema(),
            tls: false,
        }
    }
}

impl DatabaseConfig {
    /// Render a libpq key/value connection string
    pub fn connection_string(&self) -> String {
        let mut parts = vec![
            format!("host={}", quote_conn_value(&self.host)),
            format!("port={}", self.port),
            format!("dbname={}", quote_conn_value(&self.name)),
            format!("user={}", quote_conn_value(&self.user)),
        ];
        if !self.password.is_empty() {
            parts.push(format!("password={}", quote_conn_value(&self.password)));
        }
        parts.join(" ")
    }

    /// Build from environment-style variables supplied by `lookup`
    ///
    /// `DB_NAME` and `DB_USER` are required; everything else falls back to
    /// the defaults.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required =
            |key: &str| lookup(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()));

        let port = match lookup("DB_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| {
                    ConfigError::ParseError(format!("DB_PORT is not a port number: {}", raw))
                })?,
            None => default_port(),
        };

        Ok(Self {
            host: lookup("DB_HOST").unwrap_or_else(default_host),
            port,
            name: required("DB_NAME")?,
            user: required("DB_USER")?,
            password: lookup("DB_PASSWORD").unwrap_or_default(),
            schema: lookup("DB_SCHEMA").unwrap_or_else(default_schema),
            tls: lookup("DB_TLS").is_some_and(|v| matches!(v.as_str(), "1" | "true" | "yes")),
        })
    }
}

/// Quote a connection string value when it contains spaces or quotes
fn quote_conn_value(value: &str) -> String {
    if value.is_empty() || value.contains([' ', '\'', '\\']) {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    } else {
        value.to_string()
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Connection settings
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load config from the process environment, reading `.env` first if present
    pub fn from_env() -> Result<Self, ConfigError> {
        env_file_loaded(dotenvy::dotenv())?;

        Ok(Self {
            database: DatabaseConfig::from_vars(|key| std::env::var(key).ok())?,
        })
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }
}

/// Accept a missing `.env` file but report one that cannot be read or parsed
fn env_file_loaded<T>(result: dotenvy::Result<T>) -> Result<(), ConfigError> {
    match result {
        Ok(_) => Ok(()),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(dotenvy::Error::Io(e)) => Err(ConfigError::IoError(e.to_string())),
        Err(e) => Err(ConfigError::ParseError(format!(".env: {}", e))),
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
}
