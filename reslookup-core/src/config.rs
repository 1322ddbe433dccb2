//! Service configuration
//!
//! Parameters are read through a [`ParameterSource`], resolved once into a
//! [`ServiceConfig`] and passed explicitly to everything that needs them.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::models::{TableName, ValidationError};

pub const KEY_MYSQL_USER: &str = "UNICORN_MYSQLUSER";
pub const KEY_MYSQL_PASS: &str = "UNICORN_MYSQLPASS";
pub const KEY_MYSQL_HOST: &str = "UNICORN_MYSQLHOST";
pub const KEY_MYSQL_PORT: &str = "UNICORN_MYSQLPORT";
pub const KEY_MYSQL_DB: &str = "UNICORN_MYSQLDB";
pub const KEY_MYSQL_TABLE: &str = "UNICORN_MYSQLTABLE";
pub const KEY_DOWNLOAD_URL: &str = "DOWNLOAD_URL";
pub const KEY_FEED_TIMEOUT: &str = "FEED_TIMEOUT_SECS";
pub const KEY_CONNECT_TIMEOUT: &str = "STORE_CONNECT_TIMEOUT_SECS";

const DEFAULT_FEED_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing parameter {key}")]
    Missing { key: &'static str },

    #[error("parameter {key} is empty")]
    Empty { key: &'static str },

    #[error("parameter {key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("invalid table name: {0}")]
    Table(#[from] ValidationError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Where named parameters come from (environment, a file, a secret store).
pub trait ParameterSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvParameters;

impl ParameterSource for EnvParameters {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl ParameterSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Flat TOML file keyed by the same parameter names as the environment.
///
/// ```toml
/// UNICORN_MYSQLHOST = "db.internal"
/// UNICORN_MYSQLPORT = 3306
/// ```
#[derive(Debug, Clone)]
pub struct TomlParameters {
    values: HashMap<String, String>,
}

impl TomlParameters {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        let table: toml::Table = toml::from_str(contents)?;
        let values = table
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    toml::Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect();
        Ok(Self { values })
    }
}

impl ParameterSource for TomlParameters {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Load `.env` files from the current directory and `~/.reslookup/.env`.
///
/// Variables already set in the environment are never overwritten.
pub fn load_dotenv() {
    let mut loaded_from = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        loaded_from.push(path.display().to_string());
    }

    if let Some(env_file) = config_dir().map(|dir| dir.join(".env")) {
        if env_file.exists() {
            match dotenvy::from_path(&env_file) {
                Ok(()) => loaded_from.push(env_file.display().to_string()),
                Err(e) => debug!("Failed to load {}: {}", env_file.display(), e),
            }
        }
    }

    if loaded_from.is_empty() {
        debug!("No .env files found, using environment variables only");
    } else {
        info!("Loaded configuration from: {}", loaded_from.join(", "));
    }
}

/// `~/.reslookup`
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".reslookup"))
}

/// Everything an invocation needs to reach the store and the feed.
#[derive(Clone)]
pub struct ServiceConfig {
    pub mysql_user: String,
    pub mysql_pass: String,
    pub mysql_host: String,
    pub mysql_port: u16,
    pub mysql_db: String,
    pub table: TableName,
    pub download_url: String,
    pub feed_timeout: Duration,
    pub connect_timeout: Duration,
}

impl ServiceConfig {
    /// Resolve every parameter from `source`.
    pub fn resolve(source: &impl ParameterSource) -> Result<Self, ConfigError> {
        let port = required(source, KEY_MYSQL_PORT)?;
        let mysql_port = port.parse::<u16>().map_err(|e| ConfigError::Invalid {
            key: KEY_MYSQL_PORT,
            reason: e.to_string(),
        })?;

        let download_url = required(source, KEY_DOWNLOAD_URL)?;
        if !(download_url.starts_with("http://") || download_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: KEY_DOWNLOAD_URL,
                reason: "must be an http(s) URL".to_string(),
            });
        }

        Ok(Self {
            mysql_user: required(source, KEY_MYSQL_USER)?,
            mysql_pass: required(source, KEY_MYSQL_PASS)?,
            mysql_host: required(source, KEY_MYSQL_HOST)?,
            mysql_port,
            mysql_db: required(source, KEY_MYSQL_DB)?,
            table: TableName::new(&required(source, KEY_MYSQL_TABLE)?)?,
            download_url,
            feed_timeout: seconds(source, KEY_FEED_TIMEOUT, DEFAULT_FEED_TIMEOUT_SECS)?,
            connect_timeout: seconds(source, KEY_CONNECT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT_SECS)?,
        })
    }

    /// Resolve from the process environment after loading `.env` files.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::resolve(&EnvParameters)
    }

    /// Data source for logs, password masked.
    pub fn redacted_dsn(&self) -> String {
        format!(
            "mysql://{}:***@{}:{}/{}",
            self.mysql_user, self.mysql_host, self.mysql_port, self.mysql_db
        )
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("dsn", &self.redacted_dsn())
            .field("table", &self.table)
            .field("download_url", &self.download_url)
            .field("feed_timeout", &self.feed_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

fn required(source: &impl ParameterSource, key: &'static str) -> Result<String, ConfigError> {
    let value = source.get(key).ok_or(ConfigError::Missing { key })?;
    if value.is_empty() {
        return Err(ConfigError::Empty { key });
    }
    debug!(key, "resolved parameter");
    Ok(value)
}

fn seconds(
    source: &impl ParameterSource,
    key: &'static str,
    default: u64,
) -> Result<Duration, ConfigError> {
    match source.get(key) {
        None => Ok(Duration::from_secs(default)),
        Some(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }),
    }
}
