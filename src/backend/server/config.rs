/**
 * Server Configuration
 *
 * Settings are layered, later sources overriding earlier ones:
 *
 * 1. Built-in defaults
 * 2. A TOML file named by `THREADWATCH_CONFIG`, if set
 * 3. Environment variables (a `.env` file is loaded first)
 *
 * # Keys
 *
 * | key                           | environment variable          | default |
 * |-------------------------------|-------------------------------|---------|
 * | `port`                        | `SERVER_PORT`                 | 3000    |
 * | `capability_secret`           | `CAPABILITY_SECRET`           | none    |
 * | `capability_public_key`       | `CAPABILITY_PUBLIC_KEY`       | none    |
 * | `database_url`                | `DATABASE_URL`                | none    |
 * | `follow_retention_days`       | `FOLLOW_RETENTION_DAYS`       | 14      |
 * | `notification_retention_days` | `NOTIFICATION_RETENTION_DAYS` | 30      |
 * | `storage_timeout_ms`          | `STORAGE_TIMEOUT_MS`          | 5000    |
 * | `reap_interval_secs`          | `REAP_INTERVAL_SECS`          | 60      |
 *
 * One of the two capability keys must be set. Without `database_url` the
 * server keeps everything in memory.
 */

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::backend::auth::{JwtVerifier, TokenVerifier};
use crate::backend::error::BackendResult;
use crate::backend::events::notify::DEFAULT_NOTIFICATION_RETENTION_DAYS;
use crate::backend::events::reactor::DEFAULT_CLOSED_RETENTION_DAYS;

/// Environment variable naming an optional TOML config file
pub const CONFIG_PATH_VAR: &str = "THREADWATCH_CONFIG";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("missing value: {0}")]
    MissingValue(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// HS256 shared secret
    pub capability_secret: Option<String>,
    /// RS256 public key (PEM); preferred over the secret when both are set
    pub capability_public_key: Option<String>,
    pub database_url: Option<String>,
    pub follow_retention_days: i64,
    pub notification_retention_days: i64,
    pub storage_timeout_ms: u64,
    pub reap_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            capability_secret: None,
            capability_public_key: None,
            database_url: None,
            follow_retention_days: DEFAULT_CLOSED_RETENTION_DAYS,
            notification_retention_days: DEFAULT_NOTIFICATION_RETENTION_DAYS,
            storage_timeout_ms: 5000,
            reap_interval_secs: 60,
        }
    }
}

impl ServerConfig {
    /// Load defaults, then the optional file, then the environment
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file; keys it omits keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Override fields from `lookup`, which maps variable names to values
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("SERVER_PORT") {
            self.port = parse("SERVER_PORT", value)?;
        }
        if let Some(value) = lookup("CAPABILITY_SECRET") {
            self.capability_secret = Some(value);
        }
        if let Some(value) = lookup("CAPABILITY_PUBLIC_KEY") {
            self.capability_public_key = Some(value);
        }
        if let Some(value) = lookup("DATABASE_URL") {
            self.database_url = Some(value);
        }
        if let Some(value) = lookup("FOLLOW_RETENTION_DAYS") {
            self.follow_retention_days = parse("FOLLOW_RETENTION_DAYS", value)?;
        }
        if let Some(value) = lookup("NOTIFICATION_RETENTION_DAYS") {
            self.notification_retention_days = parse("NOTIFICATION_RETENTION_DAYS", value)?;
        }
        if let Some(value) = lookup("STORAGE_TIMEOUT_MS") {
            self.storage_timeout_ms = parse("STORAGE_TIMEOUT_MS", value)?;
        }
        if let Some(value) = lookup("REAP_INTERVAL_SECS") {
            self.reap_interval_secs = parse("REAP_INTERVAL_SECS", value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let has_key = |key: &Option<String>| key.as_deref().map(|k| !k.trim().is_empty()).unwrap_or(false);
        if !has_key(&self.capability_secret) && !has_key(&self.capability_public_key) {
            return Err(ConfigError::MissingValue("CAPABILITY_SECRET or CAPABILITY_PUBLIC_KEY"));
        }

        positive("FOLLOW_RETENTION_DAYS", self.follow_retention_days)?;
        positive("NOTIFICATION_RETENTION_DAYS", self.notification_retention_days)?;
        positive("STORAGE_TIMEOUT_MS", self.storage_timeout_ms as i64)?;
        positive("REAP_INTERVAL_SECS", self.reap_interval_secs as i64)?;
        Ok(())
    }

    /// Build the token verifier for the configured key
    pub fn verifier(&self) -> BackendResult<Arc<dyn TokenVerifier>> {
        if let Some(pem) = self.capability_public_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Ok(Arc::new(JwtVerifier::from_rsa_pem(pem.as_bytes())?));
        }
        match self.capability_secret.as_deref() {
            Some(secret) if !secret.trim().is_empty() => Ok(Arc::new(JwtVerifier::from_secret(secret.as_bytes()))),
            _ => Err(crate::backend::error::BackendError::not_configured(
                "no capability verification key configured",
            )),
        }
    }

    pub fn follow_retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.follow_retention_days)
    }

    pub fn notification_retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.notification_retention_days)
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs)
    }
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

fn positive(key: &'static str, value: i64) -> Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
    }
}
