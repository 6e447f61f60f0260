// ABOUTME: Server configuration loaded from environment variables
// ABOUTME: Parses and validates every setting with defaults for local development

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::num::ParseIntError;
use std::str::FromStr;
use std::time::Duration;

use tasklane_imports::ImportSettings;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://tasklane.db";
pub const DEFAULT_WEBHOOK_URL: &str = "http://localhost:9000";
pub const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost,http://localhost:8080,http://127.0.0.1,http://127.0.0.1:8080";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid host address: {0}")]
    InvalidHost(String),
    #[error("Invalid value for {key}: {value}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    #[error("Invalid log format: {0} (expected json or pretty)")]
    InvalidLogFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(ConfigError::InvalidLogFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub webhook_url: String,
    pub webhook_timeout: Duration,
    pub import_max_bytes: u64,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub log_format: LogFormat,
    pub shutdown_grace: Duration,
}

impl Config {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = get("PORT", &DEFAULT_PORT.to_string()).trim().parse::<u16>()?;
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let host_str = get("HOST", DEFAULT_HOST);
        let host = host_str
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidHost(host_str.clone()))?;

        let database_max_connections: u32 =
            positive("DATABASE_MAX_CONNECTIONS", &get("DATABASE_MAX_CONNECTIONS", "10"))?;
        let webhook_timeout_secs: u64 =
            positive("WEBHOOK_TIMEOUT_SECS", &get("WEBHOOK_TIMEOUT_SECS", "10"))?;
        let import_max_bytes: u64 = positive(
            "IMPORT_MAX_BYTES",
            &get("IMPORT_MAX_BYTES", &ImportSettings::default().max_bytes.to_string()),
        )?;
        let shutdown_grace_secs: u64 = number("SHUTDOWN_GRACE_SECS", &get("SHUTDOWN_GRACE_SECS", "30"))?;

        let cors_origins = get("CORS_ORIGINS", DEFAULT_CORS_ORIGINS)
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Config {
            host,
            port,
            database_url: get("DATABASE_URL", DEFAULT_DATABASE_URL),
            database_max_connections,
            webhook_url: get("WEBHOOK_URL", DEFAULT_WEBHOOK_URL),
            webhook_timeout: Duration::from_secs(webhook_timeout_secs),
            import_max_bytes,
            cors_origins,
            log_level: get("LOG_LEVEL", "info"),
            log_format: get("LOG_FORMAT", "json").parse()?,
            shutdown_grace: Duration::from_secs(shutdown_grace_secs),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn import_settings(&self) -> ImportSettings {
        ImportSettings {
            max_bytes: self.import_max_bytes,
            ..ImportSettings::default()
        }
    }
}

fn number<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: value.to_string(),
    })
}

fn positive<T: FromStr + Default + PartialEq>(
    key: &'static str,
    value: &str,
) -> Result<T, ConfigError> {
    let parsed: T = number(key, value)?;
    if parsed == T::default() {
        return Err(ConfigError::NotPositive(key));
    }
    Ok(parsed)
}
