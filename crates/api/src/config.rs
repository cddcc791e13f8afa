//! Process configuration read from the environment (and an optional `.env` file).
//!
//! | variable                   | default        |
//! |----------------------------|----------------|
//! | `BIND_ADDR`                | `0.0.0.0:8080` |
//! | `DATABASE_URL`             | unset: in-memory store |
//! | `DATABASE_MAX_CONNECTIONS` | `5`            |
//! | `LOG_FORMAT`               | `json`         |
//!
//! `RUST_LOG` is read by the tracing subscriber directly.

use std::net::SocketAddr;

use thiserror::Error;

use partyhub_observability::{LogFormat, TracingConfig};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Postgres connection string; `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load `.env` (if present), then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_addr = value("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "BIND_ADDR",
                message: e.to_string(),
            })?;

        let database_max_connections = match value("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    name: "DATABASE_MAX_CONNECTIONS",
                    message: format!("expected a positive integer, got {raw:?}"),
                })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let log_format = match value("LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>().map_err(|message| ConfigError::Invalid {
                name: "LOG_FORMAT",
                message,
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            database_url: value("DATABASE_URL"),
            database_max_connections,
            log_format,
        })
    }

    pub fn tracing(&self) -> TracingConfig {
        TracingConfig {
            format: self.log_format,
            ..TracingConfig::default()
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            log_format: LogFormat::default(),
        }
    }
}
