//! Startup configuration read from the environment.
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

pub const API_URL_VAR: &str = "OKAN_API_URL";
pub const API_KEY_VAR: &str = "OKAN_API_KEY";
pub const BIND_ADDR_VAR: &str = "OKAN_BIND_ADDR";
pub const CACHE_TTL_VAR: &str = "OKAN_CACHE_TTL_SECS";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the hosted data API project
    pub api_url: String,
    /// Public (anon) key of the project
    pub api_key: String,
    pub bind_addr: SocketAddr,
    /// How long query and session results stay fresh
    pub cache_ttl: Duration,
}

impl AppConfig {
    /// Reads the configuration from the process environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |var: &'static str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let api_url = required(API_URL_VAR)?;
        url::Url::parse(&api_url).map_err(|e| ConfigError::Invalid {
            var: API_URL_VAR,
            message: e.to_string(),
        })?;
        let api_key = required(API_KEY_VAR)?;

        let bind_addr = lookup(BIND_ADDR_VAR)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: BIND_ADDR_VAR,
                message: e.to_string(),
            })?;

        let cache_ttl = match lookup(CACHE_TTL_VAR) {
            Some(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    var: CACHE_TTL_VAR,
                    message: e.to_string(),
                }
            })?,
            None => DEFAULT_CACHE_TTL_SECS,
        };

        Ok(Self {
            api_url,
            api_key,
            bind_addr,
            cache_ttl: Duration::from_secs(cache_ttl),
        })
    }
}
