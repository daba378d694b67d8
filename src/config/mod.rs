//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable lines
    Pretty,
    /// One JSON object per line
    Json,
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Game stream binding address
    pub server_addr: SocketAddr,
    /// Optional admin HTTP binding address
    pub admin_addr: Option<SocketAddr>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,

    /// Period between coin relocations
    pub coin_interval: Duration,
    /// Longest inbound line accepted on a connection, in bytes
    pub read_buffer_size: usize,
    /// Delete a connection's player when the connection closes
    pub remove_player_on_disconnect: bool,
    /// Seed for coin placement, random when unset
    pub world_seed: Option<u64>,
    /// Read operator commands from stdin
    pub console_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // PORT wins over SERVER_ADDR so hosted deployments can inject it
        let server_addr = if let Some(port) = lookup("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string())
        };

        let admin_addr = match lookup("ADMIN_ADDR") {
            Some(addr) => Some(
                addr.parse()
                    .map_err(|_| ConfigError::InvalidAddress("ADMIN_ADDR"))?,
            ),
            None => None,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(_) => return Err(ConfigError::Invalid("LOG_FORMAT")),
        };

        let coin_interval_secs: u64 = parse_or(&lookup, "COIN_INTERVAL_SECS", 5)?;
        if coin_interval_secs == 0 {
            return Err(ConfigError::Invalid("COIN_INTERVAL_SECS"));
        }

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress("SERVER_ADDR"))?,
            admin_addr,

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format,

            coin_interval: Duration::from_secs(coin_interval_secs),
            read_buffer_size: parse_or(&lookup, "READ_BUFFER_SIZE", 2048)?,
            remove_player_on_disconnect: parse_or(&lookup, "REMOVE_PLAYER_ON_DISCONNECT", false)?,
            world_seed: match lookup("WORLD_SEED") {
                Some(raw) => Some(raw.parse().map_err(|_| ConfigError::Invalid("WORLD_SEED"))?),
                None => None,
            },
            console_enabled: parse_or(&lookup, "CONSOLE_ENABLED", true)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid address format in {0}")]
    InvalidAddress(&'static str),
}
