//! Process configuration for the relay.
//!
//! Read once from the environment at startup and passed by reference to the
//! components that need it. Nothing here is mutated afterwards.

use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the messaging API token.
pub const ENV_BOT_TOKEN: &str = "BOT_TOKEN";
/// Environment variable holding the recipient chat id.
pub const ENV_CHAT_ID: &str = "CHAT_ID";
pub const ENV_BIND: &str = "RR_BIND";
pub const ENV_PORT: &str = "PORT";
pub const ENV_API_BASE: &str = "RR_API_BASE";
pub const ENV_TIMEOUT_SECS: &str = "RR_TIMEOUT_SECS";
pub const ENV_WORKERS: &str = "RR_WORKERS";
pub const ENV_MAX_BODY_BYTES: &str = "RR_MAX_BODY_BYTES";

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Configuration errors. Fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Relay configuration.
#[derive(Clone)]
pub struct RelayConfig {
    /// Messaging API token. Never logged.
    pub bot_token: String,
    /// Fixed recipient.
    pub chat_id: String,
    pub bind: String,
    pub port: u16,
    /// Messaging API base URL, without trailing slash.
    pub api_base: String,
    /// Timeout for one delivery attempt.
    pub timeout: Duration,
    /// HTTP worker threads.
    pub workers: usize,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("bot_token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .field("bind", &self.bind)
            .field("port", &self.port)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .field("workers", &self.workers)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

impl RelayConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let api_base = get(ENV_API_BASE).unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: ENV_API_BASE,
                reason: "expected an http:// or https:// URL".to_string(),
            });
        }

        let config = Self {
            bot_token: required(ENV_BOT_TOKEN)?,
            chat_id: required(ENV_CHAT_ID)?,
            bind: get(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port: parse_or(get(ENV_PORT), ENV_PORT, DEFAULT_PORT)?,
            api_base: api_base.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(parse_or(
                get(ENV_TIMEOUT_SECS),
                ENV_TIMEOUT_SECS,
                DEFAULT_TIMEOUT_SECS,
            )?),
            workers: parse_or(get(ENV_WORKERS), ENV_WORKERS, DEFAULT_WORKERS)?,
            max_body_bytes: parse_or(
                get(ENV_MAX_BODY_BYTES),
                ENV_MAX_BODY_BYTES,
                DEFAULT_MAX_BODY_BYTES,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid {
                key: ENV_WORKERS,
                reason: "must be at least 1".to_string(),
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: ENV_TIMEOUT_SECS,
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid {
                key: ENV_MAX_BODY_BYTES,
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// `bind:port`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    value: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: format!("'{}': {}", raw, e),
        }),
    }
}
