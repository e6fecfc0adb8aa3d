//! Process configuration read from environment variables.
//!
//! - `BIND_ADDR` listen address (default `0.0.0.0:3000`)
//! - `SHARD_URLS` comma-separated SQLite URLs, in shard order
//! - `SHARD_MAX_CONNECTIONS` pool size per shard (default 5)
//! - `LOG_FORMAT` `text` or `json` (default `text`)
//!
//! The order of `SHARD_URLS` decides which shard owns which usernames.
//! Reordering or resizing it without migrating the data strands existing rows.

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_SHARD_URLS: &str = "sqlite::memory:,sqlite::memory:,sqlite::memory:";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SHARD_URLS must name at least one shard")]
    NoShards,

    #[error("SHARD_MAX_CONNECTIONS must be a positive integer, got '{0}'")]
    InvalidMaxConnections(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardConfig {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub shards: Vec<ShardConfig>,
    pub max_connections: u32,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let shard_urls = lookup("SHARD_URLS").unwrap_or_else(|| DEFAULT_SHARD_URLS.to_string());
        let shards = parse_shard_urls(&shard_urls)?;

        let max_connections = match lookup("SHARD_MAX_CONNECTIONS") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidMaxConnections(raw)),
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let log_format = lookup("LOG_FORMAT").unwrap_or_else(|| "text".to_string());

        Ok(Self {
            bind_addr,
            shards,
            max_connections,
            log_format,
        })
    }
}

/// Splits a comma-separated URL list into named shards `shard0..shardN-1`.
fn parse_shard_urls(raw: &str) -> Result<Vec<ShardConfig>, ConfigError> {
    let shards: Vec<ShardConfig> = raw
        .split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .enumerate()
        .map(|(i, url)| ShardConfig {
            name: format!("shard{i}"),
            url: url.to_string(),
        })
        .collect();

    if shards.is_empty() {
        return Err(ConfigError::NoShards);
    }

    Ok(shards)
}
