//! Configuration loader and application settings.

use crate::candles::Interval;
use crate::errors::{AppError, Result};
use std::time::Duration;
use url::Url;

pub const DEFAULT_INTERVAL: Interval = Interval::H1;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_HISTORY_LIMIT: u32 = 1_000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_GRACE_WINDOW_SECS: u64 = 5;

/// Consolidated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// GraphQL endpoint of the swap query service.
    pub graphql_url: Url,
    /// Pair identifier as known by the query service.
    pub pair_id: String,
    /// Candle width.
    pub interval: Interval,
    /// Display quote-per-base (false) or base-per-quote (true).
    pub inverted: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let graphql_url = lookup("GRAPHQL_URL")
            .ok_or_else(|| AppError::Config("Set GRAPHQL_URL to the trade query endpoint".into()))?;
        let graphql_url = Url::parse(graphql_url.trim())?;

        let pair_id = lookup("PAIR_ID")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::Config("Set PAIR_ID to the pair to chart".into()))?;

        let interval = match lookup("INTERVAL") {
            Some(raw) => raw.parse()?,
            None => DEFAULT_INTERVAL,
        };

        let inverted = match lookup("INVERTED") {
            Some(raw) => parse_flag(&raw)?,
            None => false,
        };

        Ok(Self {
            graphql_url,
            pair_id,
            interval,
            inverted,
        })
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => Err(AppError::Config(format!("INVERTED must be a boolean, got '{other}'"))),
    }
}

/// Polling configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub poll_interval: Duration,
    pub history_limit: u32,
    pub request_timeout: Duration,
    /// Look-back applied to the first poll when the initial load found no trades.
    pub grace_window: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            history_limit: DEFAULT_HISTORY_LIMIT,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            grace_window: Duration::from_secs(DEFAULT_GRACE_WINDOW_SECS),
        }
    }
}

/// Load polling configuration from environment variables
pub fn load_poll_config() -> PollConfig {
    poll_config_from_lookup(|key| std::env::var(key).ok())
}

pub fn poll_config_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PollConfig {
    let secs = |key: &str, default: u64| {
        lookup(key)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(default)
    };

    let history_limit = lookup("HISTORY_LIMIT")
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_HISTORY_LIMIT);

    PollConfig {
        poll_interval: Duration::from_secs(secs("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)),
        history_limit,
        request_timeout: Duration::from_secs(secs(
            "REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )),
        grace_window: Duration::from_secs(secs("GRACE_WINDOW_SECS", DEFAULT_GRACE_WINDOW_SECS)),
    }
}
