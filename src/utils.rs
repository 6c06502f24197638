//! Miscellaneous helper utilities.

use crate::errors::{AppError, Result};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDateTime, Utc};
use num_traits::ToPrimitive;
use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt};

/// Layout the query service uses for `created_at` (no zone offset, UTC implied).
pub const SERVICE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Initialize `tracing` subscriber with env-based filter.
///
/// If `RUST_LOG` is not set, defaults to `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Parse a decimal transfer amount.
///
/// Missing, unparsable, negative or non-finite values all collapse to `0.0`.
pub fn parse_amount(raw: Option<&str>) -> f64 {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return 0.0;
    };
    BigDecimal::from_str(raw)
        .ok()
        .and_then(|value| value.to_f64())
        .filter(|value| value.is_finite() && *value > 0.0)
        .unwrap_or(0.0)
}

/// Parse a query-service timestamp as UTC.
///
/// Naive timestamps (`2024-01-01T00:05:00.123456`) are treated as UTC. An
/// explicit `Z` or offset is honoured when present.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(with_offset.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|source| AppError::Timestamp {
            raw: raw.to_string(),
            source,
        })
}

/// Render an instant the way the query service expects it in filters.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(SERVICE_TIMESTAMP_FORMAT).to_string()
}
