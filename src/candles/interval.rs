use crate::errors::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported candle widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "10m")]
    M10,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Interval {
    pub const ALL: [Interval; 7] = [
        Self::M5,
        Self::M10,
        Self::M15,
        Self::M30,
        Self::H1,
        Self::H4,
        Self::D1,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::M5 => "5m",
            Self::M10 => "10m",
            Self::M15 => "15m",
            Self::M30 => "30m",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::D1 => "1d",
        }
    }

    pub fn minutes(self) -> u32 {
        match self {
            Self::M5 => 5,
            Self::M10 => 10,
            Self::M15 => 15,
            Self::M30 => 30,
            Self::H1 => 60,
            Self::H4 => 240,
            Self::D1 => 1_440,
        }
    }

    pub fn duration_ms(self) -> i64 {
        i64::from(self.minutes()) * 60_000
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.minutes() == minutes)
    }
}

impl FromStr for Interval {
    type Err = AppError;

    /// Accepts either a minute count (`"60"`) or a label (`"1h"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let by_minutes = s.parse::<u32>().ok().and_then(Self::from_minutes);
        by_minutes
            .or_else(|| Self::ALL.into_iter().find(|i| i.as_str().eq_ignore_ascii_case(s)))
            .ok_or_else(|| AppError::Config(format!("unsupported interval '{s}'")))
    }
}

/// Start of the UTC-epoch-aligned bucket containing `timestamp`, in milliseconds.
pub fn bucket_key(timestamp: DateTime<Utc>, interval: Interval) -> i64 {
    let width = interval.duration_ms();
    timestamp.timestamp_millis().div_euclid(width) * width
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn buckets_align_to_epoch() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 47, 59).unwrap();
        let key = bucket_key(ts, Interval::M15);
        assert_eq!(key, Utc.with_ymd_and_hms(2024, 1, 1, 0, 45, 0).unwrap().timestamp_millis());
    }

    #[test]
    fn bucket_boundary_is_inclusive_start() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 4, 0, 0).unwrap();
        assert_eq!(bucket_key(ts, Interval::H4), ts.timestamp_millis());
    }

    #[test]
    fn daily_buckets_start_at_utc_midnight() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap();
        let key = bucket_key(ts, Interval::D1);
        assert_eq!(key, Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap().timestamp_millis());
    }

    #[test]
    fn pre_epoch_timestamps_floor_downwards() {
        let ts = Utc.timestamp_millis_opt(-1).unwrap();
        assert_eq!(bucket_key(ts, Interval::M5), -300_000);
    }

    #[test]
    fn parses_minutes_and_labels() {
        assert_eq!("60".parse::<Interval>().unwrap(), Interval::H1);
        assert_eq!("1440".parse::<Interval>().unwrap(), Interval::D1);
        assert_eq!("10m".parse::<Interval>().unwrap(), Interval::M10);
        assert_eq!("4H".parse::<Interval>().unwrap(), Interval::H4);
        assert!("7".parse::<Interval>().is_err());
        assert!("1w".parse::<Interval>().is_err());
    }

    #[test]
    fn supports_full_interval_set() {
        let minutes: Vec<u32> = Interval::ALL.iter().map(|i| i.minutes()).collect();
        assert_eq!(minutes, vec![5, 10, 15, 30, 60, 240, 1_440]);
    }
}
