//! Shared data structures used throughout the application.

use crate::candles::Interval;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Direction of a trade relative to the displayed pair orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
    Unknown,
}

/// Canonical, immutable swap record as delivered by the query service.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    id: String,
    pair_id: String,
    signer: Option<String>,
    tx_hash: Option<String>,
    /// Timestamp exactly as the service rendered it; the cursor reuses it verbatim.
    raw_timestamp: String,
    timestamp: DateTime<Utc>,
    amount0_in: f64,
    amount0_out: f64,
    amount1_in: f64,
    amount1_out: f64,
}

/// The four transfer legs of a swap, token0 being the base asset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Amounts {
    pub amount0_in: f64,
    pub amount0_out: f64,
    pub amount1_in: f64,
    pub amount1_out: f64,
}

impl TradeRecord {
    pub fn new(
        id: impl Into<String>,
        pair_id: impl Into<String>,
        raw_timestamp: impl Into<String>,
        timestamp: DateTime<Utc>,
        amounts: Amounts,
    ) -> Self {
        let sanitize = |value: f64| if value.is_finite() && value > 0.0 { value } else { 0.0 };
        Self {
            id: id.into(),
            pair_id: pair_id.into(),
            signer: None,
            tx_hash: None,
            raw_timestamp: raw_timestamp.into(),
            timestamp,
            amount0_in: sanitize(amounts.amount0_in),
            amount0_out: sanitize(amounts.amount0_out),
            amount1_in: sanitize(amounts.amount1_in),
            amount1_out: sanitize(amounts.amount1_out),
        }
    }

    pub fn with_identity(mut self, signer: Option<String>, tx_hash: Option<String>) -> Self {
        self.signer = signer;
        self.tx_hash = tx_hash;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pair_id(&self) -> &str {
        &self.pair_id
    }

    pub fn signer(&self) -> Option<&str> {
        self.signer.as_deref()
    }

    pub fn tx_hash(&self) -> Option<&str> {
        self.tx_hash.as_deref()
    }

    pub fn raw_timestamp(&self) -> &str {
        &self.raw_timestamp
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn amount0_in(&self) -> f64 {
        self.amount0_in
    }

    pub fn amount0_out(&self) -> f64 {
        self.amount0_out
    }

    pub fn amount1_in(&self) -> f64 {
        self.amount1_in
    }

    pub fn amount1_out(&self) -> f64 {
        self.amount1_out
    }

    /// Quote-asset quantity moved by this swap, independent of display orientation.
    pub fn quote_volume(&self) -> f64 {
        self.amount1_in + self.amount1_out
    }

    /// Base-asset quantity moved by this swap.
    pub fn base_volume(&self) -> f64 {
        self.amount0_in + self.amount0_out
    }

    /// Exactly one of the token0 legs must be positive.
    pub fn is_well_formed(&self) -> bool {
        (self.amount0_in > 0.0) != (self.amount0_out > 0.0)
    }

    /// Timeline order: timestamp, then id for trades sharing a timestamp.
    pub fn timeline_key(&self) -> (DateTime<Utc>, &str) {
        (self.timestamp, &self.id)
    }

    /// Identity used to recognise a row the service sends twice.
    ///
    /// Rows without an id fall back to their timestamp, transaction and legs.
    pub fn dedupe_key(&self) -> String {
        if !self.id.is_empty() {
            return self.id.clone();
        }
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.raw_timestamp,
            self.tx_hash.as_deref().unwrap_or_default(),
            self.amount0_in,
            self.amount0_out,
            self.amount1_in,
            self.amount1_out
        )
    }
}

/// Derived `(timestamp, price, side)` for a single trade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub side: Side,
}

/// One OHLC bucket. `bucket_start` is epoch milliseconds, interval aligned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub bucket_start: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub trade_count: usize,
}

impl Candle {
    /// Flat zero-activity candle carrying `price` forward.
    pub fn flat(bucket_start: i64, price: f64) -> Self {
        Self {
            bucket_start,
            open: price,
            high: price,
            low: price,
            close: price,
            trade_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeSide {
    Up,
    Down,
    Neutral,
}

/// Quote volume for the candle sharing the same `bucket_start`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeBar {
    pub bucket_start: i64,
    pub value: f64,
    pub side: VolumeSide,
}

impl VolumeBar {
    pub fn for_candle(candle: &Candle, value: f64) -> Self {
        let side = if value == 0.0 {
            VolumeSide::Neutral
        } else if candle.close >= candle.open {
            VolumeSide::Up
        } else {
            VolumeSide::Down
        };
        Self {
            bucket_start: candle.bucket_start,
            value,
            side,
        }
    }
}

/// Output of one aggregation run. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleSeries {
    pub interval: Interval,
    pub inverted: bool,
    pub candles: Vec<Candle>,
    pub volumes: Vec<VolumeBar>,
    /// Trades excluded because no price could be derived from them.
    pub skipped: usize,
}

impl CandleSeries {
    pub fn empty(interval: Interval, inverted: bool) -> Self {
        Self {
            interval,
            inverted,
            candles: Vec::new(),
            volumes: Vec::new(),
            skipped: 0,
        }
    }

    /// `true` when the selection has no priced trades at all.
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }

    /// Rendering-agnostic records keyed by epoch seconds.
    pub fn to_chart(&self) -> (Vec<ChartCandle>, Vec<ChartVolume>) {
        let candles = self
            .candles
            .iter()
            .map(|c| ChartCandle {
                time: c.bucket_start / 1_000,
                open: c.open,
                high: c.high,
                low: c.low,
                close: c.close,
            })
            .collect();
        let volumes = self
            .volumes
            .iter()
            .map(|v| ChartVolume {
                time: v.bucket_start / 1_000,
                value: v.value,
                side: v.side,
            })
            .collect();
        (candles, volumes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartCandle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartVolume {
    pub time: i64,
    pub value: f64,
    pub side: VolumeSide,
}

/// Row of the live trade feed, oriented like the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeView {
    pub timestamp: DateTime<Utc>,
    pub price: Option<f64>,
    pub side: Side,
    pub base_amount: f64,
    pub quote_amount: f64,
    pub signer: Option<String>,
    pub tx_hash: Option<String>,
}
