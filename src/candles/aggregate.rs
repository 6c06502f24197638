//! Trade-to-candle aggregation.
//!
//! Turns an irregular trade set into a gap-free candle/volume series running
//! from the first priced trade's bucket up to the bucket containing `now`.

use super::interval::{Interval, bucket_key};
use super::price::price_point;
use crate::models::{Candle, CandleSeries, PricePoint, TradeRecord, VolumeBar};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Aggregate `trades` into one candle and one volume bar per interval bucket.
///
/// Pure and deterministic: the same arguments always produce the same series.
/// Inverted series are computed from inverted price points directly, so the
/// open/close carry-forward chain is built in the displayed orientation.
pub fn aggregate(
    trades: &[TradeRecord],
    interval: Interval,
    inverted: bool,
    now: DateTime<Utc>,
) -> CandleSeries {
    let mut points: Vec<(PricePoint, f64, &str)> = Vec::with_capacity(trades.len());
    let mut skipped = 0usize;
    for trade in trades {
        match price_point(trade, inverted) {
            Some(point) => points.push((point, trade.quote_volume(), trade.id())),
            None => {
                skipped += 1;
                debug!(
                    id = trade.id(),
                    amount0_in = trade.amount0_in(),
                    amount0_out = trade.amount0_out(),
                    amount1_in = trade.amount1_in(),
                    amount1_out = trade.amount1_out(),
                    "[AGG] trade has no derivable price"
                );
            }
        }
    }
    if skipped > 0 {
        warn!(skipped, total = trades.len(), "[AGG] excluded malformed trades");
    }

    let mut series = CandleSeries::empty(interval, inverted);
    series.skipped = skipped;
    if points.is_empty() {
        return series;
    }

    // ties on timestamp go by id; equal keys keep their input order
    points.sort_by(|(a, _, a_id), (b, _, b_id)| {
        (a.timestamp, *a_id).cmp(&(b.timestamp, *b_id))
    });

    let width = interval.duration_ms();
    let first_bucket = bucket_key(points[0].0.timestamp, interval);
    let newest_bucket = bucket_key(points[points.len() - 1].0.timestamp, interval);
    let last_bucket = bucket_key(now, interval).max(newest_bucket);
    let bucket_count = ((last_bucket - first_bucket) / width + 1) as usize;
    series.candles.reserve(bucket_count);
    series.volumes.reserve(bucket_count);

    let mut previous_close: Option<f64> = None;
    let mut cursor = 0usize;
    let mut bucket = first_bucket;
    while bucket <= last_bucket {
        let start = cursor;
        while cursor < points.len() && bucket_key(points[cursor].0.timestamp, interval) == bucket {
            cursor += 1;
        }
        let in_bucket = &points[start..cursor];

        let (candle, volume) = match (in_bucket.first(), in_bucket.last()) {
            (Some(first), Some(last)) => {
                let open = previous_close.unwrap_or(first.0.price);
                let (high, low) = in_bucket
                    .iter()
                    .fold((open, open), |(high, low), (point, _, _)| {
                        (high.max(point.price), low.min(point.price))
                    });
                let volume: f64 = in_bucket.iter().map(|(_, quote, _)| quote).sum();
                let candle = Candle {
                    bucket_start: bucket,
                    open,
                    high,
                    low,
                    close: last.0.price,
                    trade_count: in_bucket.len(),
                };
                (candle, volume)
            }
            _ => match previous_close {
                Some(close) => (Candle::flat(bucket, close), 0.0),
                None => {
                    // no price to open from yet
                    bucket += width;
                    continue;
                }
            },
        };

        previous_close = Some(candle.close);
        series.volumes.push(VolumeBar::for_candle(&candle, volume));
        series.candles.push(candle);
        bucket += width;
    }

    series
}
