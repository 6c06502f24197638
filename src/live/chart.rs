//! Live chart state for one (pair, interval, inversion) selection.

use super::cursor::AggregationCursor;
use crate::candles::{Interval, aggregate, trade_view};
use crate::config::PollConfig;
use crate::errors::Result;
use crate::models::{CandleSeries, TradeRecord, TradeView};
use crate::source::{TradeQuery, TradeSource, normalize_trades};
use crate::utils::format_timestamp;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// What the chart is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub pair_id: String,
    pub interval: Interval,
    pub inverted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Full load produced a non-empty series.
    Loaded { trades: usize },
    /// No trade for the selection has a derivable price.
    NoData,
    /// Poll returned nothing new; series and cursor untouched.
    Unchanged,
    /// New trades were merged and the series rebuilt.
    Updated { folded: usize },
    /// A refresh was already running.
    Skipped,
}

/// Known trades, cursor and last published series for a single selection.
///
/// Only `load`, `refresh` and `reselect` mutate it; the renderer sees the
/// immutable `Arc<CandleSeries>` produced by the latest aggregation.
pub struct LiveChart {
    selection: Selection,
    known: Vec<TradeRecord>,
    /// `TradeRecord::dedupe_key` of every known trade.
    seen: HashSet<String>,
    cursor: AggregationCursor,
    series: Arc<CandleSeries>,
    history_limit: u32,
    grace_window: Duration,
}

impl LiveChart {
    pub fn new(selection: Selection, poll: &PollConfig) -> Self {
        let series = Arc::new(CandleSeries::empty(selection.interval, selection.inverted));
        Self {
            selection,
            known: Vec::new(),
            seen: HashSet::new(),
            cursor: AggregationCursor::new(),
            series,
            history_limit: poll.history_limit,
            grace_window: poll.grace_window,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn cursor(&self) -> &AggregationCursor {
        &self.cursor
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.known
    }

    pub fn series(&self) -> Arc<CandleSeries> {
        Arc::clone(&self.series)
    }

    /// Switch selection, discarding every trade, the cursor and the series.
    /// The caller issues a fresh `load` afterwards.
    pub fn reselect(&mut self, selection: Selection) {
        info!(
            pair = %selection.pair_id,
            interval = selection.interval.as_str(),
            inverted = selection.inverted,
            "[LIVE] selection changed, discarding cached trades"
        );
        self.series = Arc::new(CandleSeries::empty(selection.interval, selection.inverted));
        self.selection = selection;
        self.known.clear();
        self.seen.clear();
        self.cursor.reset();
    }

    /// Full fetch and aggregation. On error nothing is modified.
    pub async fn load(
        &mut self,
        source: &dyn TradeSource,
        now: DateTime<Utc>,
    ) -> Result<RefreshOutcome> {
        let query = TradeQuery::latest(&self.selection.pair_id, self.history_limit);
        let mut seen = HashSet::new();
        let trades: Vec<TradeRecord> = normalize_trades(source.fetch_trades(&query).await?)
            .into_iter()
            .filter(|t| seen.insert(t.dedupe_key()))
            .collect();

        let series = aggregate(&trades, self.selection.interval, self.selection.inverted, now);

        self.cursor.reset();
        match trades.last() {
            Some(newest) => {
                self.cursor.advance(newest.raw_timestamp(), newest.timestamp());
            }
            None => {
                let grace = chrono::Duration::from_std(self.grace_window)
                    .unwrap_or_else(|_| chrono::Duration::zero());
                let floor = now - grace;
                self.cursor.advance(&format_timestamp(floor), floor);
            }
        }

        self.seen = seen;
        self.known = trades;
        self.series = Arc::new(series);

        info!(
            pair = %self.selection.pair_id,
            trades = self.known.len(),
            candles = self.series.candles.len(),
            watermark = self.cursor.watermark(),
            "[LIVE] full load complete"
        );

        if self.series.is_empty() {
            Ok(RefreshOutcome::NoData)
        } else {
            Ok(RefreshOutcome::Loaded {
                trades: self.known.len(),
            })
        }
    }

    /// Fold trades at or after the watermark and re-aggregate the full set.
    ///
    /// Rows already known are ignored, so re-reading the watermark's own
    /// timestamp only picks up trades a previous page cut off.
    ///
    /// Falls back to `load` when nothing has been loaded yet. A fetch error
    /// leaves trades, cursor and series exactly as they were.
    pub async fn refresh(
        &mut self,
        source: &dyn TradeSource,
        now: DateTime<Utc>,
    ) -> Result<RefreshOutcome> {
        let Some(watermark) = self.cursor.watermark().map(str::to_owned) else {
            return self.load(source, now).await;
        };
        let query = TradeQuery::since(&self.selection.pair_id, &watermark, self.history_limit);
        let mut incoming: Vec<TradeRecord> = Vec::new();
        for trade in normalize_trades(source.fetch_trades(&query).await?) {
            // also drops repeats within the page itself
            if self.seen.insert(trade.dedupe_key()) {
                incoming.push(trade);
            }
        }

        let Some(newest) = incoming.iter().max_by_key(|t| t.timestamp()).cloned() else {
            debug!(watermark = self.cursor.watermark(), "[LIVE] no new trades");
            return Ok(RefreshOutcome::Unchanged);
        };

        let folded = incoming.len();
        self.known.extend(incoming);
        self.known.sort_by(|a, b| a.timeline_key().cmp(&b.timeline_key()));

        let series = aggregate(&self.known, self.selection.interval, self.selection.inverted, now);
        self.series = Arc::new(series);
        self.cursor.advance(newest.raw_timestamp(), newest.timestamp());

        info!(
            folded,
            trades = self.known.len(),
            candles = self.series.candles.len(),
            watermark = self.cursor.watermark(),
            "[LIVE] merged new trades"
        );
        Ok(RefreshOutcome::Updated { folded })
    }

    /// Newest-first trade feed in the displayed orientation.
    pub fn trade_feed(&self, limit: usize) -> Vec<TradeView> {
        self.known
            .iter()
            .rev()
            .take(limit)
            .map(|t| trade_view(t, self.selection.inverted))
            .collect()
    }
}
