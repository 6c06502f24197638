//! Live chart maintenance.
//!
//! Responsibilities:
//! • Own the known trade set and watermark for the active selection.
//! • Poll for trades newer than the watermark and rebuild the full series.
//! • Drive polling on a timer, dropping ticks while a refresh is in flight.

pub mod chart;
pub mod cursor;
pub mod watcher;

#[cfg(test)]
pub(crate) mod stub;

pub use chart::{LiveChart, RefreshOutcome, Selection};
pub use cursor::AggregationCursor;
pub use watcher::{refresh_and_publish, spawn_live_watcher, try_refresh};
