//! Trade query service boundary.
//!
//! Responsibilities:
//! • Describe what the live chart asks the service for (`TradeQuery`).
//! • Decode the service's swap rows (`RawTrade`).
//! • Normalize rows into immutable `TradeRecord`s.

use crate::errors::{AppError, Result};
use crate::models::{Amounts, TradeRecord};
use crate::utils::{parse_amount, parse_timestamp};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

pub mod graphql;

pub use graphql::GraphQlTradeSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeOrder {
    Ascending,
    Descending,
}

impl TradeOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// Filter for one fetch against the query service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeQuery {
    pub pair_id: String,
    /// Only trades created at or after this service-formatted timestamp.
    ///
    /// Inclusive so a page cut inside a run of equal timestamps is picked up
    /// again on the next poll; rows already folded are recognised by the caller.
    pub created_since: Option<String>,
    pub order: TradeOrder,
    pub limit: u32,
}

impl TradeQuery {
    /// Newest `limit` trades for the pair; used for the initial full load.
    pub fn latest(pair_id: &str, limit: u32) -> Self {
        Self {
            pair_id: pair_id.to_string(),
            created_since: None,
            order: TradeOrder::Descending,
            limit,
        }
    }

    /// Trades at or after the watermark, oldest first.
    pub fn since(pair_id: &str, watermark: &str, limit: u32) -> Self {
        Self {
            pair_id: pair_id.to_string(),
            created_since: Some(watermark.to_string()),
            order: TradeOrder::Ascending,
            limit,
        }
    }
}

/// Source of swap rows for a pair.
#[async_trait]
pub trait TradeSource: Send + Sync {
    async fn fetch_trades(&self, query: &TradeQuery) -> Result<Vec<RawTrade>>;
}

/// Amount as the service sends it: usually a numeric string, sometimes a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Text(String),
    Number(serde_json::Number),
}

impl RawAmount {
    fn value(amount: Option<&RawAmount>) -> f64 {
        match amount {
            Some(RawAmount::Text(text)) => parse_amount(Some(text.as_str())),
            Some(RawAmount::Number(number)) => parse_amount(Some(number.to_string().as_str())),
            None => 0.0,
        }
    }
}

/// Swap row as returned by the query service.
///
/// Every field may be absent or `null`; a bad row must not fail the whole page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTrade {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub pair_id: Option<String>,
    #[serde(default)]
    pub signer: Option<String>,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub amount0_in: Option<RawAmount>,
    #[serde(default)]
    pub amount0_out: Option<RawAmount>,
    #[serde(default)]
    pub amount1_in: Option<RawAmount>,
    #[serde(default)]
    pub amount1_out: Option<RawAmount>,
}

impl TryFrom<RawTrade> for TradeRecord {
    type Error = AppError;

    fn try_from(value: RawTrade) -> std::result::Result<Self, Self::Error> {
        let created_at = value.created_at.ok_or(AppError::MissingField("created_at"))?;
        let timestamp = parse_timestamp(&created_at)?;
        let amounts = Amounts {
            amount0_in: RawAmount::value(value.amount0_in.as_ref()),
            amount0_out: RawAmount::value(value.amount0_out.as_ref()),
            amount1_in: RawAmount::value(value.amount1_in.as_ref()),
            amount1_out: RawAmount::value(value.amount1_out.as_ref()),
        };
        Ok(TradeRecord::new(
            value.id.unwrap_or_default(),
            value.pair_id.unwrap_or_default(),
            created_at,
            timestamp,
            amounts,
        )
        .with_identity(value.signer, value.tx_hash))
    }
}

/// Convert service rows into records sorted oldest first.
///
/// Rows without a readable timestamp cannot be placed on the timeline and are
/// dropped with a warning. Equal timestamps are ordered by id.
pub fn normalize_trades(raw: Vec<RawTrade>) -> Vec<TradeRecord> {
    let mut trades: Vec<TradeRecord> = raw
        .into_iter()
        .filter_map(|row| {
            let id = row.id.clone().unwrap_or_default();
            match TradeRecord::try_from(row) {
                Ok(trade) => Some(trade),
                Err(e) => {
                    warn!(id = %id, error = %e, "[FETCH] dropping unreadable trade");
                    None
                }
            }
        })
        .collect();
    trades.sort_by(|a, b| a.timeline_key().cmp(&b.timeline_key()));
    trades
}
