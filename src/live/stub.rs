//! In-memory trade source for tests.

use crate::errors::{AppError, Result};
use crate::source::{RawAmount, RawTrade, TradeQuery, TradeSource};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) fn raw(
    id: &str,
    created_at: &str,
    in0: f64,
    out0: f64,
    in1: f64,
    out1: f64,
) -> RawTrade {
    let amount = |v: f64| Some(RawAmount::Text(v.to_string()));
    RawTrade {
        id: Some(id.to_string()),
        pair_id: Some("pair-1".to_string()),
        signer: Some(format!("signer-{id}")),
        tx_hash: Some(format!("tx-{id}")),
        created_at: Some(created_at.to_string()),
        amount0_in: amount(in0),
        amount0_out: amount(out0),
        amount1_in: amount(in1),
        amount1_out: amount(out1),
    }
}

/// Replays queued responses in order; once drained every fetch returns no rows.
pub(crate) struct StubSource {
    responses: Mutex<VecDeque<std::result::Result<Vec<RawTrade>, &'static str>>>,
    queries: Mutex<Vec<TradeQuery>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl StubSource {
    pub(crate) fn new(responses: Vec<std::result::Result<Vec<RawTrade>, &'static str>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            queries: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn queries(&self) -> Vec<TradeQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TradeSource for StubSource {
    async fn fetch_trades(&self, query: &TradeQuery) -> Result<Vec<RawTrade>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(AppError::Query(message.to_string())),
            None => Ok(Vec::new()),
        }
    }
}
