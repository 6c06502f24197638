use super::{RawTrade, TradeOrder, TradeQuery, TradeSource};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

const SWAP_FIELDS: &str =
    "id pair_id signer tx_hash created_at amount0_in amount0_out amount1_in amount1_out";

/// GraphQL client for the swap query service.
#[derive(Clone)]
pub struct GraphQlTradeSource {
    endpoint: Url,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: String,
    variables: Variables<'a>,
}

#[derive(Debug, Serialize)]
struct Variables<'a> {
    pair: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    since: Option<&'a str>,
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<SwapsData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct SwapsData {
    #[serde(default)]
    swaps: Vec<RawTrade>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl GraphQlTradeSource {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { endpoint, client })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Build the query document; the `created_at` filter is only present when polling.
fn build_query(query: &TradeQuery) -> String {
    let (since_var, since_filter) = if query.created_since.is_some() {
        (", $since: timestamp!", ", created_at: {_gte: $since}")
    } else {
        ("", "")
    };
    format!(
        "query Swaps($pair: String!{since_var}, $limit: Int!) {{ \
         swaps(where: {{pair_id: {{_eq: $pair}}{since_filter}}}, \
         order_by: {{created_at: {order}}}, limit: $limit) {{ {SWAP_FIELDS} }} }}",
        order = query.order.as_str(),
    )
}

fn request_body(query: &TradeQuery) -> GraphQlRequest<'_> {
    GraphQlRequest {
        query: build_query(query),
        variables: Variables {
            pair: &query.pair_id,
            since: query.created_since.as_deref(),
            limit: query.limit,
        },
    }
}

fn into_trades(response: GraphQlResponse) -> Result<Vec<RawTrade>> {
    if !response.errors.is_empty() {
        let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
        return Err(AppError::Query(messages.join("; ")));
    }
    response
        .data
        .map(|data| data.swaps)
        .ok_or_else(|| AppError::Query("response carried neither data nor errors".to_string()))
}

#[async_trait]
impl TradeSource for GraphQlTradeSource {
    async fn fetch_trades(&self, query: &TradeQuery) -> Result<Vec<RawTrade>> {
        let body = request_body(query);
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Query(format!("status {status}: {text}")));
        }

        let parsed: GraphQlResponse = response.json().await?;
        let trades = into_trades(parsed)?;
        debug!(
            pair = %query.pair_id,
            since = ?query.created_since,
            descending = query.order == TradeOrder::Descending,
            rows = trades.len(),
            "[FETCH] swaps received"
        );
        Ok(trades)
    }
}
