use anyhow::Result;
use chrono::Utc;
use dex_candles::{
    config::{AppConfig, load_poll_config},
    live::{LiveChart, RefreshOutcome, Selection, spawn_live_watcher},
    models::CandleSeries,
    source::{GraphQlTradeSource, TradeSource},
    utils,
};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    let config = AppConfig::load()?;
    let poll = load_poll_config();

    tracing::info!(
        pair = %config.pair_id,
        interval = config.interval.as_str(),
        inverted = config.inverted,
        endpoint = %config.graphql_url,
        poll_secs = poll.poll_interval.as_secs(),
        "[INIT] dex-candles starting"
    );

    let source: Arc<dyn TradeSource> = Arc::new(GraphQlTradeSource::new(
        config.graphql_url.clone(),
        poll.request_timeout,
    )?);

    let selection = Selection {
        pair_id: config.pair_id.clone(),
        interval: config.interval,
        inverted: config.inverted,
    };
    let mut chart = LiveChart::new(selection, &poll);
    // the watcher's first refresh loads again while the cursor is unset
    match chart.load(source.as_ref(), Utc::now()).await {
        Ok(RefreshOutcome::NoData) => {
            tracing::info!("[INIT] no priced trades for this pair yet, waiting for activity")
        }
        Ok(outcome) => tracing::info!(?outcome, "[INIT] initial load done"),
        Err(e) => tracing::warn!(error = %e, "[INIT] initial load failed, retrying on next tick"),
    }

    // Publish channel for the renderer; the logger below stands in for it
    let (publish, mut series_rx) = watch::channel(chart.series());
    let (_visible_tx, visible_rx) = watch::channel(true);
    let chart = Arc::new(Mutex::new(chart));

    let watcher = spawn_live_watcher(
        Arc::clone(&chart),
        Arc::clone(&source),
        poll.poll_interval,
        visible_rx,
        publish,
    );
    tracing::info!("[INIT] live watcher started");

    log_series(&series_rx.borrow_and_update());
    let logger = tokio::spawn(async move {
        while series_rx.changed().await.is_ok() {
            let series = Arc::clone(&series_rx.borrow_and_update());
            log_series(&series);
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("[SHUTDOWN] stopping live watcher");
    watcher.abort();
    logger.abort();
    let _ = futures::join!(watcher, logger);
    Ok(())
}

fn log_series(series: &CandleSeries) {
    let (Some(candle), Some(volume)) = (series.candles.last(), series.volumes.last()) else {
        tracing::info!(skipped = series.skipped, "[SERIES] no data for selection");
        return;
    };
    tracing::info!(
        candles = series.candles.len(),
        interval = series.interval.as_str(),
        inverted = series.inverted,
        time = candle.bucket_start / 1_000,
        open = candle.open,
        high = candle.high,
        low = candle.low,
        close = candle.close,
        trades = candle.trade_count,
        volume = volume.value,
        skipped = series.skipped,
        "[SERIES] published"
    );
    let (candles, volumes) = series.to_chart();
    match serde_json::to_string(&serde_json::json!({ "candles": candles, "volumes": volumes })) {
        Ok(payload) => tracing::debug!(%payload, "[SERIES] chart payload"),
        Err(e) => tracing::warn!(error = %e, "[SERIES] chart payload serialization failed"),
    }
}
