use super::chart::{LiveChart, RefreshOutcome};
use crate::models::CandleSeries;
use crate::source::TradeSource;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Spawn the periodic refresh loop for a loaded chart.
///
/// * Ticks every `period`, first one a full period after start.
/// * A tick that fires while a refresh still holds the chart is dropped.
/// * While `visible` is `false` no tick fires; on resume the period restarts.
/// * Every refresh that changes the series publishes it on `publish`.
///
/// The task stops when aborted or when the `visible` sender is dropped.
pub fn spawn_live_watcher(
    chart: Arc<Mutex<LiveChart>>,
    source: Arc<dyn TradeSource>,
    period: Duration,
    mut visible: watch::Receiver<bool>,
    publish: watch::Sender<Arc<CandleSeries>>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if !*visible.borrow_and_update() {
                info!("[LIVE] view inactive, pausing refresh");
                if visible.wait_for(|v| *v).await.is_err() {
                    return;
                }
                ticker.reset();
                info!("[LIVE] view active again, resuming refresh");
            }

            tokio::select! {
                _ = ticker.tick() => {}
                changed = visible.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    continue;
                }
            }

            let guard = match Arc::clone(&chart).try_lock_owned() {
                Ok(guard) => guard,
                Err(_) => {
                    debug!("[LIVE] refresh still in flight, dropping tick");
                    continue;
                }
            };
            tokio::spawn(refresh_and_publish(
                guard,
                Arc::clone(&source),
                publish.clone(),
            ));
        }
    })
}

/// Run one refresh while holding the chart, publishing the series on change.
pub async fn refresh_and_publish(
    mut chart: OwnedMutexGuard<LiveChart>,
    source: Arc<dyn TradeSource>,
    publish: watch::Sender<Arc<CandleSeries>>,
) -> RefreshOutcome {
    match chart.refresh(source.as_ref(), Utc::now()).await {
        Ok(outcome @ (RefreshOutcome::Updated { .. }
        | RefreshOutcome::Loaded { .. }
        | RefreshOutcome::NoData)) => {
            publish.send_replace(chart.series());
            outcome
        }
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, "[LIVE] refresh failed, keeping last series");
            RefreshOutcome::Unchanged
        }
    }
}

/// Refresh unless another refresh currently holds the chart.
pub async fn try_refresh(
    chart: &Arc<Mutex<LiveChart>>,
    source: Arc<dyn TradeSource>,
    publish: watch::Sender<Arc<CandleSeries>>,
) -> RefreshOutcome {
    match Arc::clone(chart).try_lock_owned() {
        Ok(guard) => refresh_and_publish(guard, source, publish).await,
        Err(_) => RefreshOutcome::Skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candles::Interval;
    use crate::config::PollConfig;
    use crate::live::chart::Selection;
    use crate::live::stub::{StubSource, raw};
    use crate::utils::format_timestamp;

    const PERIOD: Duration = Duration::from_secs(30);

    fn chart() -> Arc<Mutex<LiveChart>> {
        let selection = Selection {
            pair_id: "pair-1".to_string(),
            interval: Interval::M5,
            inverted: false,
        };
        Arc::new(Mutex::new(LiveChart::new(selection, &PollConfig::default())))
    }

    fn publisher() -> (watch::Sender<Arc<CandleSeries>>, watch::Receiver<Arc<CandleSeries>>) {
        watch::channel(Arc::new(CandleSeries::empty(Interval::M5, false)))
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_refresh_and_publish() {
        let recent = format_timestamp(Utc::now() - chrono::Duration::minutes(10));
        let stub = Arc::new(StubSource::new(vec![Ok(vec![raw(
            "a", &recent, 0.0, 1.0, 10.0, 0.0,
        )])]));
        let (publish, mut series_rx) = publisher();
        let (_visible_tx, visible_rx) = watch::channel(true);
        let handle = spawn_live_watcher(chart(), stub.clone(), PERIOD, visible_rx, publish);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(stub.calls(), 0);

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(stub.calls(), 1);
        assert!(series_rx.has_changed().unwrap());
        assert!(!series_rx.borrow_and_update().is_empty());

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_during_a_slow_refresh_are_dropped() {
        let stub = Arc::new(StubSource::new(vec![]).with_delay(Duration::from_secs(70)));
        let (publish, _series_rx) = publisher();
        let (_visible_tx, visible_rx) = watch::channel(true);
        let handle = spawn_live_watcher(chart(), stub.clone(), PERIOD, visible_rx, publish);

        // ticks at 30s (starts fetch until 100s), 60s and 90s (dropped)
        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(stub.calls(), 1);

        // next tick at 120s finds the chart free again
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(stub.calls(), 2);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn hidden_view_pauses_and_resume_waits_a_full_period() {
        let stub = Arc::new(StubSource::new(vec![]));
        let (publish, _series_rx) = publisher();
        let (visible_tx, visible_rx) = watch::channel(false);
        let handle = spawn_live_watcher(chart(), stub.clone(), PERIOD, visible_rx, publish);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(stub.calls(), 0);

        visible_tx.send(true).unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(stub.calls(), 0);

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(stub.calls(), 1);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_visibility_sender_stops_the_watcher() {
        let stub = Arc::new(StubSource::new(vec![]));
        let (publish, _series_rx) = publisher();
        let (visible_tx, visible_rx) = watch::channel(true);
        let handle = spawn_live_watcher(chart(), stub.clone(), PERIOD, visible_rx, publish);

        drop(visible_tx);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(handle.is_finished());
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn try_refresh_skips_when_chart_is_busy() {
        let stub: Arc<dyn TradeSource> = Arc::new(StubSource::new(vec![]));
        let (publish, _series_rx) = publisher();
        let chart = chart();

        let _held = chart.lock().await;
        let outcome = try_refresh(&chart, stub, publish).await;
        assert_eq!(outcome, RefreshOutcome::Skipped);
    }

    #[tokio::test]
    async fn failed_refresh_does_not_publish() {
        let stub: Arc<dyn TradeSource> = Arc::new(StubSource::new(vec![Err("timeout")]));
        let (publish, series_rx) = publisher();
        let chart = chart();

        let outcome = try_refresh(&chart, stub, publish.clone()).await;
        assert_eq!(outcome, RefreshOutcome::Unchanged);
        assert!(!series_rx.has_changed().unwrap());
    }
}
