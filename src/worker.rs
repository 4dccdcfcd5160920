// Background collection loop: sample, evaluate thresholds, append to the histories.

use crate::alerts;
use crate::collector::SampleSource;
use crate::config::Thresholds;
use crate::history_repo::{AlertLog, MetricsStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::time::{Duration, interval};

/// Loop state shared with GET /status.
#[derive(Debug, Default)]
pub struct CollectionState {
    active: AtomicBool,
    samples_collected: AtomicU64,
    failed_cycles: AtomicU64,
}

impl CollectionState {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    pub fn samples_collected(&self) -> u64 {
        self.samples_collected.load(Ordering::Relaxed)
    }

    pub fn failed_cycles(&self) -> u64 {
        self.failed_cycles.load(Ordering::Relaxed)
    }
}

/// Sources, histories and shutdown for the worker.
pub struct WorkerDeps {
    pub source: Arc<dyn SampleSource>,
    pub metrics_store: Arc<MetricsStore>,
    pub alert_log: Arc<AlertLog>,
    pub state: Arc<CollectionState>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Worker timing and thresholds.
pub struct WorkerConfig {
    pub sample_interval: Duration,
    /// How often to log collection stats (real seconds).
    pub stats_log_interval_secs: u64,
    pub thresholds: Thresholds,
}

/// One collection cycle. A failed collection produces neither a sample nor alerts.
/// Returns whether a sample was appended.
pub async fn run_cycle(
    source: &dyn SampleSource,
    metrics_store: &MetricsStore,
    alert_log: &AlertLog,
    thresholds: &Thresholds,
) -> bool {
    let sample = match source.collect().await {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(
                error = %e,
                operation = "collect_sample",
                "collection failed; skipping cycle"
            );
            return false;
        }
    };

    for alert in alerts::evaluate(&sample, thresholds) {
        tracing::info!(
            alert_level = %alert.level,
            resource = %alert.resource_type,
            "{}",
            alert.message
        );
        alert_log.append(alert);
    }
    metrics_store.append(sample);
    true
}

pub fn spawn(deps: WorkerDeps, config: WorkerConfig) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        source,
        metrics_store,
        alert_log,
        state,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        sample_interval,
        stats_log_interval_secs,
        thresholds,
    } = config;

    let stats_log_interval = Duration::from_secs(stats_log_interval_secs);

    tokio::spawn(async move {
        let mut tick = interval(sample_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(stats_log_interval);
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        state.active.store(true, Ordering::Relaxed);
        tracing::info!(
            sample_interval_ms = sample_interval.as_millis() as u64,
            "metrics collection started"
        );

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if run_cycle(source.as_ref(), &metrics_store, &alert_log, &thresholds).await {
                        state.samples_collected.fetch_add(1, Ordering::Relaxed);
                    } else {
                        state.failed_cycles.fetch_add(1, Ordering::Relaxed);
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Worker shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        samples_collected = state.samples_collected(),
                        failed_cycles = state.failed_cycles(),
                        history_len = metrics_store.len(),
                        alert_log_len = alert_log.len(),
                        "app stats"
                    );
                }
            }
        }

        state.active.store(false, Ordering::Relaxed);
    })
}
