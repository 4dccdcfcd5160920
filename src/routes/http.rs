// GET handlers: healthz, status, metrics, metrics/prometheus, summary, version

use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::alerts::{self, AlertCounts};
use crate::health::{self, DependencyStatus};
use crate::models::{Sample, Summary, SystemDescriptor};
use crate::prometheus;
use crate::summary::{self, TimeRange};
use crate::version::{NAME, VERSION};

/// GET /version: service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

pub(super) async fn healthz_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now(),
    }))
}

/// Latest stored sample, or a fresh one that is not appended to the history.
async fn current_sample(state: &AppState) -> Result<Sample, ApiError> {
    if let Some(sample) = state.metrics_store.latest() {
        return Ok(sample);
    }
    state.source.collect().await.map_err(ApiError::Collection)
}

#[derive(Debug, Serialize)]
pub struct CurrentUsage {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub load_avg_1min: f64,
    pub load_avg_5min: f64,
}

#[derive(Debug, Serialize)]
pub struct CollectionStatus {
    pub is_active: bool,
    pub interval_seconds: u64,
    pub metrics_count: usize,
    pub retention_minutes: u64,
}

#[derive(Debug, Serialize)]
pub struct Dependencies {
    pub llm: DependencyStatus,
    pub prometheus: DependencyStatus,
    pub docker: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub system: SystemDescriptor,
    pub current: CurrentUsage,
    pub metrics_collection: CollectionStatus,
    /// Alerts raised during the last hour.
    pub alerts: AlertCounts,
    pub dependencies: Dependencies,
    pub timestamp: DateTime<Utc>,
}

pub(super) async fn status_handler(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let sample = current_sample(&state).await?;
    let now = Utc::now();
    let hour_ago = now - chrono::Duration::hours(1);
    let alerts = alerts::count_by_window(&state.alert_log.since(hour_ago), hour_ago);

    let integrations = &state.config.integrations;
    let (llm, prometheus) = tokio::join!(
        state.insights.probe(),
        health::prometheus_status(
            &state.http_client,
            integrations.prometheus_enabled,
            &integrations.prometheus_url,
        ),
    );

    Ok(Json(StatusResponse {
        current: CurrentUsage {
            cpu_usage: sample.cpu.usage_percent,
            memory_usage: sample.memory.used_percent,
            load_avg_1min: sample.cpu.load_avg_1min,
            load_avg_5min: sample.cpu.load_avg_5min,
        },
        system: sample.system,
        metrics_collection: CollectionStatus {
            is_active: state.collection.is_active(),
            interval_seconds: state.config.collection.interval_secs,
            metrics_count: state.metrics_store.len(),
            retention_minutes: state.config.collection.retention_minutes,
        },
        alerts,
        dependencies: Dependencies {
            llm,
            prometheus,
            docker: integrations.docker_enabled,
        },
        timestamp: now,
    }))
}

pub(super) async fn metrics_handler(
    State(state): State<AppState>,
) -> Result<Json<Sample>, ApiError> {
    current_sample(&state).await.map(Json)
}

pub(super) async fn prometheus_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = prometheus::render(state.metrics_store.latest().as_ref());
    ([(header::CONTENT_TYPE, prometheus::CONTENT_TYPE)], body)
}

fn default_time_range() -> String {
    "1h".to_string()
}

#[derive(Debug, Deserialize)]
pub(super) struct SummaryParams {
    #[serde(default = "default_time_range")]
    time_range: String,
    #[serde(default)]
    include_insights: bool,
}

pub(super) async fn summary_handler(
    State(state): State<AppState>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<Summary>, ApiError> {
    let range: TimeRange = params.time_range.parse()?;
    let now = Utc::now();
    let start = range.start_from(now)?;

    let samples = state.metrics_store.range(start, now);
    let alerts = state.alert_log.range(start, now);
    let mut summary = summary::summarize(&samples, &alerts, start, now)?;

    if params.include_insights
        && let Some(insights) = state.insights.augment(&summary).await
    {
        summary.apply_insights(insights);
    }
    Ok(Json(summary))
}
