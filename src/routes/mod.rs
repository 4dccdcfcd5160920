// HTTP routes

mod error;
mod http;

pub use error::ApiError;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::collector::SampleSource;
use crate::config::AppConfig;
use crate::history_repo::{AlertLog, MetricsStore};
use crate::insights::InsightAugmenter;
use crate::worker::CollectionState;

#[derive(Clone)]
pub struct AppState {
    pub metrics_store: Arc<MetricsStore>,
    pub alert_log: Arc<AlertLog>,
    /// Used when the history is still empty.
    pub source: Arc<dyn SampleSource>,
    pub collection: Arc<CollectionState>,
    pub insights: InsightAugmenter,
    /// Dependency probes for GET /status.
    pub http_client: reqwest::Client,
    pub config: AppConfig,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(http::healthz_handler)) // GET /healthz
        .route("/status", get(http::status_handler)) // GET /status
        .route("/metrics", get(http::metrics_handler)) // GET /metrics
        .route("/metrics/prometheus", get(http::prometheus_handler)) // GET /metrics/prometheus
        .route("/summary", get(http::summary_handler)) // GET /summary
        .route("/version", get(http::version_handler)) // GET /version
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
