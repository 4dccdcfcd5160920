//! Narrative insights for summaries.
//!
//! A backend turns a [`Summary`] into anomalies and recommendations. Backends are
//! unreliable external services, so [`InsightAugmenter::augment`] runs the call as its
//! own task under a timeout and reduces every failure to `None`.

mod chain;
mod ollama;

pub use chain::ChainBackend;
pub use ollama::{OllamaBackend, extract_json, render_prompt};

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::InsightsConfig;
use crate::health::DependencyStatus;
use crate::models::{AlertRecord, Insights, Summary, SystemDescriptor, TrafficMb};
use crate::version;

#[async_trait]
pub trait InsightBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    async fn generate(&self, summary: &Summary) -> anyhow::Result<Insights>;

    async fn probe(&self) -> DependencyStatus;
}

#[derive(Debug, Serialize)]
pub struct AvgMax {
    pub avg: f64,
    pub max: f64,
}

#[derive(Debug, Serialize)]
pub struct WindowStats<'a> {
    pub time_range: String,
    pub cpu: AvgMax,
    pub memory: AvgMax,
    pub disk: &'a BTreeMap<String, f64>,
    pub network: &'a BTreeMap<String, TrafficMb>,
    pub alerts: &'a [AlertRecord],
}

/// Structured input sent to backends that accept JSON.
#[derive(Debug, Serialize)]
pub struct InsightContext<'a> {
    pub system: &'a SystemDescriptor,
    pub stats: WindowStats<'a>,
}

impl<'a> InsightContext<'a> {
    pub fn from_summary(summary: &'a Summary) -> Self {
        Self {
            system: &summary.system,
            stats: WindowStats {
                time_range: format!(
                    "{} to {}",
                    summary.start_time.to_rfc3339(),
                    summary.end_time.to_rfc3339()
                ),
                cpu: AvgMax {
                    avg: summary.cpu_avg,
                    max: summary.cpu_max,
                },
                memory: AvgMax {
                    avg: summary.memory_avg,
                    max: summary.memory_max,
                },
                disk: &summary.disk_usage_avg,
                network: &summary.network_traffic_mb,
                alerts: &summary.alerts,
            },
        }
    }
}

#[derive(Clone)]
pub struct InsightAugmenter {
    backend: Option<Arc<dyn InsightBackend>>,
    timeout: Duration,
}

impl InsightAugmenter {
    pub fn disabled() -> Self {
        Self {
            backend: None,
            timeout: Duration::ZERO,
        }
    }

    pub fn new(backend: Arc<dyn InsightBackend>, timeout: Duration) -> Self {
        Self {
            backend: Some(backend),
            timeout,
        }
    }

    /// Picks the Ollama or chain backend per `config.use_ollama`; disabled unless `config.enabled`.
    pub fn from_config(config: &InsightsConfig) -> anyhow::Result<Self> {
        if !config.enabled {
            return Ok(Self::disabled());
        }
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .user_agent(version::user_agent())
            .timeout(timeout)
            .build()
            .context("Failed to create insight HTTP client")?;
        let backend: Arc<dyn InsightBackend> = if config.use_ollama {
            Arc::new(OllamaBackend::new(client, &config.ollama_url, &config.ollama_model))
        } else {
            Arc::new(ChainBackend::new(client, &config.langchain_url))
        };
        tracing::info!(backend = backend.name(), "insight generation enabled");
        Ok(Self::new(backend, timeout))
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Insights for `summary`, or `None` if disabled or the backend failed in any way.
    pub async fn augment(&self, summary: &Summary) -> Option<Insights> {
        let backend = self.backend.clone()?;
        let name = backend.name();
        let summary = summary.clone();
        let mut task = tokio::spawn(async move { backend.generate(&summary).await });

        match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(Ok(Ok(insights))) => Some(insights),
            Ok(Ok(Err(e))) => {
                tracing::error!(backend = name, error = %e, "Error getting LLM insights");
                None
            }
            Ok(Err(e)) => {
                tracing::error!(backend = name, error = %e, "insight task failed");
                None
            }
            Err(_) => {
                task.abort();
                tracing::warn!(
                    backend = name,
                    timeout_secs = self.timeout.as_secs(),
                    "insight backend timed out"
                );
                None
            }
        }
    }

    pub async fn probe(&self) -> DependencyStatus {
        match &self.backend {
            Some(backend) => backend.probe().await,
            None => DependencyStatus::NotEnabled,
        }
    }
}
