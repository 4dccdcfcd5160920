// Local Ollama inference: free-text prompt in, best-effort JSON out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use super::InsightBackend;
use crate::health::{DependencyStatus, join_url, probe_url};
use crate::models::{Insights, Summary};

/// Alerts listed individually in the prompt; the rest are only counted.
const PROMPT_ALERT_LIMIT: usize = 5;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(client: reqwest::Client, base_url: &str, model: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl InsightBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn generate(&self, summary: &Summary) -> anyhow::Result<Insights> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: render_prompt(summary),
            stream: false,
        };
        let response = self
            .client
            .post(join_url(&self.base_url, "/api/generate"))
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("ollama error ({}): {}", status, body);
        }
        let generated: GenerateResponse = response.json().await?;
        Ok(extract_json(&generated.response).unwrap_or_else(|| {
            tracing::warn!(
                backend = "ollama",
                "no parsable JSON in model output; returning empty insights"
            );
            Insights::default()
        }))
    }

    async fn probe(&self) -> DependencyStatus {
        probe_url(&self.client, &join_url(&self.base_url, "/api/tags")).await
    }
}

/// Parses the span from the first `{` to the last `}` of `text` as [`Insights`].
///
/// Lossy by nature: model output may wrap, truncate or malform the JSON, and anything that
/// does not parse yields `None`.
pub fn extract_json(text: &str) -> Option<Insights> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// The analyst prompt: host, window, cpu/memory/disk figures and up to five alerts.
pub fn render_prompt(summary: &Summary) -> String {
    let system = &summary.system;
    let disks = summary
        .disk_usage_avg
        .iter()
        .map(|(mount, usage)| format!("{}: {:.1}%", mount, usage))
        .collect::<Vec<_>>()
        .join(", ");

    let mut p = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(p, "You are ResourceWatcher, a system analyst reviewing host metrics.");
    let _ = writeln!(p);
    let _ = writeln!(p, "Analyze the following metrics and report what stands out.");
    let _ = writeln!(p);
    let _ = writeln!(p, "System:");
    let _ = writeln!(p, "- Hostname: {}", system.hostname);
    let _ = writeln!(p, "- Platform: {} {}", system.platform, system.platform_version);
    let _ = writeln!(p, "- Client ID: {}", system.client_id);
    let _ = writeln!(p);
    let _ = writeln!(
        p,
        "Time Range: {} to {}",
        summary.start_time.to_rfc3339(),
        summary.end_time.to_rfc3339()
    );
    let _ = writeln!(p);
    let _ = writeln!(p, "Performance Metrics:");
    let _ = writeln!(
        p,
        "- CPU Average: {:.1}%, Maximum: {:.1}%",
        summary.cpu_avg, summary.cpu_max
    );
    let _ = writeln!(
        p,
        "- Memory Average: {:.1}%, Maximum: {:.1}%",
        summary.memory_avg, summary.memory_max
    );
    let _ = writeln!(p, "- Disk Usage: {}", disks);
    let _ = writeln!(p);
    let _ = writeln!(p, "Alerts: {} alerts detected", summary.alerts.len());
    for alert in summary.alerts.iter().take(PROMPT_ALERT_LIMIT) {
        let _ = writeln!(
            p,
            "- {}: {}",
            alert.level.to_string().to_uppercase(),
            alert.message
        );
    }
    if summary.alerts.len() > PROMPT_ALERT_LIMIT {
        let _ = writeln!(
            p,
            "...and {} more alerts",
            summary.alerts.len() - PROMPT_ALERT_LIMIT
        );
    }
    let _ = writeln!(p);
    let _ = writeln!(p, "Identify:");
    let _ = writeln!(p, "1. Anomalies or concerning patterns");
    let _ = writeln!(p, "2. Actionable recommendations to improve system health");
    let _ = writeln!(p);
    let _ = writeln!(p, "Respond with JSON only, using this structure:");
    let _ = writeln!(p, "{{");
    let _ = writeln!(
        p,
        r#"  "anomalies": [{{"title": "...", "description": "...", "severity": "low|medium|high"}}],"#
    );
    let _ = writeln!(
        p,
        r#"  "recommendations": [{{"title": "...", "description": "...", "action": "..."}}]"#
    );
    let _ = writeln!(p, "}}");
    p
}
