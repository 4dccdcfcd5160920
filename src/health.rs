// Reachability probes for optional dependencies reported by GET /status.

use serde::Serialize;
use std::time::Duration;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyStatus {
    NotEnabled,
    Available,
    Unavailable,
}

/// GET `url`; any 2xx within [`PROBE_TIMEOUT`] counts as available.
pub async fn probe_url(client: &reqwest::Client, url: &str) -> DependencyStatus {
    match client.get(url).timeout(PROBE_TIMEOUT).send().await {
        Ok(resp) if resp.status().is_success() => DependencyStatus::Available,
        Ok(resp) => {
            tracing::debug!(url, status = %resp.status(), "dependency probe returned non-success");
            DependencyStatus::Unavailable
        }
        Err(e) => {
            tracing::debug!(url, error = %e, "dependency probe failed");
            DependencyStatus::Unavailable
        }
    }
}

/// Builds `base` + `path` without doubling the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Prometheus server health (`/-/healthy`), or `NotEnabled`.
pub async fn prometheus_status(
    client: &reqwest::Client,
    enabled: bool,
    base_url: &str,
) -> DependencyStatus {
    if !enabled {
        return DependencyStatus::NotEnabled;
    }
    probe_url(client, &join_url(base_url, "/-/healthy")).await
}
