// Docker container stats via bollard. One long-lived stats stream per running container.

mod stats;

use crate::models::ContainerSnapshot;
use bollard::Docker;
use bollard::query_parameters::{ListContainersOptions, StatsOptions};
use futures_util::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

pub struct DockerRepo {
    docker: Docker,
    live_stats: Arc<RwLock<HashMap<String, ContainerSnapshot>>>,
    active_streams: Arc<RwLock<HashMap<String, tokio::task::JoinHandle<()>>>>,
}

struct RunningContainer {
    id: String,
    name: String,
    image: String,
}

impl DockerRepo {
    pub fn connect() -> anyhow::Result<Self> {
        let docker = Docker::connect_with_unix_defaults()?;
        Ok(Self {
            docker,
            live_stats: Arc::new(RwLock::new(HashMap::new())),
            active_streams: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Lists running containers, starts streams for new ones, stops streams for gone ones,
    /// and returns the latest snapshot per container sorted by name.
    /// When the daemon cannot be listed, the last known snapshots are returned.
    pub async fn list_running_and_refresh_stats(&self) -> Vec<ContainerSnapshot> {
        let mut filters = HashMap::new();
        filters.insert("status".to_string(), vec!["running".to_string()]);

        let filter = ListContainersOptions {
            all: false,
            filters: Some(filters),
            ..Default::default()
        };

        let containers = match self.docker.list_containers(Some(filter)).await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, operation = "list_containers", "Docker list_containers failed");
                return self.get_cached_stats().await;
            }
        };

        let running: Vec<RunningContainer> = containers
            .iter()
            .filter_map(|c| {
                let id = c.id.clone()?;
                let name = c
                    .names
                    .as_ref()
                    .and_then(|n| n.first())
                    .map(|n| n.trim_start_matches('/').to_string())
                    .unwrap_or_else(|| id.clone());
                let image = c.image.clone().unwrap_or_default();
                Some(RunningContainer { id, name, image })
            })
            .collect();
        let running_set: HashSet<&str> = running.iter().map(|c| c.id.as_str()).collect();

        let current_keys: Vec<String> = {
            let r = self.active_streams.read().await;
            r.keys().cloned().collect()
        };

        let to_remove: Vec<String> = current_keys
            .iter()
            .filter(|id| !running_set.contains(id.as_str()))
            .cloned()
            .collect();

        let mut new_handles = Vec::new();
        for c in running.into_iter().filter(|c| !current_keys.contains(&c.id)) {
            let id = c.id.clone();
            new_handles.push((id, self.start_monitoring(c)));
        }

        {
            let mut streams = self.active_streams.write().await;
            for (id, handle) in new_handles {
                streams.insert(id, handle);
            }
            for id in &to_remove {
                if let Some(handle) = streams.remove(id) {
                    handle.abort();
                }
            }
        }
        if !to_remove.is_empty() {
            let mut live = self.live_stats.write().await;
            for id in &to_remove {
                live.remove(id);
            }
        }

        self.get_cached_stats().await
    }

    fn start_monitoring(&self, container: RunningContainer) -> tokio::task::JoinHandle<()> {
        let docker = self.docker.clone();
        let live_stats = self.live_stats.clone();
        let active_streams = self.active_streams.clone();

        tokio::spawn(async move {
            let RunningContainer { id, name, image } = container;
            let options = StatsOptions {
                stream: true,
                ..Default::default()
            };
            let mut stream = docker.stats(&id, Some(options));

            while let Some(result) = stream.next().await {
                match result {
                    Ok(s) => {
                        if let Some(snapshot) = stats::process_statistics(&s, &name, &image) {
                            live_stats.write().await.insert(id.clone(), snapshot);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(container = %name, error = %e, "stats stream error");
                        break;
                    }
                }
            }
            tracing::info!(container = %name, "stats stream ended");
            active_streams.write().await.remove(&id);
            live_stats.write().await.remove(&id);
        })
    }

    async fn get_cached_stats(&self) -> Vec<ContainerSnapshot> {
        let live = self.live_stats.read().await;
        let mut out: Vec<ContainerSnapshot> = live.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}
