// Assembles one Sample from the host and (optionally) Docker repos.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::docker_repo::DockerRepo;
use crate::models::Sample;
use crate::sysinfo_repo::SysinfoRepo;

/// Produces a fresh sample on demand. Used by the worker loop and by handlers that
/// need a sample before the first collection cycle has run.
#[async_trait]
pub trait SampleSource: Send + Sync {
    async fn collect(&self) -> anyhow::Result<Sample>;
}

pub struct SystemCollector {
    sysinfo_repo: Arc<SysinfoRepo>,
    docker_repo: Option<Arc<DockerRepo>>,
    client_id: String,
}

impl SystemCollector {
    /// `docker_repo` is `None` when container collection is disabled; samples then carry no
    /// container list at all rather than an empty one.
    pub fn new(
        sysinfo_repo: Arc<SysinfoRepo>,
        docker_repo: Option<Arc<DockerRepo>>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            sysinfo_repo,
            docker_repo,
            client_id: client_id.into(),
        }
    }
}

#[async_trait]
impl SampleSource for SystemCollector {
    async fn collect(&self) -> anyhow::Result<Sample> {
        let timestamp = Utc::now();
        let system = self.sysinfo_repo.get_system_descriptor(&self.client_id);
        let cpu = self.sysinfo_repo.get_cpu_snapshot().await?;
        let memory = self.sysinfo_repo.get_memory_snapshot().await?;
        let disks = self.sysinfo_repo.get_disk_snapshots().await?;
        let network = self.sysinfo_repo.get_network_snapshots().await?;
        let containers = match &self.docker_repo {
            Some(repo) => Some(repo.list_running_and_refresh_stats().await),
            None => None,
        };

        Ok(Sample {
            timestamp,
            system,
            cpu,
            memory,
            disks,
            network,
            containers,
        })
    }
}
