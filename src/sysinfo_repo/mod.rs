// Host metrics via sysinfo

use crate::models::*;
use std::sync::Arc;
use std::time::Instant;
use sysinfo::{Disks, Networks, System};
use tracing::instrument;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

pub struct SysinfoRepo {
    sys: Arc<std::sync::Mutex<System>>,
    disks: Arc<std::sync::Mutex<Disks>>,
    networks: Arc<std::sync::Mutex<Networks>>,
    last_cpu_refresh: Arc<std::sync::Mutex<Option<(Instant, f64)>>>,
}

impl Default for SysinfoRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoRepo {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        sys.refresh_memory();
        let disks = Disks::new_with_refreshed_list();
        let networks = Networks::new_with_refreshed_list();
        Self {
            sys: Arc::new(std::sync::Mutex::new(sys)),
            disks: Arc::new(std::sync::Mutex::new(disks)),
            networks: Arc::new(std::sync::Mutex::new(networks)),
            last_cpu_refresh: Arc::new(std::sync::Mutex::new(None)),
        }
    }

    /// Host identity. `client_id` comes from configuration, the rest from the OS.
    pub fn get_system_descriptor(&self, client_id: &str) -> SystemDescriptor {
        SystemDescriptor {
            hostname: System::host_name().unwrap_or_default(),
            platform: System::name().unwrap_or_else(|| std::env::consts::OS.into()),
            platform_version: System::os_version()
                .or_else(System::kernel_version)
                .unwrap_or_default(),
            client_id: client_id.to_string(),
        }
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_cpu_snapshot"))]
    pub async fn get_cpu_snapshot(&self) -> anyhow::Result<CpuSnapshot> {
        let sys = self.sys.clone();
        let last_cpu_refresh = self.last_cpu_refresh.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;

            let now = Instant::now();
            let usage = if let Ok(mut guard) = last_cpu_refresh.lock() {
                if let Some((prev_ts, prev_usage)) = *guard {
                    if now.duration_since(prev_ts) >= sysinfo::MINIMUM_CPU_UPDATE_INTERVAL {
                        sys.refresh_cpu_all();
                        let new_usage = sys.global_cpu_usage() as f64;
                        *guard = Some((now, new_usage));
                        new_usage
                    } else {
                        // Too soon for a meaningful delta; reuse the last reading
                        prev_usage
                    }
                } else {
                    // First call only establishes the baseline
                    sys.refresh_cpu_all();
                    *guard = Some((now, 0.0));
                    0.0
                }
            } else {
                sys.refresh_cpu_all();
                0.0
            };

            let load = System::load_average();
            Ok(CpuSnapshot {
                usage_percent: usage.clamp(0.0, 100.0),
                load_avg_1min: load.one,
                load_avg_5min: load.five,
            })
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_memory_snapshot"))]
    pub async fn get_memory_snapshot(&self) -> anyhow::Result<MemorySnapshot> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_memory();

            let total = sys.total_memory();
            let available = sys.available_memory();
            let used = total.saturating_sub(available);
            let used_percent = if total > 0 {
                (used as f64 / total as f64) * 100.0
            } else {
                0.0
            };

            Ok(MemorySnapshot {
                used_percent,
                available_gb: available as f64 / BYTES_PER_GB,
            })
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_disk_snapshots"))]
    pub async fn get_disk_snapshots(&self) -> anyhow::Result<Vec<DiskSnapshot>> {
        let disks = self.disks.clone();
        tokio::task::spawn_blocking(move || {
            let mut disks_guard = disks
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo disks lock poisoned: {}", e))?;
            disks_guard.refresh(true);
            let snapshots = disks_guard
                .list()
                .iter()
                .filter(|d| d.total_space() > 0)
                .map(|d| {
                    let total = d.total_space();
                    let available = d.available_space();
                    let used = total.saturating_sub(available);
                    DiskSnapshot {
                        device: d.name().to_string_lossy().into_owned(),
                        mountpoint: d.mount_point().to_string_lossy().into_owned(),
                        used_percent: (used as f64 / total as f64) * 100.0,
                        free_gb: available as f64 / BYTES_PER_GB,
                    }
                })
                .collect();
            Ok(snapshots)
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }

    /// Cumulative per-interface counters, sorted by interface name.
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "get_network_snapshots"))]
    pub async fn get_network_snapshots(&self) -> anyhow::Result<Vec<NetworkSnapshot>> {
        let networks = self.networks.clone();
        tokio::task::spawn_blocking(move || {
            let mut networks_guard = networks
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo networks lock poisoned: {}", e))?;
            networks_guard.refresh(true);
            let mut snapshots: Vec<NetworkSnapshot> = networks_guard
                .list()
                .iter()
                .map(|(name, data)| NetworkSnapshot {
                    interface: name.clone(),
                    bytes_sent: data.total_transmitted(),
                    bytes_recv: data.total_received(),
                })
                .collect();
            snapshots.sort_by(|a, b| a.interface.cmp(&b.interface));
            Ok(snapshots)
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }
}
