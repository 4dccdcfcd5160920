// Host identity, CPU/memory snapshots and the full sample

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContainerSnapshot, DiskSnapshot, NetworkSnapshot};

/// Identifies the host a sample was taken on; `client_id` is the configured agent identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemDescriptor {
    pub hostname: String,
    pub platform: String,
    pub platform_version: String,
    pub client_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuSnapshot {
    pub usage_percent: f64,
    pub load_avg_1min: f64,
    pub load_avg_5min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub used_percent: f64,
    pub available_gb: f64,
}

/// One point-in-time resource snapshot. Never mutated after it enters the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub system: SystemDescriptor,
    pub cpu: CpuSnapshot,
    pub memory: MemorySnapshot,
    pub disks: Vec<DiskSnapshot>,
    pub network: Vec<NetworkSnapshot>,
    /// `None` when container collection is disabled.
    #[serde(rename = "docker")]
    pub containers: Option<Vec<ContainerSnapshot>>,
}
