// Disk / mountpoint models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskSnapshot {
    pub device: String,
    pub mountpoint: String,
    pub used_percent: f64,
    pub free_gb: f64,
}
