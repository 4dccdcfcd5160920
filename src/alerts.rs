// Threshold evaluation and alert tallies.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::Thresholds;
use crate::models::{AlertLevel, AlertRecord, ResourceType, Sample};

/// Checks cpu usage, memory usage and every disk against `thresholds`.
/// One record per breach; consecutive samples over a threshold each produce a record.
pub fn evaluate(sample: &Sample, thresholds: &Thresholds) -> Vec<AlertRecord> {
    let mut alerts = Vec::new();

    if let Some(level) = classify(sample.cpu.usage_percent, thresholds.cpu, thresholds) {
        alerts.push(AlertRecord {
            timestamp: sample.timestamp,
            level,
            resource_type: ResourceType::Cpu,
            message: format!(
                "CPU usage is {:.1}% (threshold {}%)",
                sample.cpu.usage_percent, thresholds.cpu
            ),
        });
    }

    if let Some(level) = classify(sample.memory.used_percent, thresholds.memory, thresholds) {
        alerts.push(AlertRecord {
            timestamp: sample.timestamp,
            level,
            resource_type: ResourceType::Memory,
            message: format!(
                "Memory usage is {:.1}% (threshold {}%)",
                sample.memory.used_percent, thresholds.memory
            ),
        });
    }

    for disk in &sample.disks {
        if let Some(level) = classify(disk.used_percent, thresholds.disk, thresholds) {
            alerts.push(AlertRecord {
                timestamp: sample.timestamp,
                level,
                resource_type: ResourceType::Disk,
                message: format!(
                    "Disk usage on {} ({}) is {:.1}% (threshold {}%)",
                    disk.mountpoint, disk.device, disk.used_percent, thresholds.disk
                ),
            });
        }
    }

    alerts
}

/// `None` below the threshold; critical from `threshold + critical_margin` upwards.
fn classify(value: f64, threshold: f64, thresholds: &Thresholds) -> Option<AlertLevel> {
    if value < threshold {
        None
    } else if value >= threshold + thresholds.critical_margin {
        Some(AlertLevel::Critical)
    } else {
        Some(AlertLevel::Warning)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertCounts {
    pub total: usize,
    pub by_level: BTreeMap<AlertLevel, usize>,
    pub by_resource: BTreeMap<ResourceType, usize>,
}

/// Tally of the alerts raised at or after `window_start`.
pub fn count_by_window(alerts: &[AlertRecord], window_start: DateTime<Utc>) -> AlertCounts {
    let mut counts = AlertCounts::default();
    for alert in alerts.iter().filter(|a| a.timestamp >= window_start) {
        counts.total += 1;
        *counts.by_level.entry(alert.level).or_default() += 1;
        *counts.by_resource.entry(alert.resource_type).or_default() += 1;
    }
    counts
}
