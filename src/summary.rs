// Windowed aggregation over the sample history and alert log.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::models::{AlertRecord, Sample, Summary, TrafficMb};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TimeRangeError {
    #[error("Invalid time range format. Use Xm, Xh, or Xd.")]
    Malformed,
    #[error("Time range is too large.")]
    OutOfRange,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SummaryError {
    #[error("No metrics found for the specified time range.")]
    NoData,
}

/// A lookback window written as `<integer><unit>`, unit one of `m`, `h`, `d` (e.g. `30m`, `6h`, `7d`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange(Duration);

impl TimeRange {
    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Start of the window ending at `now`.
    pub fn start_from(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, TimeRangeError> {
        now.checked_sub_signed(self.0).ok_or(TimeRangeError::OutOfRange)
    }
}

impl FromStr for TimeRange {
    type Err = TimeRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s.len().checked_sub(1).ok_or(TimeRangeError::Malformed)?;
        let (digits, unit) = s.split_at_checked(split).ok_or(TimeRangeError::Malformed)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TimeRangeError::Malformed);
        }
        let n: i64 = digits.parse().map_err(|_| TimeRangeError::OutOfRange)?;
        let duration = match unit {
            "m" => Duration::try_minutes(n),
            "h" => Duration::try_hours(n),
            "d" => Duration::try_days(n),
            _ => return Err(TimeRangeError::Malformed),
        };
        duration.map(TimeRange).ok_or(TimeRangeError::OutOfRange)
    }
}

/// Aggregates the samples and alerts that fall in `[start, end]`.
///
/// Network traffic per interface is the difference between the newest sample and the oldest
/// sample in the window that reports the same interface, clamped at zero so a counter reset
/// never shows up as negative traffic. With a single sample every interface reports zero.
pub fn summarize(
    samples: &[Sample],
    alerts: &[AlertRecord],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Summary, SummaryError> {
    let in_range: Vec<&Sample> = samples
        .iter()
        .filter(|s| s.timestamp >= start && s.timestamp <= end)
        .collect();
    let Some(last) = in_range.last().copied() else {
        return Err(SummaryError::NoData);
    };

    let (cpu_avg, cpu_max) = mean_max(in_range.iter().map(|s| s.cpu.usage_percent));
    let (memory_avg, memory_max) = mean_max(in_range.iter().map(|s| s.memory.used_percent));

    let mut disk_values: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for sample in &in_range {
        for disk in &sample.disks {
            disk_values
                .entry(disk.mountpoint.clone())
                .or_default()
                .push(disk.used_percent);
        }
    }
    let disk_usage_avg = disk_values
        .into_iter()
        .map(|(mount, values)| (mount, mean_max(values.into_iter()).0))
        .collect();

    let mut network_traffic_mb = BTreeMap::new();
    for iface in &last.network {
        let traffic = if in_range.len() < 2 {
            TrafficMb::default()
        } else {
            in_range
                .iter()
                .find_map(|s| s.network.iter().find(|n| n.interface == iface.interface))
                .map(|first| TrafficMb {
                    sent: bytes_to_mb(iface.bytes_sent.saturating_sub(first.bytes_sent)),
                    received: bytes_to_mb(iface.bytes_recv.saturating_sub(first.bytes_recv)),
                })
                .unwrap_or_default()
        };
        network_traffic_mb.insert(iface.interface.clone(), traffic);
    }

    let alerts = alerts
        .iter()
        .filter(|a| a.timestamp >= start && a.timestamp <= end)
        .cloned()
        .collect();

    Ok(Summary {
        start_time: start,
        end_time: end,
        system: last.system.clone(),
        cpu_avg,
        cpu_max,
        memory_avg,
        memory_max,
        disk_usage_avg,
        network_traffic_mb,
        alerts,
        anomalies: None,
        recommendations: None,
    })
}

fn mean_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (sum, count, max) = values.fold((0.0, 0usize, f64::NEG_INFINITY), |(sum, n, max), v| {
        (sum + v, n + 1, max.max(v))
    });
    if count == 0 {
        (0.0, 0.0)
    } else {
        (sum / count as f64, max)
    }
}

fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}
