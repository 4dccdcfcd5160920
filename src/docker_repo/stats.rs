// Reduce a raw Docker stats API response to a ContainerSnapshot.

use crate::models::ContainerSnapshot;
use bollard::models::ContainerStatsResponse;

/// CPU % the way `docker stats` reports it (can exceed 100 on multi-core hosts) and
/// memory % of the container limit, excluding inactive page cache. Exposed for unit tests.
pub(crate) fn process_statistics(
    s: &ContainerStatsResponse,
    name: &str,
    image: &str,
) -> Option<ContainerSnapshot> {
    let cpu_stats = s.cpu_stats.as_ref()?;
    let precpu_stats = s.precpu_stats.as_ref()?;

    let cpu_usage = cpu_stats.cpu_usage.as_ref()?;
    let precpu_usage = precpu_stats.cpu_usage.as_ref()?;

    let cpu_delta =
        cpu_usage.total_usage.unwrap_or(0) as i64 - precpu_usage.total_usage.unwrap_or(0) as i64;
    let system_delta = cpu_stats.system_cpu_usage.unwrap_or(0) as i64
        - precpu_stats.system_cpu_usage.unwrap_or(0) as i64;
    let online = cpu_stats.online_cpus.unwrap_or(1) as f64;
    let cpu_percent = if system_delta > 0 && cpu_delta > 0 && online > 0.0 {
        (cpu_delta as f64 / system_delta as f64) * online * 100.0
    } else {
        0.0
    };

    let memory = s.memory_stats.as_ref();
    let mem_usage = memory.and_then(|m| m.usage).unwrap_or(0);
    let mem_limit = memory.and_then(|m| m.limit).unwrap_or(0);
    let inactive_file = memory
        .and_then(|m| m.stats.as_ref())
        .and_then(|stats| stats.get("inactive_file").copied())
        .unwrap_or(0);
    let memory_percent = if mem_limit > 0 {
        (mem_usage.saturating_sub(inactive_file) as f64 / mem_limit as f64) * 100.0
    } else {
        0.0
    };

    Some(ContainerSnapshot {
        name: name.to_string(),
        image: image.to_string(),
        cpu_percent,
        memory_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::{
        ContainerCpuStats, ContainerCpuUsage, ContainerMemoryStats, ContainerStatsResponse,
    };
    use std::collections::HashMap;

    fn minimal_cpu_stats(total_usage: u64, system_cpu_usage: u64) -> ContainerCpuStats {
        ContainerCpuStats {
            cpu_usage: Some(ContainerCpuUsage {
                total_usage: Some(total_usage),
                ..Default::default()
            }),
            system_cpu_usage: Some(system_cpu_usage),
            online_cpus: Some(2),
            throttling_data: None,
        }
    }

    #[test]
    fn process_statistics_returns_none_when_cpu_stats_missing() {
        let s = ContainerStatsResponse {
            cpu_stats: None,
            precpu_stats: Some(minimal_cpu_stats(0, 0)),
            ..Default::default()
        };
        assert!(process_statistics(&s, "name", "image").is_none());
    }

    #[test]
    fn process_statistics_returns_none_when_precpu_stats_missing() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(minimal_cpu_stats(100, 1000)),
            precpu_stats: None,
            ..Default::default()
        };
        assert!(process_statistics(&s, "name", "image").is_none());
    }

    #[test]
    fn process_statistics_computes_cpu_and_memory_percent() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(minimal_cpu_stats(100_000_000, 1_000_000_000)),
            precpu_stats: Some(minimal_cpu_stats(50_000_000, 500_000_000)),
            memory_stats: Some(ContainerMemoryStats {
                usage: Some(300 * 1024 * 1024),
                limit: Some(512 * 1024 * 1024),
                stats: Some(HashMap::from([(
                    "inactive_file".to_string(),
                    44 * 1024 * 1024,
                )])),
                ..Default::default()
            }),
            ..Default::default()
        };
        let out = process_statistics(&s, "web", "nginx:1.27").unwrap();
        assert_eq!(out.name, "web");
        assert_eq!(out.image, "nginx:1.27");
        assert!((out.cpu_percent - 20.0).abs() < 0.01);
        assert!((out.memory_percent - 50.0).abs() < 0.01);
    }

    #[test]
    fn process_statistics_zero_system_delta_returns_zero_cpu_percent() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(minimal_cpu_stats(100, 500)),
            precpu_stats: Some(minimal_cpu_stats(50, 500)),
            ..Default::default()
        };
        let out = process_statistics(&s, "n", "i").unwrap();
        assert_eq!(out.cpu_percent, 0.0);
        assert_eq!(out.memory_percent, 0.0);
    }
}
