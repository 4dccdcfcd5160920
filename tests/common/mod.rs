// Shared test helpers
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use resource_watcher::collector::SampleSource;
use resource_watcher::models::*;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn descriptor() -> SystemDescriptor {
    SystemDescriptor {
        hostname: "test-host".into(),
        platform: "Linux".into(),
        platform_version: "6.1".into(),
        client_id: "test-client".into(),
    }
}

/// A sample with no disks, no interfaces and container collection disabled.
pub fn sample_at(timestamp: DateTime<Utc>, cpu: f64, memory: f64) -> Sample {
    Sample {
        timestamp,
        system: descriptor(),
        cpu: CpuSnapshot {
            usage_percent: cpu,
            load_avg_1min: 0.5,
            load_avg_5min: 0.25,
        },
        memory: MemorySnapshot {
            used_percent: memory,
            available_gb: 4.0,
        },
        disks: vec![],
        network: vec![],
        containers: None,
    }
}

/// `minutes_ago` minutes before now.
pub fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    Utc::now() - Duration::minutes(minutes)
}

pub fn disk(mountpoint: &str, used_percent: f64) -> DiskSnapshot {
    DiskSnapshot {
        device: format!("/dev/{}", mountpoint.trim_start_matches('/').replace('/', "_")),
        mountpoint: mountpoint.into(),
        used_percent,
        free_gb: 10.0,
    }
}

pub fn interface(name: &str, bytes_sent: u64, bytes_recv: u64) -> NetworkSnapshot {
    NetworkSnapshot {
        interface: name.into(),
        bytes_sent,
        bytes_recv,
    }
}

/// Returns a clone of `sample` (stamped with the current time) or fails when `None`.
pub struct FakeSource {
    sample: Option<Sample>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn returning(sample: Sample) -> Self {
        Self {
            sample: Some(sample),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            sample: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SampleSource for FakeSource {
    async fn collect(&self) -> anyhow::Result<Sample> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let mut sample = self
            .sample
            .clone()
            .ok_or_else(|| anyhow::anyhow!("sensor read failed"))?;
        sample.timestamp = Utc::now();
        Ok(sample)
    }
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A one-sample summary over the last hour with a single cpu alert.
pub fn summary_fixture() -> Summary {
    let now = Utc::now();
    let sample = sample_at(now - Duration::minutes(5), 91.0, 40.0);
    let alerts = resource_watcher::alerts::evaluate(
        &sample,
        &resource_watcher::config::Thresholds::default(),
    );
    resource_watcher::summary::summarize(&[sample], &alerts, now - Duration::hours(1), now)
        .unwrap()
}
