// History tests: ordering, retention eviction, range queries

mod common;

use chrono::Duration;
use common::{minutes_ago, sample_at};
use resource_watcher::history_repo::MetricsStore;

#[test]
fn history_starts_empty() {
    let store = MetricsStore::with_retention_minutes(60).unwrap();
    assert!(store.is_empty());
    assert_eq!(store.len(), 0);
    assert!(store.latest().is_none());
    assert!(store.since(minutes_ago(60)).is_empty());
}

#[test]
fn history_keeps_timestamp_order_for_out_of_order_appends() {
    let store = MetricsStore::with_retention_minutes(60).unwrap();
    store.append(sample_at(minutes_ago(10), 10.0, 10.0));
    store.append(sample_at(minutes_ago(2), 30.0, 30.0));
    store.append(sample_at(minutes_ago(5), 20.0, 20.0));

    let all = store.since(minutes_ago(60));
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    let cpu: Vec<f64> = all.iter().map(|s| s.cpu.usage_percent).collect();
    assert_eq!(cpu, vec![10.0, 20.0, 30.0]);
    assert_eq!(store.latest().unwrap().cpu.usage_percent, 30.0);
}

#[test]
fn history_evicts_items_older_than_retention() {
    let store = MetricsStore::with_retention_minutes(30).unwrap();
    assert_eq!(store.retention(), Duration::minutes(30));
    store.append(sample_at(minutes_ago(90), 1.0, 1.0));
    store.append(sample_at(minutes_ago(45), 2.0, 2.0));
    store.append(sample_at(minutes_ago(10), 3.0, 3.0));

    assert_eq!(store.len(), 1);
    let cutoff = minutes_ago(30);
    assert!(store.since(minutes_ago(1000)).iter().all(|s| s.timestamp >= cutoff));
}

#[test]
fn history_range_is_inclusive_on_both_ends() {
    let store = MetricsStore::with_retention_minutes(60).unwrap();
    let t1 = minutes_ago(30);
    let t2 = minutes_ago(20);
    let t3 = minutes_ago(10);
    for (ts, cpu) in [(t1, 1.0), (t2, 2.0), (t3, 3.0)] {
        store.append(sample_at(ts, cpu, 0.0));
    }

    let hits = store.range(t1, t2);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].timestamp, t1);
    assert_eq!(hits[1].timestamp, t2);

    assert_eq!(store.range(t2, t2).len(), 1);
    assert!(store.range(t3, t1).is_empty());
}

#[test]
fn history_since_returns_tail() {
    let store = MetricsStore::with_retention_minutes(60).unwrap();
    store.append(sample_at(minutes_ago(40), 1.0, 1.0));
    store.append(sample_at(minutes_ago(20), 2.0, 2.0));
    store.append(sample_at(minutes_ago(5), 3.0, 3.0));

    let tail = store.since(minutes_ago(25));
    assert_eq!(tail.len(), 2);
    assert_eq!(tail[0].cpu.usage_percent, 2.0);
}

#[test]
fn history_accepts_concurrent_appends() {
    let store = std::sync::Arc::new(MetricsStore::with_retention_minutes(60).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..25 {
                    store.append(sample_at(minutes_ago(30 - i), t as f64, 0.0));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let all = store.since(minutes_ago(60));
    assert_eq!(all.len(), 100);
    assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn history_rejects_retention_beyond_duration_range() {
    assert!(MetricsStore::with_retention_minutes(999_999_999_999_999).is_err());
    assert!(MetricsStore::with_retention_minutes(u64::MAX).is_err());
    let week = MetricsStore::with_retention_minutes(7 * 24 * 60).unwrap();
    assert_eq!(week.retention(), Duration::days(7));
}
