// In-memory, retention-bounded history. One instance holds samples, another the alert log.
// Items are kept ordered by timestamp; readers copy out a range and aggregate without the lock.

use crate::models::{AlertRecord, Sample};
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Anything that can live in a [`History`].
pub trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;
}

impl Timestamped for Sample {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Timestamped for AlertRecord {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

pub type MetricsStore = History<Sample>;
pub type AlertLog = History<AlertRecord>;

pub struct History<T> {
    items: RwLock<VecDeque<T>>,
    retention: Duration,
}

impl<T: Timestamped + Clone> History<T> {
    pub fn new(retention: Duration) -> Self {
        Self {
            items: RwLock::new(VecDeque::new()),
            retention,
        }
    }

    /// Retention given in minutes, as configured. Fails when the span does not fit a `Duration`.
    pub fn with_retention_minutes(minutes: u64) -> anyhow::Result<Self> {
        let retention = i64::try_from(minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .ok_or_else(|| anyhow::anyhow!("retention of {} minutes is out of range", minutes))?;
        Ok(Self::new(retention))
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Inserts `item` and evicts everything older than `now - retention`.
    /// An item older than the current tail goes to its ordered position instead of the tail.
    pub fn append(&self, item: T) {
        let now = Utc::now();
        let mut items = self.write();
        let ts = item.timestamp();
        if items.back().is_none_or(|last| last.timestamp() <= ts) {
            items.push_back(item);
        } else {
            let idx = items.partition_point(|i| i.timestamp() <= ts);
            tracing::debug!(
                operation = "history_append",
                position = idx,
                "out-of-order item inserted at ordered position"
            );
            items.insert(idx, item);
        }
        Self::evict(&mut items, now, self.retention);
    }

    fn evict(items: &mut VecDeque<T>, now: DateTime<Utc>, retention: Duration) {
        let Some(cutoff) = now.checked_sub_signed(retention) else {
            return;
        };
        let stale = items.partition_point(|i| i.timestamp() < cutoff);
        if stale > 0 {
            items.drain(..stale);
            tracing::debug!(operation = "history_evict", evicted = stale, "evicted expired items");
        }
    }

    pub fn latest(&self) -> Option<T> {
        self.read().back().cloned()
    }

    /// Items with `start <= timestamp <= end`, ascending.
    pub fn range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<T> {
        if start > end {
            return Vec::new();
        }
        let items = self.read();
        let from = items.partition_point(|i| i.timestamp() < start);
        let to = items.partition_point(|i| i.timestamp() <= end);
        items.range(from..to).cloned().collect()
    }

    /// Items with `timestamp >= start`, ascending.
    pub fn since(&self, start: DateTime<Utc>) -> Vec<T> {
        let items = self.read();
        let from = items.partition_point(|i| i.timestamp() < start);
        items.range(from..).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panic while holding the lock cannot leave the deque half-mutated, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, VecDeque<T>> {
        self.items.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<T>> {
        self.items.write().unwrap_or_else(|e| e.into_inner())
    }
}
