//! Per-key version history.
//!
//! A [`KeyHistory`] holds every record ever written under one key and
//! exposes it through two views over the same `Arc`s:
//!
//! - an insertion-ordered sequence, sorted by timestamp, used for latest and
//!   before-timestamp reads;
//! - an exact-timestamp index mapping each timestamp to the contiguous run of
//!   positions in the sequence that carry it.
//!
//! Both views are mutated only by [`KeyHistory::append`], so a reader holding
//! the history never observes one view ahead of the other.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::CollisionPolicy;
use crate::record::Record;
use crate::time::Timestamp;

/// Every version written under one key.
#[derive(Debug)]
pub struct KeyHistory<V> {
    key: String,
    records: Vec<Arc<Record<V>>>,
    index: HashMap<Timestamp, Range<usize>>,
}

impl<V> KeyHistory<V> {
    /// Creates an empty history for `key`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_capacity(key, 0)
    }

    /// Creates an empty history with room for `capacity` versions.
    #[must_use]
    pub fn with_capacity(key: impl Into<String>, capacity: usize) -> Self {
        Self {
            key: key.into(),
            records: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// The key this history belongs to.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Appends a version and indexes it, returning the timestamp it was
    /// stored under.
    ///
    /// `requested` is normally a fresh clock reading. A reading earlier than
    /// the latest record is clamped up to it so the sequence stays sorted;
    /// a reading equal to it is then handled according to `policy`.
    pub fn append(
        &mut self,
        requested: Timestamp,
        payload: V,
        policy: CollisionPolicy,
    ) -> Timestamp {
        let timestamp = self.admit(requested, policy);
        let position = self.records.len();
        self.records.push(Arc::new(Record::new(timestamp, payload)));
        self.index
            .entry(timestamp)
            .and_modify(|run| run.end = position + 1)
            .or_insert(position..position + 1);
        timestamp
    }

    fn admit(&self, requested: Timestamp, policy: CollisionPolicy) -> Timestamp {
        let Some(latest) = self.latest_timestamp() else {
            return requested;
        };

        if requested < latest {
            warn!(
                key = %self.key,
                requested = %requested,
                latest = %latest,
                "clock reading behind latest version, clamping"
            );
        } else if requested > latest {
            return requested;
        }

        match policy {
            CollisionPolicy::Group => latest,
            CollisionPolicy::Separate => {
                let bumped = latest.next();
                debug!(
                    key = %self.key,
                    from = %latest,
                    to = %bumped,
                    "separating colliding timestamp"
                );
                bumped
            }
        }
    }

    /// The most recently appended record.
    #[must_use]
    pub fn latest(&self) -> Option<&Arc<Record<V>>> {
        self.records.last()
    }

    /// Timestamp of the most recently appended record.
    #[must_use]
    pub fn latest_timestamp(&self) -> Option<Timestamp> {
        self.latest().map(|r| r.timestamp())
    }

    /// The record stored at exactly `timestamp`. When several records share
    /// it, the newest one wins.
    #[must_use]
    pub fn at(&self, timestamp: Timestamp) -> Option<&Arc<Record<V>>> {
        self.index
            .get(&timestamp)
            .and_then(|run| self.records.get(run.end - 1))
    }

    /// Every record stored at exactly `timestamp`, oldest first. Empty when
    /// none is.
    #[must_use]
    pub fn all_at(&self, timestamp: Timestamp) -> &[Arc<Record<V>>] {
        match self.index.get(&timestamp) {
            Some(run) => &self.records[run.clone()],
            None => &[],
        }
    }

    /// Records strictly before `timestamp`, in insertion order.
    #[must_use]
    pub fn before(&self, timestamp: Timestamp) -> &[Arc<Record<V>>] {
        let end = self.records.partition_point(|r| r.timestamp() < timestamp);
        &self.records[..end]
    }

    /// All records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[Arc<Record<V>>] {
        &self.records
    }

    /// Number of versions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if nothing has been appended yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct timestamps.
    #[must_use]
    pub fn distinct_timestamps(&self) -> usize {
        self.index.len()
    }
}
