//! In-memory storage backend.
//!
//! [`VersionedStore`] keeps one [`KeyHistory`] per key. The key map and each
//! history sit behind their own lock: writers to different keys only contend
//! on the map while a new key is created, and writers to the same key are
//! serialized by that key's history lock. The clock is read under the history
//! lock, so timestamp order always matches append order.
//!
//! A new key's history enters the map already holding its first record, so a
//! key is never visible without a value.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::history::KeyHistory;
use crate::record::Record;
use crate::storage::traits::VersionedKvStore;
use crate::time::{Clock, SystemClock, Timestamp};

type SharedHistory<V> = Arc<RwLock<KeyHistory<V>>>;

/// Thread-safe in-memory versioned key-value store.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use timemap::{ManualClock, VersionedKvStore, VersionedStore};
///
/// let store = VersionedStore::with_clock(Arc::new(ManualClock::new()));
/// let t1 = store.set("dog", "woof");
/// let t2 = store.set("dog", "bark");
///
/// assert_eq!(*store.get("dog").unwrap().payload(), "bark");
/// assert_eq!(*store.get_at("dog", t1).unwrap().payload(), "woof");
/// assert_eq!(store.get_before("dog", t2).unwrap().len(), 1);
/// ```
#[derive(Debug)]
pub struct VersionedStore<V> {
    histories: RwLock<HashMap<String, SharedHistory<V>>>,
    clock: Arc<dyn Clock>,
    config: StoreConfig,
}

impl<V> VersionedStore<V> {
    /// Create an empty store on the system clock with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    /// Create an empty store that stamps writes with `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::with_config(clock, StoreConfig::default())
    }

    /// Create an empty store with an explicit clock and configuration.
    #[must_use]
    pub fn with_config(clock: Arc<dyn Clock>, config: StoreConfig) -> Self {
        Self {
            histories: RwLock::new(HashMap::with_capacity(config.key_capacity)),
            clock,
            config,
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// True if no key has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.histories.read().is_empty()
    }

    fn shared_history(&self, key: &str) -> Result<SharedHistory<V>, StoreError> {
        self.histories
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::key_not_found(key))
    }
}

impl<V> Default for VersionedStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Send + Sync> VersionedKvStore<V> for VersionedStore<V> {
    fn set(&self, key: &str, payload: V) -> Timestamp {
        let existing = self.histories.read().get(key).cloned();
        let history = match existing {
            Some(history) => history,
            None => {
                let mut histories = self.histories.write();
                match histories.entry(key.to_owned()) {
                    Entry::Occupied(entry) => Arc::clone(entry.get()),
                    Entry::Vacant(entry) => {
                        // Published only once it holds its first record.
                        let mut history =
                            KeyHistory::with_capacity(key, self.config.history_capacity);
                        let timestamp = history.append(
                            self.clock.now(),
                            payload,
                            self.config.collision_policy,
                        );
                        debug!(key, %timestamp, "created history for new key");
                        entry.insert(Arc::new(RwLock::new(history)));
                        return timestamp;
                    }
                }
            }
        };

        let mut history = history.write();
        let timestamp = history.append(self.clock.now(), payload, self.config.collision_policy);
        trace!(key, %timestamp, versions = history.len(), "set");
        timestamp
    }

    fn get(&self, key: &str) -> Result<Arc<Record<V>>, StoreError> {
        let history = self.shared_history(key)?;
        let history = history.read();
        trace!(key, "get latest");
        history
            .latest()
            .cloned()
            .ok_or_else(|| StoreError::key_not_found(key))
    }

    fn get_at(&self, key: &str, timestamp: Timestamp) -> Result<Arc<Record<V>>, StoreError> {
        let history = self.shared_history(key)?;
        let history = history.read();
        trace!(key, %timestamp, "get at");
        history
            .at(timestamp)
            .cloned()
            .ok_or_else(|| StoreError::timestamp_not_found(key, timestamp))
    }

    fn get_before(
        &self,
        key: &str,
        timestamp: Timestamp,
    ) -> Result<Vec<Arc<Record<V>>>, StoreError> {
        let history = self.shared_history(key)?;
        let history = history.read();
        let before = history.before(timestamp);
        trace!(key, %timestamp, matched = before.len(), "get before");
        Ok(before.to_vec())
    }

    fn get_all_at(
        &self,
        key: &str,
        timestamp: Timestamp,
    ) -> Result<Vec<Arc<Record<V>>>, StoreError> {
        let history = self.shared_history(key)?;
        let history = history.read();
        let run = history.all_at(timestamp);
        if run.is_empty() {
            return Err(StoreError::timestamp_not_found(key, timestamp));
        }
        Ok(run.to_vec())
    }

    fn history(&self, key: &str) -> Result<Vec<Arc<Record<V>>>, StoreError> {
        let history = self.shared_history(key)?;
        let records = history.read().records().to_vec();
        Ok(records)
    }

    fn version_count(&self, key: &str) -> Result<usize, StoreError> {
        let history = self.shared_history(key)?;
        let count = history.read().len();
        Ok(count)
    }

    fn contains_key(&self, key: &str) -> bool {
        self.histories.read().contains_key(key)
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.histories.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn key_count(&self) -> usize {
        self.histories.read().len()
    }
}
