//! Abstract storage trait for timemap.
//!
//! The trait is the contract a versioned store offers to callers. It stays
//! object-safe so callers can hold a `&dyn VersionedKvStore<V>` and swap the
//! in-memory backend for a test double.

use std::sync::Arc;

use crate::error::StoreError;
use crate::record::Record;
use crate::time::Timestamp;

/// A key-value store that keeps every version ever written.
///
/// # Semantics
/// - Writes never fail. The first write to a key creates its history.
/// - Reads on a key that was never written fail with `KeyNotFound`.
/// - Reads never mutate state, and repeating one with no write in between
///   returns the same result.
pub trait VersionedKvStore<V>: Send + Sync {
    /// Append `payload` under `key`, stamped with the store clock's current
    /// instant. Returns the timestamp the record was stored under.
    fn set(&self, key: &str, payload: V) -> Timestamp;

    /// The most recently written record for `key`.
    fn get(&self, key: &str) -> Result<Arc<Record<V>>, StoreError>;

    /// The record written under `key` at exactly `timestamp`.
    ///
    /// # Errors
    /// - `KeyNotFound`: if `key` was never written
    /// - `TimestampNotFound`: if no record of `key` carries `timestamp`
    fn get_at(&self, key: &str, timestamp: Timestamp) -> Result<Arc<Record<V>>, StoreError>;

    /// Every record of `key` with a timestamp strictly before `timestamp`,
    /// oldest first. An empty result is not an error.
    fn get_before(
        &self,
        key: &str,
        timestamp: Timestamp,
    ) -> Result<Vec<Arc<Record<V>>>, StoreError>;

    /// Every record of `key` carrying exactly `timestamp`, oldest first.
    /// Same errors as [`get_at`](Self::get_at).
    fn get_all_at(
        &self,
        key: &str,
        timestamp: Timestamp,
    ) -> Result<Vec<Arc<Record<V>>>, StoreError>;

    /// The full history of `key`, oldest first.
    fn history(&self, key: &str) -> Result<Vec<Arc<Record<V>>>, StoreError>;

    /// Number of versions stored under `key`.
    fn version_count(&self, key: &str) -> Result<usize, StoreError>;

    /// True if `key` has been written at least once.
    fn contains_key(&self, key: &str) -> bool;

    /// All keys, sorted.
    fn keys(&self) -> Vec<String>;

    /// Number of keys.
    fn key_count(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_versioned_kv_store_object_safe(_: &dyn VersionedKvStore<String>) {}
    fn _assert_versioned_kv_store_object_safe_bytes(_: &dyn VersionedKvStore<Vec<u8>>) {}
}
