//! Stored versions.

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// One value written under a key, tagged with its insertion timestamp.
///
/// Records are created once by a write and never mutated. Histories and
/// readers share them through `Arc`, so a read never copies the payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record<V> {
    timestamp: Timestamp,
    payload: V,
}

impl<V> Record<V> {
    pub(crate) const fn new(timestamp: Timestamp, payload: V) -> Self {
        Self { timestamp, payload }
    }

    /// When this record was inserted.
    #[must_use]
    pub const fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// The stored value.
    #[must_use]
    pub const fn payload(&self) -> &V {
        &self.payload
    }
}
