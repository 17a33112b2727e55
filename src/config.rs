//! Store configuration.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// How a write is indexed when its timestamp equals the key's latest one.
///
/// Collisions happen with coarse clocks or with a deterministic test clock
/// that does not advance between writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Keep the shared timestamp. The exact-timestamp index maps it to every
    /// record carrying it; point reads return the newest of them.
    #[default]
    Group,
    /// Move the write to the next nanosecond so every record of a key has a
    /// distinct timestamp.
    ///
    /// At the maximum representable instant there is no next nanosecond; the
    /// write then falls back to grouping with the latest record.
    Separate,
}

/// Store configuration.
///
/// # Examples
///
/// ```
/// use timemap::{CollisionPolicy, StoreConfig};
///
/// let config = StoreConfig::from_json(r#"{ "collision_policy": "separate" }"#).unwrap();
/// assert_eq!(config.collision_policy, CollisionPolicy::Separate);
/// assert_eq!(config.history_capacity, 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Handling of writes that share a timestamp with the key's latest record.
    pub collision_policy: CollisionPolicy,
    /// Number of keys to preallocate room for.
    pub key_capacity: usize,
    /// Number of versions to preallocate for each new key.
    pub history_capacity: usize,
}

impl StoreConfig {
    /// Sets the collision policy.
    #[must_use]
    pub const fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Sets the key capacity hint.
    #[must_use]
    pub const fn with_key_capacity(mut self, capacity: usize) -> Self {
        self.key_capacity = capacity;
        self
    }

    /// Sets the per-key history capacity hint.
    #[must_use]
    pub const fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidConfig` if the document is malformed
    /// or names an unknown collision policy.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json).map_err(|e| ValidationError::InvalidConfig {
            reason: e.to_string(),
        })
    }
}
