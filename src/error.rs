//! Error types for timemap.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! the specific condition. Reads report failures directly; writes never fail.

use thiserror::Error;

use crate::time::Timestamp;

/// Errors returned by read operations on a versioned store.
///
/// Every variant is recoverable and local to the failing call: the store's
/// state is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The key has never been written.
    #[error("key [{key}] does not exist")]
    KeyNotFound {
        /// The requested key.
        key: String,
    },

    /// The key exists but no record carries the requested timestamp.
    #[error("key [{key}] had no timestamp [{timestamp}]")]
    TimestampNotFound {
        /// The requested key.
        key: String,
        /// The requested timestamp.
        timestamp: Timestamp,
    },
}

impl StoreError {
    pub(crate) fn key_not_found(key: &str) -> Self {
        Self::KeyNotFound {
            key: key.to_owned(),
        }
    }

    pub(crate) fn timestamp_not_found(key: &str, timestamp: Timestamp) -> Self {
        Self::TimestampNotFound {
            key: key.to_owned(),
            timestamp,
        }
    }

    /// Returns the key the failed operation was addressed to.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::KeyNotFound { key } | Self::TimestampNotFound { key, .. } => key,
        }
    }
}

/// Validation errors for configuration and clock construction.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Clock step must be a non-negative duration representable in nanoseconds, got {step}")]
    InvalidClockStep {
        step: chrono::Duration,
    },

    #[error("Invalid store configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Top-level error type for timemap.
#[derive(Debug, Error)]
pub enum TimeMapError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl TimeMapError {
    /// Returns true if this is a store (read path) error.
    #[must_use]
    pub const fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if the requested key or timestamp was absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::KeyNotFound { .. } | StoreError::TimestampNotFound { .. })
        )
    }
}

/// Result type alias for timemap operations.
pub type TimeMapResult<T> = Result<T, TimeMapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_not_found_display() {
        let err = StoreError::key_not_found("dog");
        assert_eq!(err.to_string(), "key [dog] does not exist");
        assert_eq!(err.key(), "dog");
    }

    #[test]
    fn test_timestamp_not_found_display() {
        let ts = Timestamp::from_nanos(1_500_000_000);
        let err = StoreError::timestamp_not_found("cat", ts);
        let msg = err.to_string();
        assert!(msg.contains("key [cat]"));
        assert!(msg.contains(&ts.to_string()));
        assert_eq!(err.key(), "cat");
    }

    #[test]
    fn test_validation_error_clock_step() {
        let err = ValidationError::InvalidClockStep {
            step: chrono::Duration::milliseconds(-5),
        };
        assert!(err.to_string().contains("Clock step"));
    }

    #[test]
    fn test_timemap_error_from_store() {
        let err: TimeMapError = StoreError::key_not_found("k").into();
        assert!(err.is_store());
        assert!(err.is_not_found());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_timemap_error_from_validation() {
        let err: TimeMapError = ValidationError::InvalidConfig {
            reason: "bad".to_string(),
        }
        .into();
        assert!(err.is_validation());
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("bad"));
    }
}
