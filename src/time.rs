//! Timestamps and clock sources.
//!
//! Every record is tagged with the instant it was inserted. The instant is
//! read from a [`Clock`] injected into the store, so tests can drive
//! timestamps deterministically with [`ManualClock`] instead of relying on
//! real elapsed time.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// An insertion instant with nanosecond resolution.
///
/// # Examples
///
/// ```
/// use timemap::Timestamp;
///
/// let t1 = Timestamp::from_nanos(1_000);
/// let t2 = t1.next();
/// assert!(t1 < t2);
/// assert_eq!(t2.as_nanos(), Some(1_001));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Wraps a UTC instant.
    #[must_use]
    pub const fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    /// Reads the wall clock.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from nanoseconds since the Unix epoch.
    #[must_use]
    pub fn from_nanos(nanos: i64) -> Self {
        Self(Utc.timestamp_nanos(nanos))
    }

    /// Nanoseconds since the Unix epoch, or `None` outside the `i64` range
    /// (before 1677 or after 2262).
    #[must_use]
    pub fn as_nanos(&self) -> Option<i64> {
        self.0.timestamp_nanos_opt()
    }

    /// The smallest timestamp strictly after this one (saturates at the
    /// maximum representable instant).
    #[must_use]
    pub fn next(self) -> Self {
        self.0
            .checked_add_signed(Duration::nanoseconds(1))
            .map_or(self, Self)
    }

    /// The underlying UTC instant.
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self(at)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }
}

/// A source of insertion timestamps.
///
/// Implementations must be cheap: the store calls `now` once per write while
/// holding the key's history exclusively.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}

/// Wall-clock source that never runs backwards.
///
/// If the system clock steps back (NTP slew, manual change) the last value
/// handed out is returned again until real time catches up.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: Mutex<Option<Timestamp>>,
}

impl SystemClock {
    /// Creates a new system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let physical = Timestamp::now();
        let mut last = self.last.lock();
        let ts = last.map_or(physical, |prev| prev.max(physical));
        *last = Some(ts);
        ts
    }
}

/// Deterministic clock for tests and simulations.
///
/// Each call to [`Clock::now`] returns the current reading and then advances
/// it by `step`. A zero step returns the same instant forever, which is how
/// timestamp collisions are produced on purpose.
///
/// # Examples
///
/// ```
/// use timemap::{Clock, ManualClock};
///
/// let clock = ManualClock::starting_at(100);
/// assert_eq!(clock.now().as_nanos(), Some(100));
/// assert_eq!(clock.now().as_nanos(), Some(1_000_100));
/// ```
#[derive(Debug)]
pub struct ManualClock {
    current: AtomicI64,
    step: i64,
}

impl ManualClock {
    /// Default advance per reading: one millisecond.
    pub const DEFAULT_STEP_NANOS: i64 = 1_000_000;

    /// Creates a clock at the Unix epoch with the default step.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a clock at `nanos` since the epoch with the default step.
    #[must_use]
    pub const fn starting_at(nanos: i64) -> Self {
        Self {
            current: AtomicI64::new(nanos),
            step: Self::DEFAULT_STEP_NANOS,
        }
    }

    /// Replaces the per-reading advance.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidClockStep` if `step` is negative or
    /// does not fit in `i64` nanoseconds.
    pub fn with_step(mut self, step: Duration) -> Result<Self, ValidationError> {
        match step.num_nanoseconds() {
            Some(nanos) if nanos >= 0 => {
                self.step = nanos;
                Ok(self)
            }
            _ => Err(ValidationError::InvalidClockStep { step }),
        }
    }

    /// Returns the next reading without advancing.
    #[must_use]
    pub fn peek(&self) -> Timestamp {
        Timestamp::from_nanos(self.current.load(Ordering::SeqCst))
    }

    /// Moves the clock to `nanos` since the epoch. Moving backwards is
    /// allowed; the store clamps regressions per key.
    pub fn set(&self, nanos: i64) {
        self.current.store(nanos, Ordering::SeqCst);
    }

    /// Moves the clock forward (or backward, for a negative duration).
    pub fn advance(&self, by: Duration) {
        let delta = by.num_nanoseconds().unwrap_or(if by < Duration::zero() {
            i64::MIN
        } else {
            i64::MAX
        });
        self.bump(delta);
    }

    fn bump(&self, delta: i64) -> i64 {
        let mut prev = self.current.load(Ordering::SeqCst);
        loop {
            match self.current.compare_exchange_weak(
                prev,
                prev.saturating_add(delta),
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return prev,
                Err(actual) => prev = actual,
            }
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_nanos(self.bump(self.step))
    }
}
