//! # timemap - a time-versioned key-value store
//!
//! timemap keeps every value ever written under a key, each tagged with the
//! instant it was inserted. A key's history can be read three ways:
//!
//! - **latest**: the most recent value,
//! - **at**: the value inserted at an exact timestamp,
//! - **before**: every value inserted strictly before a timestamp, oldest
//!   first.
//!
//! ## Core Concepts
//!
//! - **Record**: one `(timestamp, payload)` pair produced by a single write
//! - **KeyHistory**: every record of one key, kept as an ordered sequence and
//!   an exact-timestamp index over the same records
//! - **Clock**: the injected source of insertion timestamps
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use timemap::{ManualClock, StoreError, VersionedKvStore, VersionedStore};
//!
//! let store = VersionedStore::with_clock(Arc::new(ManualClock::new()));
//!
//! let t1 = store.set("dog", "woof");
//! let t2 = store.set("dog", "bark");
//! let t3 = store.set("dog", "sigh");
//!
//! assert_eq!(*store.get("dog")?.payload(), "sigh");
//! assert_eq!(*store.get_at("dog", t1)?.payload(), "woof");
//! assert_eq!(store.get_before("dog", t2)?.len(), 1);
//! assert_eq!(store.get_before("dog", t3.next())?.len(), 3);
//! # Ok::<(), StoreError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod history;
pub mod record;
pub mod storage;
pub mod time;

// Re-export primary types at crate root for convenience
pub use config::{CollisionPolicy, StoreConfig};
pub use error::{StoreError, TimeMapError, TimeMapResult, ValidationError};
pub use history::KeyHistory;
pub use record::Record;
pub use storage::{VersionedKvStore, VersionedStore};
pub use time::{Clock, ManualClock, SystemClock, Timestamp};
