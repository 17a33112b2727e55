//! Storage for timemap.
//!
//! `traits` defines the versioned key-value contract; `memory` provides the
//! thread-safe in-memory backend.

mod memory;
mod traits;

pub use memory::VersionedStore;
pub use traits::VersionedKvStore;
