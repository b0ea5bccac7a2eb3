//! chained-hash-table: a single-threaded, separate-chaining hash table
//! with unique keys and eager growth.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a key-to-value container whose collision policy, indexing and
//!   growth are explicit and observable (capacity, load factor, per-bucket
//!   chains), rather than hidden behind an opaque probing scheme.
//! - Layers:
//!   - `Chains<K, V>` (private): bucket heads plus an entry arena. Each
//!     bucket holds the arena key of its first entry; each entry holds the
//!     arena key of the next one. Unlinking relinks keys, not pointers.
//!   - `ChainedHashTable<K, V>`: public API. Validates keys, enforces
//!     uniqueness, decides when to grow, and exposes metrics.
//!
//! Indexing
//! - Keys implement `TableKey`: an intrinsic `i64` hash plus `Eq`. The
//!   bucket for a key is `|hash mod capacity|`, recomputed against the
//!   current capacity on every lookup. Integers hash to their own value.
//! - `Option<T>` is the only nullable key type; `None` is rejected with
//!   `TableError::IllegalNullKey` by every keyed operation.
//!
//! Growth
//! - After an insert, while `num_keys / capacity >= threshold`, capacity
//!   becomes `2 * capacity + 1` and every chain is rebuilt. Old buckets are
//!   drained in index order, head to tail, and appended to the tails of the
//!   new buckets. The relink path never consults the threshold; the outer
//!   loop does, so growth may take several steps under tiny thresholds.
//! - Each entry stores the hash taken at insert; rehash relinks by that
//!   value and never calls back into `K`.
//! - Growth stops at `TableConfig::max_capacity` (default `MAX_CAPACITY`),
//!   or when the new bucket arrays cannot be allocated. The insert still
//!   succeeds; the load factor then stays at or above the threshold.
//! - Capacity never shrinks; `remove` only unlinks.
//!
//! Constraints
//! - Single-threaded and synchronous. Every operation, including growth,
//!   completes before returning.
//! - Reentrancy: calling back into a table from `K: Eq` or
//!   `TableKey::table_hash` while it is mid-operation panics in debug
//!   builds (see `reentrancy`).
//! - Failed operations never mutate the table.
//!
//! Notes and non-goals
//! - No open addressing, no pluggable hasher, no ordering guarantees beyond
//!   membership, no values replaced in place.

mod chained_table;
mod chained_table_proptest;
pub mod config;
pub mod error;
pub mod key;
mod reentrancy;
pub mod scheme;

// Public surface
pub use chained_table::{ChainedHashTable, Chain, Iter};
pub use config::{
    TableConfig, DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR_THRESHOLD, MAX_CAPACITY,
};
pub use error::{Result, TableError};
pub use key::TableKey;
pub use scheme::CollisionResolution;
