//! Errors surfaced by `ChainedHashTable` and its configuration.

use thiserror::Error;

/// Every failure a table operation can report. All of them leave the
/// table exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("key is the null sentinel")]
    IllegalNullKey,
    #[error("key is already present in the table")]
    DuplicateKey,
    #[error("key not found")]
    KeyNotFound,
    #[error("initial capacity must be positive, got {0}")]
    InvalidCapacity(usize),
    #[error("load factor threshold must be a positive finite number, got {0}")]
    InvalidLoadFactorThreshold(f64),
    #[error("maximum capacity {max} must lie between the initial capacity {initial} and {limit}")]
    InvalidMaxCapacity {
        max: usize,
        initial: usize,
        limit: usize,
    },
}

pub type Result<T, E = TableError> = core::result::Result<T, E>;
