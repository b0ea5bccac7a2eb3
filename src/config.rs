//! Construction parameters for `ChainedHashTable`.

use crate::chained_table::ChainedHashTable;
use crate::error::{Result, TableError};
use crate::key::TableKey;
use slotmap::DefaultKey;

/// Bucket count used by `ChainedHashTable::new`.
pub const DEFAULT_INITIAL_CAPACITY: usize = 11;

/// Load factor at which `ChainedHashTable::new` tables grow.
pub const DEFAULT_LOAD_FACTOR_THRESHOLD: f64 = 0.75;

/// Largest bucket count any table may reach. A rehash holds two bucket
/// arrays of this length, and each must stay under `isize::MAX` bytes.
pub const MAX_CAPACITY: usize =
    isize::MAX as usize / (2 * core::mem::size_of::<Option<DefaultKey>>());

/// Initial bucket count, growth threshold and growth ceiling, fixed for the
/// life of a table (the capacity then only grows, up to `max_capacity`).
///
/// ```
/// use chained_hash_table::TableConfig;
///
/// let table = TableConfig::new()
///     .with_initial_capacity(4)
///     .with_load_factor_threshold(0.75)
///     .build::<i32, &str>()
///     .unwrap();
/// assert_eq!(table.capacity(), 4);
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TableConfig {
    pub initial_capacity: usize,
    pub load_factor_threshold: f64,
    /// Growth stops here even if the load factor is still at or above the
    /// threshold; inserts keep succeeding with longer chains.
    pub max_capacity: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor_threshold: DEFAULT_LOAD_FACTOR_THRESHOLD,
            max_capacity: MAX_CAPACITY,
        }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn with_load_factor_threshold(mut self, threshold: f64) -> Self {
        self.load_factor_threshold = threshold;
        self
    }

    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(TableError::InvalidCapacity(self.initial_capacity));
        }
        let t = self.load_factor_threshold;
        if !(t.is_finite() && t > 0.0) {
            return Err(TableError::InvalidLoadFactorThreshold(t));
        }
        if self.max_capacity < self.initial_capacity || self.max_capacity > MAX_CAPACITY {
            return Err(TableError::InvalidMaxCapacity {
                max: self.max_capacity,
                initial: self.initial_capacity,
                limit: MAX_CAPACITY,
            });
        }
        Ok(())
    }

    pub fn build<K: TableKey, V>(self) -> Result<ChainedHashTable<K, V>> {
        ChainedHashTable::from_config(self)
    }
}
