//! ChainedHashTable: bucket heads over an entry arena, with eager rehashing.

use crate::config::TableConfig;
use crate::error::{Result, TableError};
use crate::key::TableKey;
use crate::reentrancy::OperationTracker;
use crate::scheme::CollisionResolution;
use core::borrow::Borrow;
use core::fmt;
use log::{debug, trace, warn};
use slotmap::{DefaultKey, SlotMap};
use std::collections::TryReserveError;

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    hash: i64,                // `table_hash` of `key`, taken once at insert
    next: Option<DefaultKey>, // following entry in the same bucket
}

/// Reduce an intrinsic hash to a bucket index: `|hash mod capacity|`.
#[inline]
fn bucket_for(hash: i64, capacity: usize) -> usize {
    // i128 keeps both operands exact for every i64 hash and usize capacity.
    ((hash as i128) % (capacity as i128)).unsigned_abs() as usize
}

/// Structural state: one optional chain head per bucket, entries in an arena.
///
/// Kept apart from the table so operations can hold the reentrancy marker
/// while mutating the chains.
struct Chains<K, V> {
    heads: Vec<Option<DefaultKey>>,
    slots: SlotMap<DefaultKey, Entry<K, V>>,
}

impl<K, V> Chains<K, V> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            heads: vec![None; capacity],
            slots: SlotMap::with_key(),
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.heads.len()
    }

    #[inline]
    fn load_factor(&self) -> f64 {
        self.slots.len() as f64 / self.heads.len() as f64
    }

    fn links(&self, index: usize) -> Links<'_, K, V> {
        Links {
            slots: &self.slots,
            cur: self.heads.get(index).copied().flatten(),
        }
    }
}

impl<K: TableKey, V> Chains<K, V> {
    #[inline]
    fn index_of<Q>(&self, q: &Q) -> usize
    where
        Q: ?Sized + TableKey,
    {
        bucket_for(q.table_hash(), self.capacity())
    }

    fn find<Q>(&self, q: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + TableKey,
    {
        self.links(self.index_of(q))
            .map(|(_, e)| e)
            .find(|e| e.key.borrow() == q)
    }

    /// Append a fresh entry to the tail of bucket `index`. `tail` must be
    /// the current last entry of that chain (or `None` if it is empty).
    /// Never looks at the load factor.
    fn push_back(&mut self, index: usize, tail: Option<DefaultKey>, entry: Entry<K, V>) {
        let slot = self.slots.insert(entry);
        match tail {
            None => {
                debug_assert!(self.heads[index].is_none());
                self.heads[index] = Some(slot);
            }
            Some(t) => {
                if let Some(last) = self.slots.get_mut(t) {
                    debug_assert!(last.next.is_none());
                    last.next = Some(slot);
                }
            }
        }
    }

    /// Unlink the entry matching `q` and hand back its key and value.
    fn take<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + TableKey,
    {
        let index = self.index_of(q);
        let mut prev = None;
        let mut found = None;
        for (slot, e) in self.links(index) {
            if e.key.borrow() == q {
                found = Some(slot);
                break;
            }
            prev = Some(slot);
        }
        let entry = self.slots.remove(found?)?;
        match prev {
            None => self.heads[index] = entry.next,
            Some(p) => {
                if let Some(before) = self.slots.get_mut(p) {
                    before.next = entry.next;
                }
            }
        }
        Some((entry.key, entry.value))
    }

    /// Rebuild every chain against `new_capacity`. Old buckets are drained in
    /// index order, each head to tail, and every entry is appended to the
    /// tail of its new bucket. Entries stay in place in the arena; only the
    /// links change.
    ///
    /// Both bucket arrays are reserved before anything is unlinked, and the
    /// relink uses stored hashes, so a failure leaves the chains untouched
    /// and no user code runs mid-relink.
    fn rehash(&mut self, new_capacity: usize) -> core::result::Result<(), TryReserveError> {
        let mut heads: Vec<Option<DefaultKey>> = Vec::new();
        heads.try_reserve_exact(new_capacity)?;
        let mut tails: Vec<Option<DefaultKey>> = Vec::new();
        tails.try_reserve_exact(new_capacity)?;
        heads.resize(new_capacity, None);
        tails.resize(new_capacity, None);

        let old_heads = core::mem::replace(&mut self.heads, heads);
        for head in old_heads {
            let mut cur = head;
            while let Some(slot) = cur {
                let Some(entry) = self.slots.get_mut(slot) else {
                    debug_assert!(false, "chain links to a vacant slot");
                    break;
                };
                cur = entry.next.take();
                let index = bucket_for(entry.hash, new_capacity);
                match tails[index] {
                    None => self.heads[index] = Some(slot),
                    Some(t) => {
                        if let Some(last) = self.slots.get_mut(t) {
                            last.next = Some(slot);
                        }
                    }
                }
                tails[index] = Some(slot);
            }
        }
        Ok(())
    }

    /// Grow along `c -> 2 * c + 1` to the first capacity that brings the load
    /// factor below `threshold`, rehashing once into that size. The target
    /// is capped at the largest step within `max_capacity`; if the bucket
    /// arrays for it cannot be reserved, the table keeps its current buckets.
    fn grow_below(&mut self, threshold: f64, max_capacity: usize) {
        let keys = self.slots.len() as f64;
        let old = self.capacity();
        let mut new = old;
        while keys / new as f64 >= threshold {
            match new.checked_mul(2).and_then(|c| c.checked_add(1)) {
                Some(next) if next <= max_capacity => new = next,
                _ => {
                    warn!(
                        "hash table growth capped at {new} buckets (limit {max_capacity}); load factor stays >= {threshold}"
                    );
                    break;
                }
            }
        }
        if new == old {
            return;
        }
        if let Err(e) = self.rehash(new) {
            warn!(
                "hash table stays at {old} buckets, cannot allocate {new}: {e}; load factor {} >= {threshold}",
                self.load_factor()
            );
            return;
        }
        debug!(
            "rehashed {} keys from {old} to {new} buckets",
            self.slots.len()
        );
        debug_assert_eq!(self.audit_links(), Ok(()));
    }

    /// Linear structural check: every entry is linked exactly once and sits
    /// in the bucket its stored hash selects.
    fn audit_links(&self) -> core::result::Result<(), String> {
        let mut seen = hashbrown::HashSet::with_capacity(self.slots.len());
        for index in 0..self.capacity() {
            for (slot, e) in self.links(index) {
                if !seen.insert(slot) {
                    return Err(format!("entry {slot:?} linked more than once"));
                }
                let home = bucket_for(e.hash, self.capacity());
                if home != index {
                    return Err(format!("entry in bucket {index} belongs in bucket {home}"));
                }
            }
        }
        if seen.len() != self.slots.len() {
            return Err(format!(
                "{} entries stored but {} reachable",
                self.slots.len(),
                seen.len()
            ));
        }
        Ok(())
    }

    /// `audit_links` plus the checks that call into `K`: stored hashes match
    /// `table_hash` and no chain holds two equal keys.
    #[cfg(test)]
    fn audit(&self) -> core::result::Result<(), String> {
        self.audit_links()?;
        for index in 0..self.capacity() {
            let chain: Vec<_> = self.links(index).map(|(_, e)| e).collect();
            for (pos, e) in chain.iter().enumerate() {
                if e.hash != e.key.table_hash() {
                    return Err(format!("stale stored hash in bucket {index}"));
                }
                if chain[..pos].iter().any(|other| other.key == e.key) {
                    return Err(format!("duplicate key in bucket {index}"));
                }
            }
        }
        Ok(())
    }
}

/// Internal walk over one chain yielding arena keys with their entries.
struct Links<'a, K, V> {
    slots: &'a SlotMap<DefaultKey, Entry<K, V>>,
    cur: Option<DefaultKey>,
}

impl<'a, K, V> Iterator for Links<'a, K, V> {
    type Item = (DefaultKey, &'a Entry<K, V>);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cur?;
        let e = self.slots.get(slot)?;
        self.cur = e.next;
        Some((slot, e))
    }
}

/// A separate-chaining hash table.
///
/// Each of `capacity` buckets heads a singly linked chain of entries; a key
/// lives in bucket `|hash mod capacity|`. New entries go to the tail of their
/// chain. Whenever an insert leaves `num_keys / capacity` at or above the
/// load factor threshold, the table grows to `2 * capacity + 1` buckets and
/// rehashes every entry before `insert` returns, stopping at `max_capacity`.
/// Capacity never shrinks.
///
/// Keys are unique: inserting a present key fails with `DuplicateKey` and
/// values are never replaced in place.
pub struct ChainedHashTable<K, V> {
    chains: Chains<K, V>,
    load_factor_threshold: f64,
    max_capacity: usize,
    ops: OperationTracker,
}

impl<K: TableKey, V> ChainedHashTable<K, V> {
    /// Empty table with 11 buckets and a 0.75 threshold.
    pub fn new() -> Self {
        Self::unchecked(TableConfig::default())
    }

    pub fn with_capacity_and_threshold(
        initial_capacity: usize,
        load_factor_threshold: f64,
    ) -> Result<Self> {
        Self::from_config(
            TableConfig::new()
                .with_initial_capacity(initial_capacity)
                .with_load_factor_threshold(load_factor_threshold),
        )
    }

    pub fn from_config(config: TableConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::unchecked(config))
    }

    fn unchecked(config: TableConfig) -> Self {
        Self {
            chains: Chains::with_capacity(config.initial_capacity),
            load_factor_threshold: config.load_factor_threshold,
            max_capacity: config.max_capacity,
            ops: OperationTracker::new(),
        }
    }

    /// Insert a new key. Fails without touching the table if the key is the
    /// null sentinel or already present. May grow and rehash the table, up
    /// to `max_capacity` buckets.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        let _op = self.ops.enter("insert");
        if key.is_null() {
            return Err(TableError::IllegalNullKey);
        }
        let hash = key.table_hash();
        let index = bucket_for(hash, self.chains.capacity());
        let mut tail = None;
        for (slot, e) in self.chains.links(index) {
            if e.key == key {
                return Err(TableError::DuplicateKey);
            }
            tail = Some(slot);
        }
        self.chains.push_back(
            index,
            tail,
            Entry {
                key,
                value,
                hash,
                next: None,
            },
        );
        trace!(
            "inserted into bucket {index}; {} keys in {} buckets",
            self.chains.slots.len(),
            self.chains.capacity()
        );
        self.chains
            .grow_below(self.load_factor_threshold, self.max_capacity);
        Ok(())
    }

    pub fn get<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + TableKey,
    {
        let _op = self.ops.enter("get");
        if key.is_null() {
            return Err(TableError::IllegalNullKey);
        }
        self.chains
            .find(key)
            .map(|e| &e.value)
            .ok_or(TableError::KeyNotFound)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: ?Sized + TableKey,
    {
        let _op = self.ops.enter("contains_key");
        if key.is_null() {
            return Err(TableError::IllegalNullKey);
        }
        Ok(self.chains.find(key).is_some())
    }

    /// Remove `key`, returning whether it was present. A missing key is not
    /// an error. Never shrinks the table.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: ?Sized + TableKey,
    {
        self.remove_entry(key).map(|removed| removed.is_some())
    }

    /// Like `remove`, but hands back the owned key and value.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Result<Option<(K, V)>>
    where
        K: Borrow<Q>,
        Q: ?Sized + TableKey,
    {
        let _op = self.ops.enter("remove");
        if key.is_null() {
            return Err(TableError::IllegalNullKey);
        }
        let removed = self.chains.take(key);
        if removed.is_some() {
            trace!("removed key; {} keys left", self.chains.slots.len());
        }
        Ok(removed)
    }

    /// Bucket `key` hashes to under the current capacity.
    pub fn bucket_index<Q>(&self, key: &Q) -> Result<usize>
    where
        Q: ?Sized + TableKey,
    {
        let _op = self.ops.enter("bucket_index");
        if key.is_null() {
            return Err(TableError::IllegalNullKey);
        }
        Ok(self.chains.index_of(key))
    }

    #[cfg(test)]
    pub(crate) fn audit(&self) -> core::result::Result<(), String> {
        self.chains.audit()
    }
}

impl<K, V> ChainedHashTable<K, V> {
    pub fn num_keys(&self) -> usize {
        self.chains.slots.len()
    }

    pub fn len(&self) -> usize {
        self.chains.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.chains.capacity()
    }

    /// `num_keys / capacity`.
    pub fn load_factor(&self) -> f64 {
        self.chains.load_factor()
    }

    pub fn load_factor_threshold(&self) -> f64 {
        self.load_factor_threshold
    }

    /// Bucket count past which the table stops growing.
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn collision_resolution(&self) -> CollisionResolution {
        CollisionResolution::ArrayOfLinkedNodes
    }

    /// Numeric form of `collision_resolution`, in `1..=9`.
    pub fn collision_resolution_scheme(&self) -> u8 {
        self.collision_resolution().code()
    }

    /// Entries of bucket `index`, head to tail. Empty past the last bucket.
    pub fn chain(&self, index: usize) -> Chain<'_, K, V> {
        Chain {
            links: self.chains.links(index),
        }
    }

    /// All entries, bucket by bucket and head to tail within a bucket. The
    /// order changes whenever the table rehashes.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            heads: &self.chains.heads,
            slots: &self.chains.slots,
            next_bucket: 0,
            cur: None,
            remaining: self.chains.slots.len(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

impl<K: TableKey, V> Default for ChainedHashTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for ChainedHashTable<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over one bucket's chain.
pub struct Chain<'a, K, V> {
    links: Links<'a, K, V>,
}

impl<'a, K, V> Iterator for Chain<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.links.next().map(|(_, e)| (&e.key, &e.value))
    }
}

/// Iterator over every entry of a `ChainedHashTable`.
pub struct Iter<'a, K, V> {
    heads: &'a [Option<DefaultKey>],
    slots: &'a SlotMap<DefaultKey, Entry<K, V>>,
    next_bucket: usize,
    cur: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(slot) = self.cur {
                let e = self.slots.get(slot)?;
                self.cur = e.next;
                self.remaining = self.remaining.saturating_sub(1);
                return Some((&e.key, &e.value));
            }
            self.cur = *self.heads.get(self.next_bucket)?;
            self.next_bucket += 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a ChainedHashTable<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn chain_keys<K: Copy, V>(t: &ChainedHashTable<K, V>, index: usize) -> Vec<K> {
        t.chain(index).map(|(k, _)| *k).collect()
    }

    #[test]
    fn bucket_for_takes_absolute_remainder() {
        assert_eq!(bucket_for(12, 11), 1);
        assert_eq!(bucket_for(-12, 11), 1);
        assert_eq!(bucket_for(0, 7), 0);
        assert_eq!(bucket_for(i64::MIN, 11), (i64::MIN as i128 % 11).unsigned_abs() as usize);
        assert!(bucket_for(i64::MIN, 11) < 11);
        assert_eq!(bucket_for(i64::MAX, usize::MAX), i64::MAX as usize);
    }

    /// Colliding keys share one chain in insertion order; removing the middle
    /// entry relinks its neighbours.
    #[test]
    fn collisions_chain_in_insertion_order() {
        let mut t: ChainedHashTable<i32, &str> = ChainedHashTable::new();
        for k in [1, 12, 23] {
            t.insert(k, "one").unwrap();
        }
        assert_eq!(chain_keys(&t, 1), vec![1, 12, 23]);
        assert!(t.remove(&12).unwrap());
        assert_eq!(chain_keys(&t, 1), vec![1, 23]);
        assert!(t.remove(&1).unwrap());
        assert_eq!(chain_keys(&t, 1), vec![23]);
        assert!(t.remove(&23).unwrap());
        assert!(t.chain(1).next().is_none());
        assert_eq!(t.audit(), Ok(()));
    }

    #[test]
    fn removing_tail_keeps_chain_appendable() {
        let mut t: ChainedHashTable<i32, i32> = ChainedHashTable::new();
        for k in [2, 13, 24] {
            t.insert(k, k).unwrap();
        }
        assert!(t.remove(&24).unwrap());
        t.insert(35, 35).unwrap();
        assert_eq!(chain_keys(&t, 2), vec![2, 13, 35]);
        assert_eq!(t.audit(), Ok(()));
    }

    /// Rehash drains old buckets in index order, head to tail, appending to
    /// the new tails.
    #[test]
    fn rehash_preserves_relative_chain_order() {
        let mut t: ChainedHashTable<i32, ()> =
            ChainedHashTable::with_capacity_and_threshold(4, 0.75).unwrap();
        t.insert(1, ()).unwrap();
        t.insert(5, ()).unwrap();
        t.insert(9, ()).unwrap();
        // 3 / 4 >= 0.75, so the table is now 9 buckets wide.
        assert_eq!(t.capacity(), 9);
        assert_eq!(chain_keys(&t, 0), vec![9]);
        assert_eq!(chain_keys(&t, 1), vec![1]);
        assert_eq!(chain_keys(&t, 5), vec![5]);

        let mut t: ChainedHashTable<i32, ()> =
            ChainedHashTable::with_capacity_and_threshold(2, 2.0).unwrap();
        // Even keys all share bucket 0 of 2; after growth they split over 0 and 4.
        for k in [10, 0, 4] {
            t.insert(k, ()).unwrap();
        }
        assert_eq!(t.capacity(), 2);
        t.insert(20, ()).unwrap();
        assert_eq!(t.capacity(), 5);
        assert_eq!(chain_keys(&t, 0), vec![10, 0, 20]);
        assert_eq!(chain_keys(&t, 4), vec![4]);
        assert_eq!(t.audit(), Ok(()));
    }

    /// A tiny threshold skips ahead to the first step that satisfies it.
    #[test]
    fn growth_cascades_until_below_threshold() {
        let mut t: ChainedHashTable<u32, u32> =
            ChainedHashTable::with_capacity_and_threshold(1, 0.1).unwrap();
        t.insert(7, 7).unwrap();
        // 1 -> 3 -> 7 -> 15: 1/15 < 0.1 <= 1/7.
        assert_eq!(t.capacity(), 15);
        assert!(t.load_factor() < t.load_factor_threshold());
        assert_eq!(t.get(&7), Ok(&7));
    }

    /// With a threshold no reachable capacity satisfies, growth stops at the
    /// configured ceiling and the insert still lands.
    #[test]
    fn growth_stops_at_max_capacity() {
        let mut t: ChainedHashTable<u32, u32> = TableConfig::new()
            .with_initial_capacity(1)
            .with_load_factor_threshold(1e-12)
            .with_max_capacity(20)
            .build()
            .unwrap();
        assert_eq!(t.insert(7, 7), Ok(()));
        // 1 -> 3 -> 7 -> 15; the next step (31) would pass the ceiling.
        assert_eq!(t.capacity(), 15);
        assert!(t.load_factor() >= t.load_factor_threshold());
        assert_eq!(t.get(&7), Ok(&7));
        assert_eq!(t.audit(), Ok(()));

        for k in 0..100 {
            if k != 7 {
                t.insert(k, k).unwrap();
            }
        }
        assert_eq!(t.capacity(), 15);
        assert_eq!(t.num_keys(), 100);
        assert!((0..100).all(|k| t.get(&k) == Ok(&k)));
        assert_eq!(t.audit(), Ok(()));
    }

    /// Tables built with the defaults stop at `MAX_CAPACITY`, which a rehash
    /// can always size without overflowing.
    #[test]
    fn default_ceiling_is_the_crate_limit() {
        let t: ChainedHashTable<u32, u32> = ChainedHashTable::new();
        assert_eq!(t.max_capacity(), crate::config::MAX_CAPACITY);
        assert!(t.max_capacity().checked_mul(2).is_some());
    }

    /// Under the default ceiling a degenerate threshold asks for a bucket
    /// array that cannot be allocated; the insert still lands.
    #[test]
    fn unallocatable_growth_keeps_current_buckets() {
        let mut t: ChainedHashTable<u32, u32> =
            ChainedHashTable::with_capacity_and_threshold(1, 1e-18).unwrap();
        assert_eq!(t.insert(7, 7), Ok(()));
        assert_eq!(t.capacity(), 1);
        assert_eq!(t.insert(8, 8), Ok(()));
        assert_eq!((t.get(&7), t.get(&8)), (Ok(&7), Ok(&8)));
        assert_eq!(t.audit(), Ok(()));
    }

    #[test]
    fn failed_rehash_reservation_leaves_chains_intact() {
        let mut c: Chains<i32, i32> = Chains::with_capacity(3);
        for k in [1, 4, 2] {
            let tail = c.links(bucket_for(k as i64, 3)).last().map(|(slot, _)| slot);
            c.push_back(
                bucket_for(k as i64, 3),
                tail,
                Entry {
                    key: k,
                    value: k,
                    hash: k as i64,
                    next: None,
                },
            );
        }
        assert!(c.rehash(usize::MAX).is_err());
        assert_eq!(c.capacity(), 3);
        assert_eq!(c.audit(), Ok(()));
        let chain: Vec<i32> = c.links(1).map(|(_, e)| e.key).collect();
        assert_eq!(chain, vec![1, 4]);
    }

    /// The growth-time check works from stored hashes alone, so a long
    /// single-bucket chain stays linear to verify.
    #[test]
    fn audit_links_reports_misplaced_entry() {
        let mut t: ChainedHashTable<i64, ()> =
            ChainedHashTable::with_capacity_and_threshold(7, 1e9).unwrap();
        for k in 0..2_000 {
            t.insert(k * 7, ()).unwrap();
        }
        assert_eq!(t.capacity(), 7);
        assert_eq!(t.chains.audit_links(), Ok(()));

        let slot = t.chains.heads[0].unwrap();
        t.chains.slots[slot].hash = 1;
        assert_eq!(
            t.chains.audit_links(),
            Err("entry in bucket 0 belongs in bucket 1".to_string())
        );
    }

    /// Growth relinks by stored hash; `table_hash` runs once per insert.
    #[test]
    fn rehash_does_not_recompute_hashes() {
        use std::cell::Cell;

        thread_local! {
            static CALLS: Cell<usize> = const { Cell::new(0) };
        }
        #[derive(PartialEq, Eq)]
        struct Counted(i64);
        impl TableKey for Counted {
            fn table_hash(&self) -> i64 {
                CALLS.with(|c| c.set(c.get() + 1));
                self.0
            }
        }

        let mut t: ChainedHashTable<Counted, ()> =
            ChainedHashTable::with_capacity_and_threshold(1, 0.75).unwrap();
        for k in 0..50 {
            t.insert(Counted(k), ()).unwrap();
        }
        assert!(t.capacity() > 50);
        assert_eq!(CALLS.with(Cell::get), 50);
    }

    #[test]
    fn failed_operations_leave_table_untouched() {
        let mut t: ChainedHashTable<i32, &str> =
            ChainedHashTable::with_capacity_and_threshold(4, 0.75).unwrap();
        t.insert(1, "one").unwrap();
        t.insert(2, "two").unwrap();
        assert_eq!(t.insert(2, "again"), Err(TableError::DuplicateKey));
        assert_eq!(t.get(&2), Ok(&"two"));
        assert_eq!(t.get(&3), Err(TableError::KeyNotFound));
        assert_eq!(t.remove(&3), Ok(false));
        assert_eq!(t.num_keys(), 2);
        assert_eq!(t.capacity(), 4);
    }

    #[test]
    fn nullable_keys_reject_none() {
        let mut t: ChainedHashTable<Option<i32>, &str> = ChainedHashTable::new();
        assert_eq!(t.insert(None, "x"), Err(TableError::IllegalNullKey));
        t.insert(Some(1), "one").unwrap();
        assert_eq!(t.get(&None), Err(TableError::IllegalNullKey));
        assert_eq!(t.remove(&None), Err(TableError::IllegalNullKey));
        assert_eq!(t.contains_key(&None), Err(TableError::IllegalNullKey));
        assert_eq!(t.bucket_index(&None::<i32>), Err(TableError::IllegalNullKey));
        assert_eq!(t.get(&Some(1)), Ok(&"one"));
        assert_eq!(t.num_keys(), 1);
    }

    #[test]
    fn borrowed_lookup_with_str() {
        let mut t: ChainedHashTable<String, i32> = ChainedHashTable::new();
        t.insert("hello".to_string(), 1).unwrap();
        assert_eq!(t.contains_key("hello"), Ok(true));
        assert_eq!(t.contains_key("world"), Ok(false));
        assert_eq!(t.get("hello"), Ok(&1));
        assert_eq!(
            t.remove_entry("hello"),
            Ok(Some(("hello".to_string(), 1)))
        );
        assert!(t.is_empty());
    }

    #[test]
    fn iteration_visits_each_entry_once() {
        let mut t: ChainedHashTable<i32, i32> = ChainedHashTable::new();
        for k in 0..40 {
            t.insert(k, k * 10).unwrap();
        }
        let it = t.iter();
        assert_eq!(it.len(), 40);
        let seen: BTreeSet<i32> = it.map(|(k, _)| *k).collect();
        assert_eq!(seen, (0..40).collect());
        assert_eq!(t.values().sum::<i32>(), (0..40).map(|k| k * 10).sum());
        assert_eq!((&t).into_iter().count(), 40);
    }

    #[test]
    fn chain_past_capacity_is_empty() {
        let t: ChainedHashTable<i32, i32> = ChainedHashTable::new();
        assert!(t.chain(11).next().is_none());
        assert!(t.chain(usize::MAX).next().is_none());
    }

    #[test]
    fn debug_renders_as_map() {
        let mut t: ChainedHashTable<i32, &str> = ChainedHashTable::new();
        t.insert(1, "one").unwrap();
        t.insert(2, "two").unwrap();
        assert_eq!(format!("{t:?}"), r#"{1: "one", 2: "two"}"#);
    }

    #[test]
    fn remove_then_reinsert_same_key_yields_new_value() {
        let mut t: ChainedHashTable<String, i32> = ChainedHashTable::new();
        t.insert("k".to_string(), 1).unwrap();
        assert_eq!(t.remove("k"), Ok(true));
        assert_eq!(t.get("k"), Err(TableError::KeyNotFound));
        t.insert("k".to_string(), 2).unwrap();
        assert_eq!(t.get("k"), Ok(&2));
        assert_eq!(t.num_keys(), 1);
    }

    /// Debug-only: re-entering the table from `Eq` while a chain is being
    /// walked panics.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_from_eq_during_get() {
        struct ReentryKey {
            id: u32,
            table: *const ChainedHashTable<ReentryKey, i32>,
            trigger: bool,
        }
        impl PartialEq for ReentryKey {
            fn eq(&self, other: &Self) -> bool {
                if self.id == other.id {
                    return true;
                }
                if other.trigger {
                    // Attempt to re-enter the same table while scanning.
                    unsafe {
                        let t = &*other.table;
                        let _ = t.contains_key(self);
                    }
                }
                false
            }
        }
        impl Eq for ReentryKey {}
        impl TableKey for ReentryKey {
            fn table_hash(&self) -> i64 {
                0 // every key shares bucket 0
            }
        }

        let mut t: ChainedHashTable<ReentryKey, i32> = ChainedHashTable::new();
        t.insert(
            ReentryKey {
                id: 1,
                table: core::ptr::null(),
                trigger: false,
            },
            1,
        )
        .unwrap();
        let query = ReentryKey {
            id: 2,
            table: &t as *const _,
            trigger: true,
        };
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = t.get(&query);
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }
}
