//! # Memtable — In-Memory Write Buffer
//!
//! Holds the latest [`Entry`] per key since the last flush. Backed by a
//! `BTreeMap` keyed on the raw key bytes, so [`Memtable::iter`] yields
//! entries in ascending key order — exactly the stream the SSTable writer
//! needs.
//!
//! The memtable keeps **only** the newest entry per key; older versions are
//! discarded in memory (the WAL still has them until the next flush).
//! Tombstones are entries too: a deleted key stays present, carrying a
//! `Delete` entry that shadows older values further down the tree.

use codec::Entry;
use std::collections::btree_map::{self, BTreeMap};

/// The in-memory write buffer. One per active WAL.
#[derive(Debug, Default)]
pub struct Memtable {
    map: BTreeMap<Vec<u8>, Entry>,
}

impl Memtable {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    /// Records `key = value` at `seq`, overwriting any older entry.
    ///
    /// A stale `seq` never replaces a newer one — WAL replay can present the
    /// same key twice and must not regress the latest write.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>, seq: u64) {
        self.apply(Entry {
            seq,
            ..Entry::put(key, value)
        });
    }

    /// Installs a tombstone for `key` at `seq`.
    pub fn delete(&mut self, key: Vec<u8>, seq: u64) {
        self.apply(Entry {
            seq,
            ..Entry::delete(key)
        });
    }

    /// Inserts a fully formed entry, keeping the newest `seq` per key.
    pub fn apply(&mut self, entry: Entry) {
        match self.map.get(&entry.key) {
            Some(existing) if existing.seq > entry.seq => {}
            _ => {
                self.map.insert(entry.key.clone(), entry);
            }
        }
    }

    /// Returns the latest entry for `key`, tombstones included.
    /// The caller decides what a tombstone means.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&Entry> {
        self.map.get(key)
    }

    /// Number of distinct keys present (tombstones count).
    ///
    /// This is the flush-threshold metric: entries, not bytes, and not the
    /// total number of writes absorbed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Ascending-key iterator over the current entries.
    ///
    /// The borrow rules make this a snapshot: the flush path iterates while
    /// holding the engine's write lock, so no mutation can interleave.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.map.values(),
        }
    }
}

/// Sorted iterator over memtable entries.
pub struct Iter<'a> {
    inner: btree_map::Values<'a, Vec<u8>, Entry>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

#[cfg(test)]
mod tests;
