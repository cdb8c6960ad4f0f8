//! Read path: point lookups across the memtable and every level.

use crate::error::{Error, Result};
use crate::manifest::FileMeta;
use crate::Db;
use codec::Entry;
use std::sync::atomic::Ordering;

impl Db {
    /// Looks up `key`, returning a copy of the latest value.
    ///
    /// `Ok(None)` means the key is absent *or* its most recent record is a
    /// tombstone — indistinguishable by design, and distinct from a real
    /// I/O or corruption error.
    ///
    /// Under the shared lock the memtable is probed and the current
    /// [`Version`](crate::Version) snapshotted; the lock is released before
    /// any table I/O. L0 is searched newest-first (it may overlap); higher
    /// levels are range-disjoint so order does not matter. The first table
    /// whose entry matches wins.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(Error::Closed);
        }

        let (memtable_hit, version) = {
            let state = self.inner.state.read();
            (state.memtable.get(key).cloned(), self.version())
        };
        if let Some(entry) = memtable_hit {
            return Ok(live_value(entry));
        }

        for (level, files) in version.levels.iter().enumerate() {
            if level == 0 {
                for meta in files.iter().rev() {
                    if let Some(outcome) = self.table_lookup(meta, level, key)? {
                        return Ok(outcome);
                    }
                }
            } else {
                for meta in files {
                    if let Some(outcome) = self.table_lookup(meta, level, key)? {
                        return Ok(outcome);
                    }
                }
            }
        }

        Ok(None)
    }

    /// Probes one table. The outer `Option` is "did this table decide the
    /// lookup"; the inner is the decided answer (a tombstone decides the
    /// lookup with `None`).
    fn table_lookup(
        &self,
        meta: &FileMeta,
        level: usize,
        key: &[u8],
    ) -> Result<Option<Option<Vec<u8>>>> {
        if !meta.covers(key) {
            return Ok(None);
        }
        let table = self.inner.manifest.get_table(meta.file_no, level)?;
        match table.get(key)? {
            Some(entry) => Ok(Some(live_value(entry))),
            None => Ok(None),
        }
    }
}

fn live_value(entry: Entry) -> Option<Vec<u8>> {
    if entry.is_tombstone() {
        None
    } else {
        Some(entry.value)
    }
}
