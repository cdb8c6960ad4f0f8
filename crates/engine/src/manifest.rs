//! Manifest — the versioned source of truth for the LSM tree.
//!
//! A [`Version`] is an immutable snapshot of "which files make up the tree
//! right now": the active WAL, the per-level table metadata, and the next
//! file numbers to allocate. Edits never mutate a published version —
//! they deep-copy, modify the copy, and atomically swap the current
//! pointer under the manifest's write lock. Readers clone the `Arc` and
//! release the lock immediately; a version they hold can never change
//! underneath them.
//!
//! ## Durability
//!
//! The in-memory version is checkpointed to `<db>/MANIFEST` as JSON via
//! write-temp + fsync + atomic rename. The rename is the *only* commit
//! point in the engine: a table or WAL file exists logically once (and only
//! once) a durable checkpoint references it. Anything on disk the current
//! checkpoint does not reference is an orphan, safe to delete.
//!
//! The manifest also owns the shared table-handle cache and the block
//! cache: versions refer to tables by file number only, and readers bind
//! those numbers to open handles late, through [`Manifest::get_table`].

use crate::error::{Error, Result};
use crate::paths;
use codec::FileNo;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use sstable::{BlockCache, Table};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Metadata the manifest keeps per table file. The key range lets the read
/// path skip tables that cannot contain a key without opening them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub file_no: FileNo,
    pub smallest_key: Vec<u8>,
    pub largest_key: Vec<u8>,
}

impl FileMeta {
    /// Whether `key` falls inside this table's `[smallest, largest]` range.
    #[must_use]
    pub fn covers(&self, key: &[u8]) -> bool {
        self.smallest_key.as_slice() <= key && key <= self.largest_key.as_slice()
    }
}

/// An immutable snapshot of the LSM tree structure.
///
/// `levels[0]` is L0 in flush order (newest last); reads must walk it in
/// reverse. Levels ≥ 1 hold range-disjoint tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub current_wal: FileNo,
    pub levels: Vec<Vec<FileMeta>>,
    pub next_wal_no: FileNo,
    pub next_sst_no: FileNo,
}

impl Version {
    /// An empty tree with `num_levels` levels.
    pub fn new(num_levels: usize) -> Self {
        Self {
            current_wal: 0,
            levels: vec![Vec::new(); num_levels],
            next_wal_no: 0,
            next_sst_no: 0,
        }
    }

    /// Every table file number referenced by this version.
    pub fn referenced_tables(&self) -> impl Iterator<Item = (usize, &FileMeta)> {
        self.levels
            .iter()
            .enumerate()
            .flat_map(|(level, files)| files.iter().map(move |meta| (level, meta)))
    }
}

/// An atomic structural change: tables to drop and tables to add, per
/// level. Flush adds one L0 table; a future compactor would populate both
/// sides in a single edit.
#[derive(Debug, Clone, Default)]
pub struct VersionEdit {
    pub add_ssts: Vec<(usize, FileMeta)>,
    pub delete_ssts: Vec<(usize, FileNo)>,
}

impl VersionEdit {
    /// The flush edit: add one table at L0.
    pub fn add_l0(meta: FileMeta) -> Self {
        Self {
            add_ssts: vec![(0, meta)],
            delete_ssts: Vec::new(),
        }
    }
}

/// Owns the current version pointer, its durable checkpoint, and the shared
/// table-handle and block caches.
pub struct Manifest {
    root: PathBuf,
    current: RwLock<Arc<Version>>,
    tables: Mutex<HashMap<FileNo, Arc<Table>>>,
    block_cache: Arc<BlockCache>,
}

impl Manifest {
    pub fn new(root: PathBuf, num_levels: usize, block_cache_capacity: usize) -> Self {
        Self {
            root,
            current: RwLock::new(Arc::new(Version::new(num_levels))),
            tables: Mutex::new(HashMap::new()),
            block_cache: Arc::new(BlockCache::new(block_cache_capacity)),
        }
    }

    /// The current version. The lock is held only long enough to clone the
    /// `Arc`; the snapshot stays valid for as long as the caller keeps it.
    #[must_use]
    pub fn current(&self) -> Arc<Version> {
        Arc::clone(&self.current.read())
    }

    /// Wholesale replacement, used at recovery and to roll back a failed
    /// checkpoint. Not part of steady-state operation.
    pub fn load_version(&self, version: Version) {
        *self.current.write() = Arc::new(version);
    }

    /// Publishes a version whose active WAL is `file_no`.
    pub fn set_wal(&self, file_no: FileNo) {
        let mut current = self.current.write();
        let mut next = (**current).clone();
        next.current_wal = file_no;
        next.next_wal_no = file_no + 1;
        *current = Arc::new(next);
    }

    /// Applies a structural edit: deletions first, then additions, bumping
    /// `next_sst_no` past every added file number.
    pub fn apply(&self, edit: &VersionEdit) {
        let mut current = self.current.write();
        let mut next = (**current).clone();

        for (level, file_no) in &edit.delete_ssts {
            if let Some(files) = next.levels.get_mut(*level) {
                files.retain(|meta| meta.file_no != *file_no);
            }
        }
        for (level, meta) in &edit.add_ssts {
            while next.levels.len() <= *level {
                next.levels.push(Vec::new());
            }
            next.next_sst_no = next.next_sst_no.max(meta.file_no + 1);
            next.levels[*level].push(meta.clone());
        }

        *current = Arc::new(next);
    }

    /// Returns an open handle for table `file_no`, opening it on first
    /// access. Handles are immutable and shared by every reader.
    pub fn get_table(&self, file_no: FileNo, level: usize) -> Result<Arc<Table>> {
        let mut tables = self.tables.lock();
        if let Some(table) = tables.get(&file_no) {
            return Ok(Arc::clone(table));
        }

        let path = paths::sstable_path(&self.root, level, file_no);
        let table = Arc::new(Table::open(
            &path,
            file_no,
            Some(Arc::clone(&self.block_cache)),
        )?);
        tables.insert(file_no, Arc::clone(&table));
        Ok(table)
    }

    /// Durably checkpoints the current version: serialize to
    /// `MANIFEST.tmp`, fsync, rename over `MANIFEST`. The rename is the
    /// commit point for every structural change.
    pub fn checkpoint(&self) -> Result<()> {
        let version = self.current();
        let tmp_path = paths::manifest_tmp_path(&self.root);

        let json = serde_json::to_vec_pretty(&*version)
            .map_err(|e| Error::Corruption(format!("manifest encode: {e}")))?;

        {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }

        fs::rename(&tmp_path, paths::manifest_path(&self.root))?;
        Ok(())
    }

    /// Reads a checkpoint back into a [`Version`].
    pub fn read_manifest(path: &Path) -> Result<Version> {
        let data = fs::read(path)?;
        serde_json::from_slice(&data).map_err(|e| {
            Error::Corruption(format!("manifest {} unreadable: {e}", path.display()))
        })
    }

    /// Drops every cached table handle (part of database close).
    pub fn close(&self) {
        self.tables.lock().clear();
    }
}
