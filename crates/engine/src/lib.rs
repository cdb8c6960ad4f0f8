//! # Engine — the EmberKV storage engine
//!
//! Ties the [`codec`], [`wal`], [`memtable`], and [`sstable`] crates into a
//! complete embedded LSM-tree key-value store: durable `put`/`delete` and
//! point `get` over opaque byte strings, last-writer-wins under one
//! monotonically increasing sequence number.
//!
//! ## Architecture
//!
//! ```text
//! clients (any thread)
//!   │  put/delete → request channel ─┐        get ──────────────┐
//!   ▼                                ▼                          ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            Db                                    │
//! │                                                                  │
//! │  group-commit worker (single thread):                            │
//! │    collect batch → [flush if memtable full] → assign seqs        │
//! │    → WAL append + fsync → memtable apply → ack every requester   │
//! │                                                                  │
//! │  flush: memtable ──write_table──► sstable/0/<n>.sst              │
//! │         new wal/<n>.log, manifest edit, checkpoint (commit),     │
//! │         swap in fresh memtable                                   │
//! │                                                                  │
//! │  read: memtable → L0 newest-first → L1, L2, ... (first hit wins, │
//! │        tombstones answer "not found")                            │
//! └──────────────────────────────────────────────────────────────────┘
//!                               │
//!                      Manifest (Version snapshots,
//!                      MANIFEST checkpoint, table + block caches)
//! ```
//!
//! ## Locking
//!
//! One `RwLock` guards the mutable trio `{wal, memtable, next_seq}`. The
//! worker takes it exclusively per batch; readers take it shared just long
//! enough to probe the memtable and snapshot the current [`Version`]. A
//! version is immutable after publication, so reads proceed against tables
//! without any lock. That pairing gives the two guarantees that matter:
//! a `get` observes every write acknowledged before it started, and a
//! `get` never sees a half-applied flush.
//!
//! ## Crash safety
//!
//! Every acknowledged write is fsynced in the WAL before the memtable
//! changes. New table and WAL files are fsynced before the manifest
//! references them, and the `MANIFEST` rename is the single commit point;
//! files the manifest does not reference are orphans and are swept at the
//! next open.

mod error;
mod manifest;
mod options;
pub mod paths;
mod read;
mod recovery;
mod write;

pub use error::{Error, Result};
pub use manifest::{FileMeta, Manifest, Version, VersionEdit};
pub use options::Options;

pub use codec::{Entry, EntryType, FileNo};

use crossbeam_channel::Sender;
use memtable::Memtable;
use parking_lot::{Mutex, RwLock};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{info, warn};
use wal::Wal;
use write::WorkerMsg;

/// Handle to an open database.
///
/// `Db` is `Sync`: share it across threads by reference (or wrap it in an
/// `Arc`). Writes from any thread funnel into the group-commit worker;
/// reads run concurrently under a shared lock. Dropping the handle runs
/// [`Db::close`].
pub struct Db {
    pub(crate) inner: Arc<DbInner>,
}

pub(crate) struct DbInner {
    pub(crate) opts: Options,
    pub(crate) manifest: Manifest,
    pub(crate) state: RwLock<DbState>,
    /// Taken (set to `None`) by `close` so late writers fail fast.
    pub(crate) write_tx: Mutex<Option<Sender<WorkerMsg>>>,
    pub(crate) worker: Mutex<Option<JoinHandle<()>>>,
    pub(crate) closed: AtomicBool,
}

/// The mutable trio guarded by the DB write lock.
pub(crate) struct DbState {
    pub(crate) wal: Wal,
    pub(crate) memtable: Memtable,
    pub(crate) next_seq: u64,
}

impl Db {
    /// Opens (or creates) a database at `opts.db_path` and recovers it.
    ///
    /// # Recovery steps
    ///
    /// 1. Create `wal/` and `sstable/<level>/` directories as needed.
    /// 2. If `MANIFEST` exists: load the [`Version`], reopen its WAL for
    ///    append, replay the WAL into a fresh memtable, and recover
    ///    `next_seq` as the maximum sequence across the WAL *and* every
    ///    referenced table (a freshly rotated WAL is empty, so the WAL
    ///    alone under-counts).
    /// 3. Otherwise: publish an empty version, create `wal/0.log`, and
    ///    checkpoint.
    /// 4. Sweep files the version does not reference.
    /// 5. Start the group-commit worker.
    pub fn open(opts: Options) -> Result<Db> {
        fs::create_dir_all(&opts.db_path)?;
        fs::create_dir_all(paths::wal_dir(&opts.db_path))?;
        for level in 0..=opts.max_sstable_level {
            fs::create_dir_all(paths::sstable_dir(&opts.db_path, level))?;
        }

        let manifest = Manifest::new(
            opts.db_path.clone(),
            opts.max_sstable_level + 1,
            opts.block_cache_capacity,
        );
        let manifest_file = paths::manifest_path(&opts.db_path);

        let (wal, memtable, next_seq) = if manifest_file.exists() {
            let version = Manifest::read_manifest(&manifest_file)?;
            manifest.load_version(version.clone());

            let wal = Wal::open(paths::wal_path(&opts.db_path, version.current_wal))?;
            let mut memtable = Memtable::new();
            let wal_seq = recovery::replay_wal(&wal, &mut memtable)?;
            let table_seq = recovery::max_table_seq(&manifest)?;
            let next_seq = wal_seq.max(table_seq);

            info!(
                current_wal = version.current_wal,
                replayed = memtable.len(),
                next_seq,
                "recovered database"
            );
            (wal, memtable, next_seq)
        } else {
            let wal = Wal::create(paths::wal_path(&opts.db_path, 0))?;
            manifest.set_wal(0);
            manifest.checkpoint()?;
            info!(path = %opts.db_path.display(), "initialized fresh database");
            (wal, Memtable::new(), 0)
        };

        recovery::sweep_orphans(&opts.db_path, &manifest.current());

        let (tx, rx) = crossbeam_channel::unbounded();
        let inner = Arc::new(DbInner {
            opts,
            manifest,
            state: RwLock::new(DbState {
                wal,
                memtable,
                next_seq,
            }),
            write_tx: Mutex::new(Some(tx)),
            worker: Mutex::new(None),
            closed: AtomicBool::new(false),
        });

        let worker_inner = Arc::clone(&inner);
        let handle = thread::Builder::new()
            .name("emberkv-commit".into())
            .spawn(move || write::commit_loop(worker_inner, rx))?;
        *inner.worker.lock() = Some(handle);

        Ok(Db { inner })
    }

    /// Shuts the database down: stops the worker (queued requests fail with
    /// [`Error::Closed`]), syncs and closes the WAL, and drops cached table
    /// handles. Idempotent; also run by `Drop`.
    pub fn close(&self) -> Result<()> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(tx) = self.inner.write_tx.lock().take() {
            let _ = tx.send(WorkerMsg::Shutdown);
        }
        if let Some(handle) = self.inner.worker.lock().take() {
            let _ = handle.join();
        }

        let mut state = self.inner.state.write();
        state.wal.close()?;
        drop(state);

        self.inner.manifest.close();
        info!("database closed");
        Ok(())
    }

    // ---- Introspection (the contract external inspection tools use) ----

    /// Distinct keys currently buffered in the memtable.
    #[must_use]
    pub fn memtable_len(&self) -> usize {
        self.inner.state.read().memtable.len()
    }

    /// A copy of the memtable's entries in ascending key order.
    #[must_use]
    pub fn memtable_snapshot(&self) -> Vec<Entry> {
        self.inner.state.read().memtable.iter().cloned().collect()
    }

    /// File number of the WAL currently receiving appends.
    #[must_use]
    pub fn current_wal(&self) -> FileNo {
        self.inner.manifest.current().current_wal
    }

    /// An immutable snapshot of the manifest state.
    #[must_use]
    pub fn version(&self) -> Arc<Version> {
        self.inner.manifest.current()
    }

    /// Highest sequence number committed so far.
    #[must_use]
    pub fn last_seq(&self) -> u64 {
        self.inner.state.read().next_seq
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.inner.opts
    }
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let version = self.inner.manifest.current();
        f.debug_struct("Db")
            .field("db_path", &self.inner.opts.db_path)
            .field("closed", &self.inner.closed.load(Ordering::SeqCst))
            .field("memtable_len", &self.memtable_len())
            .field("last_seq", &self.last_seq())
            .field("current_wal", &version.current_wal)
            .field(
                "tables",
                &version
                    .levels
                    .iter()
                    .map(|files| files.len())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Drop for Db {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "error while closing database on drop");
        }
    }
}

#[cfg(test)]
mod tests;
