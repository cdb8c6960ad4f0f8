//! Write path: client-facing `put`/`delete`, the group-commit worker, and
//! the flush subroutine.
//!
//! Clients never touch the WAL or memtable directly. Each write becomes a
//! request carrying its entry and a reply channel; the single worker thread
//! drains the request channel into batches and commits every batch with one
//! WAL fsync. Sequence numbers are assigned in arrival order inside a
//! batch, and later batches strictly dominate earlier ones.

use crate::error::{Error, Result};
use crate::manifest::{FileMeta, VersionEdit};
use crate::{paths, recovery, Db, DbInner, DbState};
use codec::Entry;
use crossbeam_channel::{bounded, Receiver, Sender};
use memtable::Memtable;
use sstable::write_table;
use std::mem;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use wal::Wal;

pub(crate) enum WorkerMsg {
    Write(WriteRequest),
    Shutdown,
}

pub(crate) struct WriteRequest {
    pub entry: Entry,
    pub reply: Sender<Result<()>>,
}

impl Db {
    /// Durably stores `key = value`.
    ///
    /// Blocks until the group-commit worker has fsynced the entry (or
    /// failed the batch). Rejects an empty key with
    /// [`Error::InvalidArgument`].
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.submit(Entry::put(key.to_vec(), value.to_vec()))
    }

    /// Durably records a tombstone for `key`. Deleting an absent key is not
    /// an error — the tombstone still shadows anything older below.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.submit(Entry::delete(key.to_vec()))
    }

    fn submit(&self, entry: Entry) -> Result<()> {
        if entry.key.is_empty() {
            return Err(Error::InvalidArgument("key must be non-empty".into()));
        }
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(Error::Closed);
        }

        let (reply_tx, reply_rx) = bounded(1);
        {
            let guard = self.inner.write_tx.lock();
            let Some(tx) = guard.as_ref() else {
                return Err(Error::Closed);
            };
            tx.send(WorkerMsg::Write(WriteRequest {
                entry,
                reply: reply_tx,
            }))
            .map_err(|_| Error::Closed)?;
        }

        // A dropped reply means the worker shut down mid-flight.
        reply_rx.recv().map_err(|_| Error::Closed)?
    }
}

/// The group-commit loop. Runs on its own thread until shutdown.
pub(crate) fn commit_loop(inner: Arc<DbInner>, rx: Receiver<WorkerMsg>) {
    loop {
        let first = match rx.recv() {
            Ok(msg) => msg,
            Err(_) => return,
        };

        let mut batch = Vec::with_capacity(inner.opts.max_batch_size);
        let mut shutdown = match first {
            WorkerMsg::Write(req) => {
                batch.push(req);
                false
            }
            WorkerMsg::Shutdown => true,
        };

        if !shutdown {
            shutdown = collect_batch(&inner, &rx, &mut batch);
            inner.commit_batch(batch);
        }

        if shutdown {
            drain_closed(&rx);
            return;
        }
    }
}

/// Fills `batch` up to `max_batch_size`: everything already queued, then —
/// when a batch timeout is configured — whatever arrives before the
/// deadline. Returns `true` if a shutdown message was seen.
fn collect_batch(
    inner: &DbInner,
    rx: &Receiver<WorkerMsg>,
    batch: &mut Vec<WriteRequest>,
) -> bool {
    let timeout = inner.opts.batch_timeout;
    let deadline = Instant::now() + timeout;

    while batch.len() < inner.opts.max_batch_size {
        let msg = if timeout.is_zero() {
            match rx.try_recv() {
                Ok(msg) => msg,
                Err(_) => break,
            }
        } else {
            let now = Instant::now();
            if now >= deadline {
                match rx.try_recv() {
                    Ok(msg) => msg,
                    Err(_) => break,
                }
            } else {
                match rx.recv_timeout(deadline - now) {
                    Ok(msg) => msg,
                    Err(_) => break,
                }
            }
        };

        match msg {
            WorkerMsg::Write(req) => batch.push(req),
            WorkerMsg::Shutdown => return true,
        }
    }
    false
}

/// After shutdown, fail everything still queued. `close()` has dropped its
/// sender; once in-flight clones are gone the channel disconnects and the
/// loop ends.
fn drain_closed(rx: &Receiver<WorkerMsg>) {
    loop {
        match rx.recv() {
            Ok(WorkerMsg::Write(req)) => {
                let _ = req.reply.send(Err(Error::Closed));
            }
            Ok(WorkerMsg::Shutdown) => {}
            Err(_) => return,
        }
    }
}

impl DbInner {
    /// Commits one batch under the DB write lock:
    /// flush-if-due → assign seqs → WAL append+fsync → memtable apply → ack.
    fn commit_batch(&self, batch: Vec<WriteRequest>) {
        let mut state = self.state.write();

        if state.memtable.len() >= self.opts.memtable_flush_threshold {
            if let Err(e) = self.flush_locked(&mut state) {
                drop(state);
                warn!(error = %e, "memtable flush failed; failing batch");
                for req in batch {
                    let _ = req.reply.send(Err(e.duplicate()));
                }
                return;
            }
        }

        let mut entries = Vec::with_capacity(batch.len());
        let mut replies = Vec::with_capacity(batch.len());
        for req in batch {
            state.next_seq += 1;
            let mut entry = req.entry;
            entry.seq = state.next_seq;
            entries.push(entry);
            replies.push(req.reply);
        }

        if let Err(e) = state.wal.write_entries(&entries) {
            // Memtable untouched; the burned sequence numbers keep the
            // counter monotonic.
            drop(state);
            let e = Error::from(e);
            warn!(error = %e, "wal append failed; failing batch");
            for reply in replies {
                let _ = reply.send(Err(e.duplicate()));
            }
            return;
        }

        for entry in entries {
            state.memtable.apply(entry);
        }
        drop(state);

        debug!(batch = replies.len(), "batch committed");
        for reply in replies {
            let _ = reply.send(Ok(()));
        }
    }

    /// Flushes the memtable to a new L0 table and rotates the WAL. Runs
    /// under the DB write lock.
    ///
    /// All fallible work happens *before* any state mutation, so a failure
    /// at any point leaves the pre-flush memtable and WAL fully usable:
    ///
    /// 1. Stream the memtable into `sstable/0/<next_sst_no>.sst` (fsynced,
    ///    atomically renamed into place).
    /// 2. Create WAL `<next_wal_no>.log`.
    /// 3. Publish the new version (`set_wal` + L0 add) and checkpoint —
    ///    the commit point. A checkpoint failure rolls the published
    ///    pointer back and deletes the two orphan files.
    /// 4. Swap in the new WAL and an empty memtable; retire the old WAL
    ///    and sweep files the new version no longer references.
    pub(crate) fn flush_locked(&self, state: &mut DbState) -> Result<()> {
        let prev = self.manifest.current();
        let sst_no = prev.next_sst_no;
        let new_wal_no = prev.next_wal_no;

        let sst_path = paths::sstable_path(&self.opts.db_path, 0, sst_no);
        let summary = write_table(
            &sst_path,
            state.memtable.iter().cloned(),
            state.memtable.len(),
            Some(self.opts.bloom_filter_fpr),
        )?;

        let new_wal = match Wal::create(paths::wal_path(&self.opts.db_path, new_wal_no)) {
            Ok(wal) => wal,
            Err(e) => {
                let _ = std::fs::remove_file(&sst_path);
                return Err(e.into());
            }
        };

        self.manifest.set_wal(new_wal_no);
        self.manifest.apply(&VersionEdit::add_l0(FileMeta {
            file_no: sst_no,
            smallest_key: summary.smallest_key,
            largest_key: summary.largest_key,
        }));
        if let Err(e) = self.manifest.checkpoint() {
            self.manifest.load_version((*prev).clone());
            let _ = std::fs::remove_file(&sst_path);
            let _ = std::fs::remove_file(paths::wal_path(&self.opts.db_path, new_wal_no));
            return Err(e);
        }

        let mut old_wal = mem::replace(&mut state.wal, new_wal);
        state.memtable = Memtable::new();
        if let Err(e) = old_wal.close() {
            warn!(error = %e, "closing retired wal failed");
        }

        recovery::sweep_wals(&self.opts.db_path, &self.manifest.current());

        info!(
            sst_no,
            new_wal_no,
            entries = summary.entry_count,
            bytes = summary.bytes_written,
            "flushed memtable to L0"
        );
        Ok(())
    }
}
