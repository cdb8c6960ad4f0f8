//! # WAL — Write-Ahead Log
//!
//! Crash-safe durability for the EmberKV storage engine. Each active
//! memtable owns exactly one WAL file; a batch of entries is appended and
//! fsynced **before** the memtable is updated, so every acknowledged write
//! survives a crash.
//!
//! ## On-disk format
//!
//! A WAL file is a bare concatenation of [`codec`] entry frames — no
//! per-record header beyond the frame itself. Within a file, entries appear
//! in strictly increasing `seq` order (the group-commit loop stamps them
//! that way).
//!
//! ## Torn tails
//!
//! A crash mid-append can leave a partial frame at the end of the file.
//! [`Wal::iter`] surfaces that as [`CodecError::IncompleteEntry`] so the
//! caller can apply the stop-at-first-torn-frame recovery policy.
//! [`Wal::open`] truncates the torn suffix back to the last complete frame
//! before allowing further appends — appending past a torn frame would make
//! every later entry undecodable on the next recovery.
//!
//! ## Example
//!
//! ```rust,no_run
//! use codec::Entry;
//! use wal::Wal;
//!
//! let mut wal = Wal::create("0.log").unwrap();
//! let mut e = Entry::put(b"hello".to_vec(), b"world".to_vec());
//! e.seq = 1;
//! wal.write_entries(std::slice::from_ref(&e)).unwrap();
//! for entry in wal.iter().unwrap() {
//!     println!("{:?}", entry.unwrap());
//! }
//! ```

use codec::{read_entry, CodecError, Entry};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur during WAL operations.
#[derive(Debug, Error)]
pub enum WalError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A frame failed to decode (torn tail or bad type tag).
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Append was attempted after [`Wal::close`].
    #[error("wal is closed: {0}")]
    Closed(PathBuf),
}

/// Append-only log of entry frames.
///
/// Batches are serialized into an internal scratch buffer and written with a
/// single `write_all`, then made durable with `sync_all` before the call
/// returns. Either every entry in the batch is durable or the call errors;
/// a torn frame on the medium is handled at recovery, not here.
pub struct Wal {
    file: Option<File>,
    path: PathBuf,
    entries: usize,
    /// Reusable scratch buffer so appends do not allocate per batch.
    buf: Vec<u8>,
}

impl Wal {
    /// Creates (or truncates) the WAL file at `path`, ready for append.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        Ok(Self {
            file: Some(file),
            path,
            entries: 0,
            buf: Vec::with_capacity(4096),
        })
    }

    /// Opens an existing WAL for append (the recovery path).
    ///
    /// The file is scanned once to count complete entries. If the scan finds
    /// a torn trailing frame, the file is truncated back to the end of the
    /// last complete frame; every complete entry is retained.
    ///
    /// # Errors
    ///
    /// Returns [`WalError::Io`] if the file does not exist or cannot be
    /// read, and propagates decode errors other than a torn tail.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();

        let (entries, valid_len, torn) = scan(&path)?;
        if torn {
            warn!(
                path = %path.display(),
                valid_len,
                "truncating torn trailing frame from wal"
            );
            let f = OpenOptions::new().write(true).open(&path)?;
            f.set_len(valid_len)?;
            f.sync_all()?;
        }

        let file = OpenOptions::new().append(true).open(&path)?;
        Ok(Self {
            file: Some(file),
            path,
            entries,
            buf: Vec::with_capacity(4096),
        })
    }

    /// Appends a batch of entries and fsyncs.
    ///
    /// The whole batch is framed into one buffer and handed to the kernel in
    /// a single `write_all`, then `sync_all` makes it durable. On any error
    /// the caller must treat the entire batch as failed.
    pub fn write_entries(&mut self, batch: &[Entry]) -> Result<(), WalError> {
        if batch.is_empty() {
            return Ok(());
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| WalError::Closed(self.path.clone()))?;

        self.buf.clear();
        for entry in batch {
            entry.encode(&mut self.buf)?;
        }

        io::Write::write_all(file, &self.buf)?;
        file.sync_all()?;
        self.entries += batch.len();
        Ok(())
    }

    /// Returns a forward iterator over all entries, from offset 0.
    ///
    /// The iterator owns a separately opened read handle, so iteration never
    /// disturbs the append position. It stops cleanly at EOF; a torn tail
    /// yields one final `Err(CodecError::IncompleteEntry)`.
    pub fn iter(&self) -> Result<WalIter, WalError> {
        WalIter::open(&self.path)
    }

    /// Number of complete entries in this WAL.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
    }

    /// Returns `true` if the WAL holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Forces buffered data to stable storage.
    pub fn sync(&mut self) -> Result<(), WalError> {
        if let Some(file) = self.file.as_mut() {
            file.sync_all()?;
        }
        Ok(())
    }

    /// Syncs and releases the file handle. Idempotent.
    pub fn close(&mut self) -> Result<(), WalError> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }
        Ok(())
    }
}

/// Forward reader over a WAL file.
pub struct WalIter {
    reader: BufReader<File>,
    done: bool,
}

impl WalIter {
    fn open(path: &Path) -> Result<Self, WalError> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            done: false,
        })
    }
}

impl Iterator for WalIter {
    type Item = Result<Entry, WalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match read_entry(&mut self.reader) {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}

/// Scans `path`, returning `(complete_entries, valid_byte_len, torn_tail)`.
fn scan(path: &Path) -> Result<(usize, u64, bool), WalError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut entries = 0usize;
    let mut valid_len = 0u64;
    loop {
        match read_entry(&mut reader) {
            Ok(Some(entry)) => {
                entries += 1;
                valid_len += entry.encoded_len() as u64;
            }
            Ok(None) => return Ok((entries, valid_len, false)),
            Err(CodecError::IncompleteEntry) => return Ok((entries, valid_len, true)),
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests;
