//! # Codec — Entry Model and Binary Framing
//!
//! The [`Entry`] is the unit that flows through every EmberKV component:
//! the WAL appends framed entries, the memtable holds the latest entry per
//! key, and SSTable data blocks are plain concatenations of the same frame.
//!
//! ## Entry frame
//!
//! All integers are little-endian, fixed width:
//!
//! ```text
//! u8  type       0 = Put, 1 = Delete
//! u64 seq
//! u32 key_len
//! u32 value_len  0 is legal for both Put (empty value) and Delete
//! bytes key
//! bytes value
//! ```
//!
//! ## EOF semantics
//!
//! [`read_entry`] distinguishes three outcomes, and WAL recovery depends on
//! the distinction:
//!
//! - clean EOF on the very first byte → `Ok(None)` (stream ended),
//! - any short read after the first byte → [`CodecError::IncompleteEntry`]
//!   (a torn frame, e.g. a crash mid-append),
//! - otherwise a fully decoded entry.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use thiserror::Error;

/// Identifies a WAL or SSTable file. Allocated by the manifest, never reused.
pub type FileNo = u64;

/// Fixed part of the entry frame: type(1) + seq(8) + key_len(4) + value_len(4).
pub const ENTRY_HEADER_LEN: usize = 1 + 8 + 4 + 4;

/// Errors produced while encoding or decoding entry frames.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An underlying I/O failure (not a length issue).
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The stream ended in the middle of a frame. Recovery policy decides
    /// whether this is tolerable (WAL tail) or corruption (block body).
    #[error("incomplete entry: unexpected end of data")]
    IncompleteEntry,

    /// The frame's type tag is neither Put nor Delete.
    #[error("unknown entry type tag: {0:#04x}")]
    UnknownEntryType(u8),
}

/// Logical operation carried by an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EntryType {
    Put = 0,
    Delete = 1,
}

impl TryFrom<u8> for EntryType {
    type Error = CodecError;

    fn try_from(tag: u8) -> Result<Self, CodecError> {
        match tag {
            0 => Ok(EntryType::Put),
            1 => Ok(EntryType::Delete),
            other => Err(CodecError::UnknownEntryType(other)),
        }
    }
}

/// A single mutation in sequence order.
///
/// `value` is empty for tombstones; `etype` disambiguates an empty-value Put
/// from a Delete. Entries are immutable once committed — the engine stamps
/// `seq` exactly once, before the WAL append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub etype: EntryType,
    pub seq: u64,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Entry {
    /// Builds a Put entry. `seq` is stamped later by the commit loop.
    pub fn put(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self {
            etype: EntryType::Put,
            seq: 0,
            key,
            value,
        }
    }

    /// Builds a tombstone for `key`.
    pub fn delete(key: Vec<u8>) -> Self {
        Self {
            etype: EntryType::Delete,
            seq: 0,
            key,
            value: Vec::new(),
        }
    }

    /// Returns `true` if this entry is a tombstone.
    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.etype == EntryType::Delete
    }

    /// Size of this entry's frame on disk.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        ENTRY_HEADER_LEN + self.key.len() + self.value.len()
    }

    /// Writes the entry frame to `w`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Io`] on any write failure.
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<usize, CodecError> {
        w.write_u8(self.etype as u8)?;
        w.write_u64::<LittleEndian>(self.seq)?;
        w.write_u32::<LittleEndian>(self.key.len() as u32)?;
        w.write_u32::<LittleEndian>(self.value.len() as u32)?;
        w.write_all(&self.key)?;
        w.write_all(&self.value)?;
        Ok(self.encoded_len())
    }
}

/// Reads one entry frame from `r`.
///
/// Returns `Ok(None)` on a clean EOF at the first byte. Any EOF after that
/// point means the frame was torn and yields
/// [`CodecError::IncompleteEntry`]; callers must not treat a torn frame as a
/// clean end of stream.
pub fn read_entry<R: Read>(r: &mut R) -> Result<Option<Entry>, CodecError> {
    // First byte decides "stream ended" vs "torn frame".
    let tag = match r.read_u8() {
        Ok(tag) => tag,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(CodecError::Io(e)),
    };
    let etype = EntryType::try_from(tag)?;

    let seq = read_or_incomplete(r.read_u64::<LittleEndian>())?;
    let key_len = read_or_incomplete(r.read_u32::<LittleEndian>())? as usize;
    let value_len = read_or_incomplete(r.read_u32::<LittleEndian>())? as usize;

    let mut key = vec![0u8; key_len];
    fill_or_incomplete(r, &mut key)?;

    let mut value = vec![0u8; value_len];
    fill_or_incomplete(r, &mut value)?;

    Ok(Some(Entry {
        etype,
        seq,
        key,
        value,
    }))
}

fn read_or_incomplete<T>(res: io::Result<T>) -> Result<T, CodecError> {
    res.map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            CodecError::IncompleteEntry
        } else {
            CodecError::Io(e)
        }
    })
}

fn fill_or_incomplete<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<(), CodecError> {
    read_or_incomplete(r.read_exact(buf))
}
