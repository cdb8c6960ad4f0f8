//! # SSTable — Sorted String Table
//!
//! Immutable, on-disk files of sorted, key-unique entries. When the active
//! memtable crosses its flush threshold the engine streams it through
//! [`write_table`] into a new L0 table; tables are *write-once, read-many*
//! and only ever retired by a manifest edit.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ DATA BLOCKS                                                   │
//! │                                                               │
//! │   block 0: ≤ BLOCK_CAP framed entries (codec frame, sorted)   │
//! │   block 1: ...                                                │
//! │   block N-1: final block, possibly short                      │
//! ├───────────────────────────────────────────────────────────────┤
//! │ FILTER REGION (may be empty)                                  │
//! │                                                               │
//! │   serialized bloom filter; empty region means "no filter",    │
//! │   i.e. filter_offset == index_offset                          │
//! ├───────────────────────────────────────────────────────────────┤
//! │ INDEX REGION                                                  │
//! │                                                               │
//! │   u64 num_entries, then per data block:                       │
//! │   u64 block_offset | u64 key_len | first key in block         │
//! ├───────────────────────────────────────────────────────────────┤
//! │ FOOTER (always the last 24 bytes)                             │
//! │                                                               │
//! │   u64 filter_offset | u64 index_offset                        │
//! │   u32 entry_count   | u32 magic "EST1"                        │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. Blocks are plain concatenations of entry
//! frames — no compression, no key prefix encoding, no restart points.
//!
//! ## Reading
//!
//! [`Table::open`] reads the footer, loads the whole index (and the filter,
//! when present) into memory, and keeps the file handle for point reads.
//! A lookup touches at most one block, fetched through the shared
//! [`BlockCache`] when one is attached. [`Table::iter`] scans the data
//! region on a separately opened handle so full scans never contend with
//! point reads.

mod block;
mod cache;
mod format;
mod index;
mod reader;
mod writer;

pub use block::Block;
pub use cache::BlockCache;
pub use format::{Footer, BLOCK_CAP, FOOTER_LEN, TABLE_MAGIC};
pub use index::{Index, IndexEntry};
pub use reader::{Table, TableIter};
pub use writer::{write_table, TableSummary};

use codec::CodecError;
use thiserror::Error;

/// Errors for table writing and reading.
#[derive(Debug, Error)]
pub enum TableError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The file contents do not decode as a valid table.
    #[error("corrupt table: {0}")]
    Corruption(String),

    /// The writer was fed keys that are not strictly ascending and unique.
    #[error("entries out of order at key {key:?}")]
    OutOfOrder { key: Vec<u8> },
}

impl From<CodecError> for TableError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Io(io) => TableError::Io(io),
            CodecError::IncompleteEntry => {
                TableError::Corruption("torn entry frame inside data region".into())
            }
            CodecError::UnknownEntryType(tag) => {
                TableError::Corruption(format!("unknown entry type tag {tag:#04x}"))
            }
        }
    }
}

#[cfg(test)]
mod tests;
