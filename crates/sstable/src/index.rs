//! In-memory block index: one entry per data block, sorted by first key.

use crate::TableError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Maximum key length accepted while parsing an index. Guards allocation
/// against a corrupt length field.
const MAX_INDEX_KEY_BYTES: u64 = 64 * 1024 * 1024;

/// Locates one data block: its byte offset and the first key it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub block_offset: u64,
    pub key: Vec<u8>,
}

/// The parsed index region. Entries are in ascending `key` order, one per
/// data block, and `entries[0].key` equals the table's smallest key.
#[derive(Debug, Default)]
pub struct Index {
    entries: Vec<IndexEntry>,
}

impl Index {
    pub fn new(entries: Vec<IndexEntry>) -> Self {
        Self { entries }
    }

    /// Returns the position of the block that may contain `key`: the
    /// greatest entry whose first key is `<= key`. `None` when the index is
    /// empty or `key` sorts before the first block.
    #[must_use]
    pub fn find_block(&self, key: &[u8]) -> Option<usize> {
        let after = self
            .entries
            .partition_point(|e| e.key.as_slice() <= key);
        after.checked_sub(1)
    }

    #[must_use]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serializes the region: `u64 num_entries`, then per entry
    /// `u64 block_offset | u64 key_len | key`.
    pub fn write_to<W: Write>(w: &mut W, entries: &[IndexEntry]) -> std::io::Result<()> {
        w.write_u64::<LittleEndian>(entries.len() as u64)?;
        for entry in entries {
            w.write_u64::<LittleEndian>(entry.block_offset)?;
            w.write_u64::<LittleEndian>(entry.key.len() as u64)?;
            w.write_all(&entry.key)?;
        }
        Ok(())
    }

    /// Parses an index region.
    ///
    /// # Errors
    ///
    /// [`TableError::Corruption`] on implausible lengths or a misordered
    /// index.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, TableError> {
        let count = r.read_u64::<LittleEndian>()?;
        let mut entries: Vec<IndexEntry> = Vec::with_capacity(count.min(1 << 20) as usize);

        for i in 0..count {
            let block_offset = r.read_u64::<LittleEndian>()?;
            let key_len = r.read_u64::<LittleEndian>()?;
            if key_len > MAX_INDEX_KEY_BYTES {
                return Err(TableError::Corruption(format!(
                    "index entry {i}: key_len {key_len} exceeds cap"
                )));
            }
            let mut key = vec![0u8; key_len as usize];
            r.read_exact(&mut key)?;

            if let Some(prev) = entries.last() {
                if prev.key >= key || prev.block_offset >= block_offset {
                    return Err(TableError::Corruption(format!(
                        "index entry {i}: not strictly ascending"
                    )));
                }
            }
            entries.push(IndexEntry { block_offset, key });
        }

        Ok(Self { entries })
    }
}
