//! A parsed data block: an immutable, sorted run of entries.

use crate::TableError;
use codec::{read_entry, Entry};
use std::io::Cursor;

/// One data block, decoded into memory. Blocks are the unit of I/O for
/// point lookups and the unit of sharing in the block cache, so they are
/// immutable once parsed.
#[derive(Debug)]
pub struct Block {
    entries: Vec<Entry>,
}

impl Block {
    /// Decodes the raw block bytes by reading entry frames until the data
    /// runs out cleanly.
    ///
    /// # Errors
    ///
    /// A frame that ends mid-read is [`TableError::Corruption`] — unlike a
    /// WAL tail, a block can never legitimately contain a torn frame.
    pub fn parse(data: &[u8]) -> Result<Self, TableError> {
        let mut cursor = Cursor::new(data);
        let mut entries = Vec::new();
        while let Some(entry) = read_entry(&mut cursor)? {
            entries.push(entry);
        }
        Ok(Self { entries })
    }

    /// Binary search for `key`. Returns the entry (which may be a
    /// tombstone) or `None` if the key is not in this block.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&Entry> {
        self.entries
            .binary_search_by(|e| e.key.as_slice().cmp(key))
            .ok()
            .map(|i| &self.entries[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}
