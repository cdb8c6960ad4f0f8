//! Table reader: point lookups through the index and block cache, plus a
//! full-scan iterator on its own file handle.

use crate::cache::BlockCache;
use crate::format::{Footer, FOOTER_LEN};
use crate::index::Index;
use crate::{Block, TableError};
use bloom::Bloom;
use codec::{read_entry, CodecError, Entry, FileNo};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An open, immutable sorted table.
///
/// Opening is O(footer + index): the footer is validated, the index and the
/// optional filter are loaded into memory once, and the file handle is
/// retained behind a mutex so `get` works through `&self`. Per-lookup
/// allocation is bounded by one block.
pub struct Table {
    path: PathBuf,
    file: Mutex<File>,
    file_no: FileNo,
    footer: Footer,
    index: Index,
    filter: Option<Bloom>,
    cache: Option<Arc<BlockCache>>,
}

impl Table {
    /// Opens the table at `path`.
    ///
    /// `file_no` keys this table's blocks in the shared cache; pass the
    /// manifest-allocated number, which is unique for the lifetime of the
    /// database.
    ///
    /// # Errors
    ///
    /// [`TableError::Corruption`] for a bad footer, filter, or index;
    /// [`TableError::Io`] on filesystem failure.
    pub fn open<P: AsRef<Path>>(
        path: P,
        file_no: FileNo,
        cache: Option<Arc<BlockCache>>,
    ) -> Result<Self, TableError> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;

        let (footer, file_size) = Footer::read_from(&mut file)
            .map_err(|e| with_path(e, &path))?;

        let filter = if footer.index_offset > footer.filter_offset {
            file.seek(SeekFrom::Start(footer.filter_offset))?;
            let mut region = (&mut file).take(footer.index_offset - footer.filter_offset);
            let bloom = Bloom::read_from(&mut region).map_err(|e| {
                TableError::Corruption(format!(
                    "{}: filter region unreadable: {e}",
                    path.display()
                ))
            })?;
            Some(bloom)
        } else {
            None
        };

        file.seek(SeekFrom::Start(footer.index_offset))?;
        let mut region = (&mut file).take(file_size - FOOTER_LEN - footer.index_offset);
        let index = Index::read_from(&mut region).map_err(|e| with_path(e, &path))?;

        if let Some(last) = index.entries().last() {
            if last.block_offset >= footer.filter_offset {
                return Err(TableError::Corruption(format!(
                    "{}: index points past the data region",
                    path.display()
                )));
            }
        }

        Ok(Self {
            path,
            file: Mutex::new(file),
            file_no,
            footer,
            index,
            filter,
            cache,
        })
    }

    /// Point lookup. Returns the entry for `key` — possibly a tombstone,
    /// which the caller interprets — or `None` if this table does not
    /// contain the key.
    ///
    /// The filter, when present, short-circuits definite misses before any
    /// block is touched.
    pub fn get(&self, key: &[u8]) -> Result<Option<Entry>, TableError> {
        if let Some(filter) = &self.filter {
            if !filter.may_contain(key) {
                return Ok(None);
            }
        }

        let Some(block_no) = self.index.find_block(key) else {
            return Ok(None);
        };

        let block = self.read_block(block_no)?;
        Ok(block.get(key).cloned())
    }

    /// Fetches block `block_no`, through the cache when one is attached.
    fn read_block(&self, block_no: usize) -> Result<Arc<Block>, TableError> {
        if let Some(cache) = &self.cache {
            if let Some(block) = cache.get(self.file_no, block_no) {
                return Ok(block);
            }
        }

        let start = self.index.entries()[block_no].block_offset;
        let end = self
            .index
            .entries()
            .get(block_no + 1)
            .map(|e| e.block_offset)
            .unwrap_or(self.footer.filter_offset);
        let mut raw = vec![0u8; (end - start) as usize];

        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(start))?;
            file.read_exact(&mut raw)?;
        }

        let block = Block::parse(&raw).map_err(|e| {
            TableError::Corruption(format!(
                "{}: block {block_no} at offset {start}: {e}",
                self.path.display()
            ))
        })?;
        let block = Arc::new(block);

        if let Some(cache) = &self.cache {
            cache.put(self.file_no, block_no, Arc::clone(&block));
        }
        Ok(block)
    }

    /// Full scan over the data region, ascending by key.
    ///
    /// The iterator opens its own read handle so a long scan never blocks
    /// concurrent point lookups on this table.
    pub fn iter(&self) -> Result<TableIter, TableError> {
        let file = File::open(&self.path)?;
        Ok(TableIter {
            reader: BufReader::new(file).take(self.footer.filter_offset),
            path: self.path.clone(),
            done: false,
        })
    }

    /// Total entries, straight from the footer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.footer.entry_count as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.footer.entry_count == 0
    }

    #[must_use]
    pub fn file_no(&self) -> FileNo {
        self.file_no
    }

    #[must_use]
    pub fn footer(&self) -> Footer {
        self.footer
    }

    /// Number of data blocks (same as the index length).
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn with_path(e: TableError, path: &Path) -> TableError {
    match e {
        TableError::Corruption(msg) => {
            TableError::Corruption(format!("{}: {msg}", path.display()))
        }
        other => other,
    }
}

/// Sequential reader over a table's data region.
pub struct TableIter {
    reader: std::io::Take<BufReader<File>>,
    path: PathBuf,
    done: bool,
}

impl Iterator for TableIter {
    type Item = Result<Entry, TableError>;

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
            Err(CodecError::IncompleteEntry) => {
                self.done = true;
                Some(Err(TableError::Corruption(format!(
                    "{}: torn frame inside data region",
                    self.path.display()
                ))))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}
