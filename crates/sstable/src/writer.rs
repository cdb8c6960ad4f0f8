//! Streaming table writer: entries in, a durable `.sst` file out.

use crate::format::{Footer, BLOCK_CAP};
use crate::index::{Index, IndexEntry};
use crate::TableError;
use bloom::Bloom;
use codec::Entry;
use std::fs::{rename, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// What a flush needs to know about the table it just wrote: the manifest
/// edit is built from the key range and the count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub bytes_written: u64,
    pub smallest_key: Vec<u8>,
    pub largest_key: Vec<u8>,
    pub entry_count: u32,
}

/// Writes a complete table at `path` from a finite, strictly ascending,
/// key-unique entry stream.
///
/// Entries are grouped into data blocks of [`BLOCK_CAP`]; each block's start
/// offset and first key are recorded for the index. When `bloom_fpr` is set
/// and the stream is non-empty, a filter sized for `expected_entries` is
/// built from every key and emitted into the filter region; otherwise the
/// region is empty and `filter_offset == index_offset`.
///
/// The bytes go to `<path>.tmp` first and are fsynced before an atomic
/// rename installs the file, so a crash mid-write never leaves a partial
/// table under the final name.
///
/// # Errors
///
/// [`TableError::OutOfOrder`] if the stream violates ascending-unique key
/// order; [`TableError::Io`] on any filesystem failure.
pub fn write_table<I>(
    path: &Path,
    entries: I,
    expected_entries: usize,
    bloom_fpr: Option<f64>,
) -> Result<TableSummary, TableError>
where
    I: IntoIterator<Item = Entry>,
{
    let tmp_path = path.with_extension("sst.tmp");
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp_path)?;
    let mut w = BufWriter::new(file);

    let mut filter = match bloom_fpr {
        Some(fpr) if expected_entries > 0 => Some(Bloom::with_fpr(expected_entries, fpr)),
        _ => None,
    };

    let mut index: Vec<IndexEntry> = Vec::new();
    let mut offset = 0u64;
    let mut block_len = 0usize;
    let mut entry_count = 0u64;
    let mut smallest_key = Vec::new();
    let mut last_key: Option<Vec<u8>> = None;

    for entry in entries {
        if let Some(prev) = &last_key {
            if prev.as_slice() >= entry.key.as_slice() {
                return Err(TableError::OutOfOrder {
                    key: entry.key.clone(),
                });
            }
        }

        if block_len == 0 {
            index.push(IndexEntry {
                block_offset: offset,
                key: entry.key.clone(),
            });
        }
        if let Some(f) = filter.as_mut() {
            f.insert(&entry.key);
        }
        if entry_count == 0 {
            smallest_key = entry.key.clone();
        }

        offset += entry.encode(&mut w)? as u64;
        entry_count += 1;
        block_len = (block_len + 1) % BLOCK_CAP;
        last_key = Some(entry.key);
    }

    if entry_count > u64::from(u32::MAX) {
        return Err(TableError::Corruption(format!(
            "entry count {entry_count} exceeds footer width"
        )));
    }

    let filter_offset = offset;
    if let Some(f) = &filter {
        if entry_count > 0 {
            f.write_to(&mut w)?;
            offset += f.region_len() as u64;
        }
    }

    let index_offset = offset;
    Index::write_to(&mut w, &index)?;

    let footer = Footer {
        filter_offset,
        index_offset,
        entry_count: entry_count as u32,
    };
    footer.write_to(&mut w)?;

    w.flush()?;
    let file = w.into_inner().map_err(|e| TableError::Io(e.into_error()))?;
    file.sync_all()?;
    let bytes_written = file.metadata()?.len();
    drop(file);

    rename(&tmp_path, path)?;

    Ok(TableSummary {
        bytes_written,
        smallest_key,
        largest_key: last_key.unwrap_or_default(),
        entry_count: entry_count as u32,
    })
}
