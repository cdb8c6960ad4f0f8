//! Cold-start helpers: WAL replay, sequence recovery, and orphan sweeping.

use crate::error::Result;
use crate::manifest::{Manifest, Version};
use crate::paths;
use codec::{CodecError, FileNo};
use memtable::Memtable;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use wal::{Wal, WalError};

/// Replays `wal` into `memtable`, returning the highest sequence seen.
///
/// Policy: stop at the first torn frame — entries before the boundary are
/// applied, the torn record and anything after it are discarded. The torn
/// frame is logged, never silently swallowed as a clean end of stream.
pub(crate) fn replay_wal(wal: &Wal, memtable: &mut Memtable) -> Result<u64> {
    let mut max_seq = 0u64;
    for item in wal.iter()? {
        match item {
            Ok(entry) => {
                max_seq = max_seq.max(entry.seq);
                memtable.apply(entry);
            }
            Err(WalError::Codec(CodecError::IncompleteEntry)) => {
                warn!(
                    path = %wal.path().display(),
                    "torn frame at wal tail; applying the entries before it"
                );
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(max_seq)
}

/// Highest sequence number stored in any table the version references.
///
/// Needed because a freshly rotated WAL is empty: after a flush the only
/// record of how far the sequence counter got is inside the tables.
pub(crate) fn max_table_seq(manifest: &Manifest) -> Result<u64> {
    let version = manifest.current();
    let mut max_seq = 0u64;
    for (level, meta) in version.referenced_tables() {
        let table = manifest.get_table(meta.file_no, level)?;
        for entry in table.iter()? {
            max_seq = max_seq.max(entry?.seq);
        }
    }
    Ok(max_seq)
}

/// Deletes every file under the database tree that `version` does not
/// reference: stale WALs, orphan tables from a crashed flush, and leftover
/// `.tmp` files. Best-effort — the files are harmless until the next sweep.
pub(crate) fn sweep_orphans(root: &Path, version: &Version) {
    sweep_wals(root, version);

    let referenced: HashSet<(usize, FileNo)> = version
        .referenced_tables()
        .map(|(level, meta)| (level, meta.file_no))
        .collect();

    for level in 0..version.levels.len() {
        let dir = paths::sstable_dir(root, level);
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "tmp").unwrap_or(false) {
                let _ = fs::remove_file(&path);
                continue;
            }
            if let Some(file_no) = paths::parse_file_no(&path, "sst") {
                if !referenced.contains(&(level, file_no)) {
                    info!(path = %path.display(), "removing orphan table");
                    let _ = fs::remove_file(&path);
                }
            }
        }
    }

    let _ = fs::remove_file(paths::manifest_tmp_path(root));
}

/// Deletes WAL files other than the version's current one. Safe any time
/// after the checkpoint that made them obsolete.
pub(crate) fn sweep_wals(root: &Path, version: &Version) {
    let Ok(entries) = fs::read_dir(paths::wal_dir(root)) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if let Some(file_no) = paths::parse_file_no(&path, "log") {
            if file_no != version.current_wal {
                debug!(path = %path.display(), "removing obsolete wal");
                let _ = fs::remove_file(&path);
            }
        }
    }
}
