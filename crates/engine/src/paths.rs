//! Canonical directory tree and file naming.
//!
//! ```text
//! <db_path>/
//!   MANIFEST            durable checkpoint of the current Version
//!   MANIFEST.tmp        transient during a checkpoint
//!   wal/
//!     <file_no>.log
//!   sstable/
//!     0/<file_no>.sst
//!     1/<file_no>.sst
//!     ...
//! ```

use codec::FileNo;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILENAME: &str = "MANIFEST";
pub const MANIFEST_TMP_FILENAME: &str = "MANIFEST.tmp";

pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILENAME)
}

pub fn manifest_tmp_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_TMP_FILENAME)
}

pub fn wal_dir(root: &Path) -> PathBuf {
    root.join("wal")
}

pub fn wal_path(root: &Path, file_no: FileNo) -> PathBuf {
    wal_dir(root).join(format!("{file_no}.log"))
}

pub fn sstable_dir(root: &Path, level: usize) -> PathBuf {
    root.join("sstable").join(level.to_string())
}

pub fn sstable_path(root: &Path, level: usize, file_no: FileNo) -> PathBuf {
    sstable_dir(root, level).join(format!("{file_no}.sst"))
}

/// Extracts the file number from a `<file_no>.<ext>` name. Returns `None`
/// for anything that does not parse — sweeps skip foreign files.
pub fn parse_file_no(path: &Path, ext: &str) -> Option<FileNo> {
    if path.extension()?.to_str()? != ext {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}
