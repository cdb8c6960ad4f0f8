use crate::{Db, Options};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Test options: greedy batching (zero timeout) keeps single-writer tests
/// from sleeping 5ms per commit.
pub fn test_options(path: &Path) -> Options {
    Options::new(path).with_batch_timeout(Duration::ZERO)
}

pub fn open_db(path: &Path, flush_threshold: usize) -> Db {
    Db::open(test_options(path).with_flush_threshold(flush_threshold)).unwrap()
}

/// Sorted file names in `sstable/<level>/`.
pub fn sst_files(db_path: &Path, level: usize) -> Vec<String> {
    list(&crate::paths::sstable_dir(db_path, level))
}

/// Sorted file names in `wal/`.
pub fn wal_files(db_path: &Path) -> Vec<String> {
    list(&crate::paths::wal_dir(db_path))
}

fn list(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
