//! Engine configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Tunables for [`Db::open`](crate::Db::open). Construct with
/// [`Options::new`] and chain the `with_*` setters.
#[derive(Debug, Clone)]
pub struct Options {
    /// Root directory of the database.
    pub db_path: PathBuf,

    /// Entries (distinct keys) in the memtable before a flush is forced.
    pub memtable_flush_threshold: usize,

    /// Largest level index, inclusive. Flushes only ever write L0; the
    /// extra levels exist for the compaction extension point.
    pub max_sstable_level: usize,

    /// Maximum requests committed together by the group-commit worker.
    pub max_batch_size: usize,

    /// How long the worker waits for stragglers after the first request of
    /// a batch. Zero means greedy: take only what is already queued.
    pub batch_timeout: Duration,

    /// Target false-positive rate for per-table bloom filters.
    pub bloom_filter_fpr: f64,

    /// Shared block cache capacity, in blocks. Zero disables caching.
    pub block_cache_capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data"),
            memtable_flush_threshold: 256,
            max_sstable_level: 3,
            max_batch_size: 50,
            batch_timeout: Duration::from_millis(5),
            bloom_filter_fpr: 0.01,
            block_cache_capacity: 1024,
        }
    }
}

impl Options {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            ..Self::default()
        }
    }

    pub fn with_flush_threshold(mut self, entries: usize) -> Self {
        self.memtable_flush_threshold = entries;
        self
    }

    pub fn with_max_sstable_level(mut self, level: usize) -> Self {
        self.max_sstable_level = level;
        self
    }

    pub fn with_max_batch_size(mut self, requests: usize) -> Self {
        self.max_batch_size = requests;
        self
    }

    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = timeout;
        self
    }

    pub fn with_bloom_fpr(mut self, fpr: f64) -> Self {
        self.bloom_filter_fpr = fpr;
        self
    }

    pub fn with_block_cache_capacity(mut self, blocks: usize) -> Self {
        self.block_cache_capacity = blocks;
        self
    }
}
