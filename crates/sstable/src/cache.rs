//! Shared LRU cache of parsed data blocks, keyed `(file_no, block_no)`.

use crate::Block;
use codec::FileNo;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

type BlockKey = (FileNo, usize);

/// A process-wide cache of parsed [`Block`]s, shared by every open table.
///
/// Values are immutable and handed out as `Arc<Block>`, so hits are safe to
/// share across reader threads and the flush worker without copying. The
/// cache is internally synchronized; capacity is counted in blocks, and a
/// capacity of zero yields a null cache (every `get` misses, `put` is a
/// no-op) — the contract the read path is written against either way.
pub struct BlockCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

struct Inner {
    map: HashMap<BlockKey, Arc<Block>>,
    /// Recency queue, least-recently-used at the front.
    order: VecDeque<BlockKey>,
}

impl BlockCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Looks up a cached block, refreshing its recency on a hit.
    #[must_use]
    pub fn get(&self, file_no: FileNo, block_no: usize) -> Option<Arc<Block>> {
        if self.capacity == 0 {
            return None;
        }
        let key = (file_no, block_no);
        let mut inner = self.inner.lock();
        let hit = inner.map.get(&key).cloned();
        if hit.is_some() {
            inner.touch(&key);
        }
        hit
    }

    /// Inserts a parsed block, evicting the least-recently-used entry when
    /// the cache is full. Re-inserting an existing key refreshes both the
    /// value and its recency.
    pub fn put(&self, file_no: FileNo, block_no: usize, block: Arc<Block>) {
        if self.capacity == 0 {
            return;
        }
        let key = (file_no, block_no);
        let mut inner = self.inner.lock();

        if inner.map.insert(key, block).is_some() {
            inner.touch(&key);
            return;
        }
        inner.order.push_back(key);

        while inner.map.len() > self.capacity {
            if let Some(victim) = inner.order.pop_front() {
                inner.map.remove(&victim);
            } else {
                break;
            }
        }
    }

    /// Number of blocks currently cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Inner {
    /// Moves `key` to the most-recently-used position.
    fn touch(&mut self, key: &BlockKey) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
            self.order.push_back(*key);
        }
    }
}
