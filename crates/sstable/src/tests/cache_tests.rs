use crate::{Block, BlockCache};
use codec::Entry;
use std::sync::Arc;
use std::thread;

fn block_with(key: &[u8]) -> Arc<Block> {
    let mut buf = Vec::new();
    let mut e = Entry::put(key.to_vec(), b"v".to_vec());
    e.seq = 1;
    e.encode(&mut buf).unwrap();
    Arc::new(Block::parse(&buf).unwrap())
}

#[test]
fn get_miss_then_hit() {
    let cache = BlockCache::new(4);
    assert!(cache.get(1, 0).is_none());

    cache.put(1, 0, block_with(b"a"));
    let hit = cache.get(1, 0).expect("cached block");
    assert!(hit.get(b"a").is_some());
}

#[test]
fn keys_are_per_file_and_block() {
    let cache = BlockCache::new(4);
    cache.put(1, 0, block_with(b"a"));

    assert!(cache.get(1, 1).is_none());
    assert!(cache.get(2, 0).is_none());
}

#[test]
fn evicts_least_recently_used() {
    let cache = BlockCache::new(2);
    cache.put(1, 0, block_with(b"a"));
    cache.put(1, 1, block_with(b"b"));

    // Touch (1, 0) so (1, 1) is the LRU victim.
    cache.get(1, 0).unwrap();
    cache.put(1, 2, block_with(b"c"));

    assert_eq!(cache.len(), 2);
    assert!(cache.get(1, 0).is_some());
    assert!(cache.get(1, 1).is_none(), "LRU entry must be evicted");
    assert!(cache.get(1, 2).is_some());
}

#[test]
fn zero_capacity_is_a_null_cache() {
    let cache = BlockCache::new(0);
    cache.put(1, 0, block_with(b"a"));
    assert!(cache.get(1, 0).is_none());
    assert!(cache.is_empty());
}

#[test]
fn shared_across_threads() {
    let cache = Arc::new(BlockCache::new(64));

    let handles: Vec<_> = (0..4u64)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..16usize {
                    cache.put(t, i, block_with(format!("k{t}-{i}").as_bytes()));
                    assert!(cache.get(t, i).is_some());
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(cache.len(), 64);
}
