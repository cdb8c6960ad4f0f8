mod cache_tests;

use codec::{Entry, EntryType};

/// `n` ascending, key-unique entries: `key-0000` → `value-0`, ...
pub fn ascending_entries(n: usize) -> Vec<Entry> {
    (0..n)
        .map(|i| Entry {
            etype: EntryType::Put,
            seq: i as u64 + 1,
            key: format!("key-{i:04}").into_bytes(),
            value: format!("value-{i}").into_bytes(),
        })
        .collect()
}
