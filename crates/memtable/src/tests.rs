use super::*;
use codec::EntryType;

#[test]
fn put_get_overwrite() {
    let mut m = Memtable::new();
    m.put(b"k1".to_vec(), b"v1".to_vec(), 1);
    assert_eq!(m.len(), 1);
    assert_eq!(m.get(b"k1").unwrap().value, b"v1");

    m.put(b"k1".to_vec(), b"v2".to_vec(), 2);
    assert_eq!(m.len(), 1, "overwrite must not grow the table");
    let e = m.get(b"k1").unwrap();
    assert_eq!(e.value, b"v2");
    assert_eq!(e.seq, 2);
}

#[test]
fn stale_seq_never_regresses() {
    let mut m = Memtable::new();
    m.put(b"k".to_vec(), b"new".to_vec(), 5);
    m.put(b"k".to_vec(), b"old".to_vec(), 3);
    assert_eq!(m.get(b"k").unwrap().value, b"new");

    m.delete(b"k".to_vec(), 4);
    assert_eq!(m.get(b"k").unwrap().etype, EntryType::Put);
}

#[test]
fn delete_installs_tombstone() {
    let mut m = Memtable::new();
    m.put(b"k".to_vec(), b"v".to_vec(), 1);
    m.delete(b"k".to_vec(), 2);

    let e = m.get(b"k").unwrap();
    assert!(e.is_tombstone());
    assert_eq!(e.seq, 2);
    assert_eq!(m.len(), 1, "tombstone keeps the key present");
}

#[test]
fn tombstone_for_absent_key_is_stored() {
    let mut m = Memtable::new();
    m.delete(b"never-written".to_vec(), 1);
    assert_eq!(m.len(), 1);
    assert!(m.get(b"never-written").unwrap().is_tombstone());
}

#[test]
fn len_counts_distinct_keys_not_writes() {
    let mut m = Memtable::new();
    for seq in 1..=10 {
        m.put(b"same".to_vec(), format!("v{seq}").into_bytes(), seq);
    }
    m.put(b"other".to_vec(), b"v".to_vec(), 11);
    assert_eq!(m.len(), 2);
}

#[test]
fn iter_is_sorted_by_key() {
    let mut m = Memtable::new();
    m.put(b"cherry".to_vec(), b"3".to_vec(), 1);
    m.put(b"apple".to_vec(), b"1".to_vec(), 2);
    m.delete(b"banana".to_vec(), 3);

    let keys: Vec<&[u8]> = m.iter().map(|e| e.key.as_slice()).collect();
    assert_eq!(keys, vec![&b"apple"[..], &b"banana"[..], &b"cherry"[..]]);

    let types: Vec<EntryType> = m.iter().map(|e| e.etype).collect();
    assert_eq!(
        types,
        vec![EntryType::Put, EntryType::Delete, EntryType::Put]
    );
}

#[test]
fn iter_carries_full_entries() {
    let mut m = Memtable::new();
    m.put(b"k".to_vec(), b"v".to_vec(), 42);

    let entries: Vec<_> = m.iter().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].seq, 42);
    assert_eq!(entries[0].key, b"k");
    assert_eq!(entries[0].value, b"v");
}

#[test]
fn get_missing_key() {
    let m = Memtable::new();
    assert!(m.get(b"nope").is_none());
    assert!(m.is_empty());
}
