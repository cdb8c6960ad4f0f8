use super::*;
use codec::EntryType;
use std::fs;
use tempfile::tempdir;

// -------------------- Helpers --------------------

fn put(seq: u64, key: &[u8], value: &[u8]) -> Entry {
    Entry {
        etype: EntryType::Put,
        seq,
        key: key.to_vec(),
        value: value.to_vec(),
    }
}

fn del(seq: u64, key: &[u8]) -> Entry {
    Entry {
        etype: EntryType::Delete,
        seq,
        key: key.to_vec(),
        value: Vec::new(),
    }
}

fn collect(wal: &Wal) -> Vec<Entry> {
    wal.iter()
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

// -------------------- Write & iterate --------------------

#[test]
fn write_batch_and_iterate() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("0.log");

    let mut wal = Wal::create(&path).unwrap();
    let batch = vec![put(1, b"k1", b"v1"), put(2, b"k2", b"v2"), del(3, b"k1")];
    wal.write_entries(&batch).unwrap();

    assert_eq!(wal.len(), 3);
    assert_eq!(collect(&wal), batch);
}

#[test]
fn multiple_batches_preserve_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("0.log");

    let mut wal = Wal::create(&path).unwrap();
    wal.write_entries(&[put(1, b"a", b"1")]).unwrap();
    wal.write_entries(&[put(2, b"b", b"2"), put(3, b"c", b"3")])
        .unwrap();

    let seqs: Vec<u64> = collect(&wal).iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3]);
}

#[test]
fn empty_batch_is_noop() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("0.log");

    let mut wal = Wal::create(&path).unwrap();
    wal.write_entries(&[]).unwrap();
    assert_eq!(wal.len(), 0);
    assert_eq!(fs::metadata(&path).unwrap().len(), 0);
}

#[test]
fn create_truncates_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("0.log");

    {
        let mut wal = Wal::create(&path).unwrap();
        wal.write_entries(&[put(1, b"old", b"data")]).unwrap();
    }

    let wal = Wal::create(&path).unwrap();
    assert_eq!(wal.len(), 0);
    assert!(collect(&wal).is_empty());
}

// -------------------- Reopen for append --------------------

#[test]
fn open_counts_existing_entries_and_appends() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("0.log");

    {
        let mut wal = Wal::create(&path).unwrap();
        wal.write_entries(&[put(1, b"k1", b"v1"), put(2, b"k2", b"v2")])
            .unwrap();
    }

    let mut wal = Wal::open(&path).unwrap();
    assert_eq!(wal.len(), 2);

    wal.write_entries(&[put(3, b"k3", b"v3")]).unwrap();
    assert_eq!(wal.len(), 3);

    let entries = collect(&wal);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2], put(3, b"k3", b"v3"));
}

#[test]
fn open_missing_file_fails() {
    let dir = tempdir().unwrap();
    assert!(Wal::open(dir.path().join("missing.log")).is_err());
}

// -------------------- Torn tails --------------------

#[test]
fn iter_surfaces_torn_tail() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("0.log");

    {
        let mut wal = Wal::create(&path).unwrap();
        wal.write_entries(&[put(1, b"k1", b"v1"), put(2, b"k2", b"v2")])
            .unwrap();
    }

    // Simulate a crash mid-append: a frame header with no payload.
    let mut data = fs::read(&path).unwrap();
    data.extend_from_slice(&[0u8, 9, 0, 0, 0]); // type + partial seq
    fs::write(&path, &data).unwrap();

    let results: Vec<_> = WalIter::open(&path).unwrap().collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    match results[2].as_ref() {
        Err(WalError::Codec(CodecError::IncompleteEntry)) => {}
        other => panic!("expected IncompleteEntry tail, got {:?}", other),
    }
}

#[test]
fn open_truncates_torn_tail_and_stays_appendable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("0.log");

    {
        let mut wal = Wal::create(&path).unwrap();
        wal.write_entries(&[put(1, b"k1", b"v1"), put(2, b"k2", b"v2")])
            .unwrap();
    }
    let clean_len = fs::metadata(&path).unwrap().len();

    let mut data = fs::read(&path).unwrap();
    data.extend_from_slice(&[0u8, 1, 2, 3]);
    fs::write(&path, &data).unwrap();

    let mut wal = Wal::open(&path).unwrap();
    assert_eq!(wal.len(), 2);
    assert_eq!(fs::metadata(&path).unwrap().len(), clean_len);

    // Appends after the truncated tail must replay cleanly.
    wal.write_entries(&[put(3, b"k3", b"v3")]).unwrap();
    let entries = collect(&wal);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2].key, b"k3");
}

// -------------------- Close --------------------

#[test]
fn close_is_idempotent_and_blocks_appends() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("0.log");

    let mut wal = Wal::create(&path).unwrap();
    wal.write_entries(&[put(1, b"k", b"v")]).unwrap();

    wal.close().unwrap();
    wal.close().unwrap();

    match wal.write_entries(&[put(2, b"k2", b"v2")]) {
        Err(WalError::Closed(_)) => {}
        other => panic!("expected Closed, got {:?}", other),
    }

    // Contents written before close remain readable.
    assert_eq!(collect(&wal).len(), 1);
}
