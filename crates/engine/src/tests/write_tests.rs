use super::helpers::{open_db, sst_files, wal_files};
use crate::Error;
use anyhow::Result;
use tempfile::tempdir;

// --------------------- Basic put / get / delete ---------------------

#[test]
fn put_and_get() -> Result<()> {
    let dir = tempdir()?;
    let db = open_db(dir.path(), 256);

    db.put(b"name", b"alice")?;
    assert_eq!(db.get(b"name")?, Some(b"alice".to_vec()));
    assert_eq!(db.last_seq(), 1);
    Ok(())
}

#[test]
fn overwrite_key() -> Result<()> {
    let dir = tempdir()?;
    let db = open_db(dir.path(), 256);

    db.put(b"k", b"v1")?;
    db.put(b"k", b"v2")?;
    assert_eq!(db.get(b"k")?, Some(b"v2".to_vec()));
    assert_eq!(db.memtable_len(), 1);
    Ok(())
}

#[test]
fn delete_hides_key() -> Result<()> {
    let dir = tempdir()?;
    let db = open_db(dir.path(), 256);

    db.put(b"k", b"v")?;
    db.delete(b"k")?;
    assert_eq!(db.get(b"k")?, None);

    db.put(b"k", b"v2")?;
    assert_eq!(db.get(b"k")?, Some(b"v2".to_vec()), "put resurrects");
    Ok(())
}

#[test]
fn delete_of_absent_key_succeeds() -> Result<()> {
    let dir = tempdir()?;
    let db = open_db(dir.path(), 256);

    db.delete(b"never-there")?;
    assert_eq!(db.get(b"never-there")?, None);
    Ok(())
}

#[test]
fn empty_key_rejected() -> Result<()> {
    let dir = tempdir()?;
    let db = open_db(dir.path(), 256);

    assert!(matches!(
        db.put(b"", b"v"),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(db.delete(b""), Err(Error::InvalidArgument(_))));
    assert_eq!(db.last_seq(), 0, "rejected writes must not burn seqs");
    Ok(())
}

// --------------------- Sequence numbers ---------------------

#[test]
fn seq_increments_per_committed_write() -> Result<()> {
    let dir = tempdir()?;
    let db = open_db(dir.path(), 256);

    db.put(b"a", b"1")?;
    db.put(b"b", b"2")?;
    db.delete(b"a")?;
    assert_eq!(db.last_seq(), 3);

    let snapshot = db.memtable_snapshot();
    let mut seqs: Vec<u64> = snapshot.iter().map(|e| e.seq).collect();
    seqs.sort_unstable();
    assert_eq!(seqs, vec![2, 3]);
    Ok(())
}

// --------------------- WAL rotation (spec scenario) ---------------------

#[test]
fn flush_rotates_wal_and_writes_l0() -> Result<()> {
    let dir = tempdir()?;
    let db = open_db(dir.path(), 5);

    for i in 0..5 {
        db.put(format!("key{i}").as_bytes(), format!("value{i}").as_bytes())?;
    }
    db.put(b"key_trigger", b"value_trigger")?;

    assert!(wal_files(dir.path()).contains(&"1.log".to_string()));
    assert!(sst_files(dir.path(), 0).contains(&"0.sst".to_string()));

    let memtable = db.memtable_snapshot();
    assert_eq!(memtable.len(), 1, "only the trigger survives the flush");
    assert_eq!(memtable[0].key, b"key_trigger");
    assert_eq!(db.current_wal(), 1);
    Ok(())
}

// --------------------- Tombstone survives flush (spec scenario) ---------------------

#[test]
fn tombstone_survives_flush() -> Result<()> {
    let dir = tempdir()?;
    let db = open_db(dir.path(), 5);

    db.put(b"key1", b"value1")?;
    db.delete(b"key1")?;
    for i in 0..5 {
        db.put(format!("k{i}").as_bytes(), format!("v{i}").as_bytes())?;
    }

    assert!(
        !sst_files(dir.path(), 0).is_empty(),
        "a flush must have happened"
    );
    assert_eq!(db.get(b"key1")?, None, "tombstone shadows through the flush");
    assert_eq!(db.get(b"k0")?, Some(b"v0".to_vec()));
    Ok(())
}

// --------------------- Multiple flushes ---------------------

#[test]
fn repeated_flushes_accumulate_l0_tables() -> Result<()> {
    let dir = tempdir()?;
    let db = open_db(dir.path(), 2);

    for i in 0..10 {
        db.put(format!("key{i:02}").as_bytes(), b"v")?;
    }

    let version = db.version();
    assert!(version.levels[0].len() >= 4);
    assert_eq!(
        sst_files(dir.path(), 0).len(),
        version.levels[0].len(),
        "on-disk tables match the version"
    );

    // File numbers ascend in flush order.
    let file_nos: Vec<u64> = version.levels[0].iter().map(|m| m.file_no).collect();
    let mut sorted = file_nos.clone();
    sorted.sort_unstable();
    assert_eq!(file_nos, sorted);

    for i in 0..10 {
        assert!(db.get(format!("key{i:02}").as_bytes())?.is_some());
    }
    Ok(())
}

// --------------------- Close ---------------------

#[test]
fn writes_after_close_fail() -> Result<()> {
    let dir = tempdir()?;
    let db = open_db(dir.path(), 256);

    db.put(b"k", b"v")?;
    db.close()?;
    db.close()?; // idempotent

    assert!(matches!(db.put(b"k2", b"v"), Err(Error::Closed)));
    assert!(matches!(db.delete(b"k"), Err(Error::Closed)));
    assert!(matches!(db.get(b"k"), Err(Error::Closed)));
    Ok(())
}
