use super::helpers::test_options;
use crate::Db;
use anyhow::Result;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

// Spec scenario: 5 writers x 100 writes each with flushes interleaving.

#[test]
fn concurrent_writers_with_flushes() -> Result<()> {
    const WRITERS: usize = 5;
    const WRITES: usize = 100;

    let dir = tempdir()?;
    let db = Db::open(test_options(dir.path()).with_flush_threshold(50))?;

    thread::scope(|s| {
        for w in 0..WRITERS {
            let db = &db;
            s.spawn(move || {
                for i in 0..WRITES {
                    let key = format!("writer{w}:key{i}");
                    let value = format!("writer{w}:value{i}");
                    db.put(key.as_bytes(), value.as_bytes()).unwrap();
                }
            });
        }
    });

    assert_eq!(db.last_seq(), (WRITERS * WRITES) as u64);

    for w in 0..WRITERS {
        for i in 0..WRITES {
            let key = format!("writer{w}:key{i}");
            let expected = format!("writer{w}:value{i}");
            assert_eq!(
                db.get(key.as_bytes())?,
                Some(expected.into_bytes()),
                "missing {key}"
            );
        }
    }
    Ok(())
}

#[test]
fn readers_run_against_concurrent_writes() -> Result<()> {
    let dir = tempdir()?;
    let db = Db::open(test_options(dir.path()).with_flush_threshold(20))?;

    db.put(b"stable", b"fixed")?;

    thread::scope(|s| {
        let writer = {
            let db = &db;
            s.spawn(move || {
                for i in 0..200 {
                    db.put(format!("churn{i}").as_bytes(), b"x").unwrap();
                }
            })
        };

        // Writes acknowledged before a get must stay visible throughout.
        let db = &db;
        s.spawn(move || {
            for _ in 0..200 {
                assert_eq!(db.get(b"stable").unwrap(), Some(b"fixed".to_vec()));
            }
        });

        writer.join().unwrap();
    });

    assert_eq!(db.get(b"stable")?, Some(b"fixed".to_vec()));
    Ok(())
}

#[test]
fn batch_timeout_groups_concurrent_writers() -> Result<()> {
    let dir = tempdir()?;
    let db = Db::open(
        test_options(dir.path())
            .with_batch_timeout(Duration::from_millis(2))
            .with_flush_threshold(1000),
    )?;

    thread::scope(|s| {
        for w in 0..4 {
            let db = &db;
            s.spawn(move || {
                for i in 0..25 {
                    db.put(format!("w{w}k{i}").as_bytes(), b"v").unwrap();
                }
            });
        }
    });

    assert_eq!(db.last_seq(), 100);
    for w in 0..4 {
        for i in 0..25 {
            assert!(db.get(format!("w{w}k{i}").as_bytes())?.is_some());
        }
    }
    Ok(())
}

#[test]
fn writes_interleaved_with_reopen() -> Result<()> {
    let dir = tempdir()?;
    {
        let db = Db::open(test_options(dir.path()).with_flush_threshold(10))?;
        thread::scope(|s| {
            for w in 0..3 {
                let db = &db;
                s.spawn(move || {
                    for i in 0..30 {
                        db.put(format!("p{w}-{i}").as_bytes(), b"v").unwrap();
                    }
                });
            }
        });
    }

    let db = Db::open(test_options(dir.path()).with_flush_threshold(10))?;
    for w in 0..3 {
        for i in 0..30 {
            assert!(
                db.get(format!("p{w}-{i}").as_bytes())?.is_some(),
                "p{w}-{i} lost across reopen"
            );
        }
    }
    assert_eq!(db.last_seq(), 90);
    Ok(())
}
