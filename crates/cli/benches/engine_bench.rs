use criterion::{criterion_group, criterion_main, Criterion};
use engine::{Db, Options};
use std::time::Duration;
use tempfile::tempdir;

fn bench_sequential_puts(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let db = Db::open(
        Options::new(dir.path())
            .with_flush_threshold(4096)
            .with_batch_timeout(Duration::ZERO),
    )
    .unwrap();

    let mut i = 0u64;
    c.bench_function("put_sequential", |b| {
        b.iter(|| {
            let key = format!("bench-key-{i:012}");
            db.put(key.as_bytes(), b"bench-value-payload").unwrap();
            i += 1;
        })
    });
}

fn bench_point_gets(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let db = Db::open(
        Options::new(dir.path())
            .with_flush_threshold(256)
            .with_batch_timeout(Duration::ZERO),
    )
    .unwrap();

    // Enough writes to span several flushed tables plus a warm memtable.
    for i in 0..2000u64 {
        let key = format!("get-key-{i:06}");
        db.put(key.as_bytes(), b"value").unwrap();
    }

    let mut i = 0u64;
    c.bench_function("get_point", |b| {
        b.iter(|| {
            let key = format!("get-key-{:06}", i % 2000);
            assert!(db.get(key.as_bytes()).unwrap().is_some());
            i += 1;
        })
    });
}

criterion_group!(benches, bench_sequential_puts, bench_point_gets);
criterion_main!(benches);
