//! B+ tree benchmarks.
//!
//! Insert throughput for sequential and shuffled keys, and full and
//! bounded scans over a populated tree. The buffer pool is sized to keep
//! every page resident, so these measure the tree rather than disk I/O.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pagetree::{BTreeConfig, BTreeFile, BufferPoolManager, DiskManager, Key, PageId, RecordId};
use tempfile::tempdir;

const POOL_SIZE: usize = 512;

fn rid(i: i32) -> RecordId {
    RecordId::new(PageId::new(i as u32 / 100 + 1), (i % 100) as u16)
}

fn fresh_bpm() -> (tempfile::TempDir, BufferPoolManager) {
    let dir = tempdir().unwrap();
    let dm = DiskManager::create(dir.path().join("bench.db")).unwrap();
    (dir, BufferPoolManager::new(POOL_SIZE, dm))
}

/// Deterministic permutation of `0..count`.
fn shuffled(count: i32) -> Vec<i32> {
    // 7919 is prime and does not divide any count used here
    (0..count).map(|i| (i * 7919) % count).collect()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("btree_insert");

    for count in [1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("sequential", count), &count, |b, &count| {
            b.iter_with_setup(fresh_bpm, |(dir, bpm)| {
                let mut tree = BTreeFile::create(&bpm, "bench", BTreeConfig::default()).unwrap();
                for i in 0..count {
                    tree.insert(&Key::from(i), rid(i)).unwrap();
                }
                tree.close();
                (dir, bpm)
            });
        });

        group.bench_with_input(BenchmarkId::new("shuffled", count), &count, |b, &count| {
            b.iter_with_setup(
                || (fresh_bpm(), shuffled(count)),
                |((dir, bpm), keys)| {
                    let mut tree =
                        BTreeFile::create(&bpm, "bench", BTreeConfig::default()).unwrap();
                    for i in keys {
                        tree.insert(&Key::from(i), rid(i)).unwrap();
                    }
                    tree.close();
                    (dir, bpm)
                },
            );
        });
    }

    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("btree_scan");
    let count = 10_000;

    let (_dir, bpm) = fresh_bpm();
    let mut tree = BTreeFile::create(&bpm, "bench", BTreeConfig::default()).unwrap();
    for i in shuffled(count) {
        tree.insert(&Key::from(i), rid(i)).unwrap();
    }

    group.throughput(Throughput::Elements(count as u64));
    group.bench_function("full", |b| {
        b.iter(|| {
            let n = tree.new_scan(None, None).unwrap().count();
            black_box(n)
        });
    });

    group.throughput(Throughput::Elements(100));
    group.bench_function("range_100", |b| {
        b.iter(|| {
            let scan = tree
                .new_scan(Some(Key::from(5_000)), Some(Key::from(5_099)))
                .unwrap();
            black_box(scan.count())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_scan);
criterion_main!(benches);
