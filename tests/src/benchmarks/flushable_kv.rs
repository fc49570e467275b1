//! # Flushable KV Benchmarks
//!
//! - write-back cache: puts then one batch flush
//! - synced pool: dirty marker, flush, clean marker over several databases

use criterion::{black_box, BatchSize, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use hx_01_flushable_kv::{
    DbProducer, Flushable, KeyValueStore, MemoryProducer, MemoryStore, PoolConfig, SyncedPool,
};

fn key(i: u64) -> [u8; 8] {
    i.to_be_bytes()
}

pub fn bench_flushable(c: &mut Criterion) {
    let mut group = c.benchmark_group("hx-01-flushable");

    for size in [100u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("put_then_flush", size), &size, |b, &size| {
            b.iter_batched(
                || Flushable::wrap(Arc::new(MemoryStore::new())),
                |db| {
                    for i in 0..size {
                        let _ = db.put(&key(i), b"value");
                    }
                    black_box(db.flush().is_ok())
                },
                BatchSize::SmallInput,
            )
        });
    }

    let db = Flushable::wrap(Arc::new(MemoryStore::new()));
    for i in 0..10_000 {
        let _ = db.put(&key(i), b"value");
    }
    group.bench_function("get_not_flushed", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i = (i + 7919) % 10_000;
            black_box(db.get(&key(i)).ok())
        })
    });

    group.finish();
}

pub fn bench_synced_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("hx-01-synced-pool");

    for dbs in [1usize, 4, 16] {
        group.bench_with_input(BenchmarkId::new("flush_dbs", dbs), &dbs, |b, &dbs| {
            b.iter_batched(
                || {
                    let pool = SyncedPool::new(Arc::new(MemoryProducer::new()), PoolConfig::default());
                    for n in 0..dbs {
                        if let Ok(db) = pool.open_db(&format!("db-{n}")) {
                            for i in 0..100 {
                                let _ = db.put(&key(i), b"value");
                            }
                        }
                    }
                    pool
                },
                |pool| black_box(pool.flush(b"bench").is_ok()),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}
