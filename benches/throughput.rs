//! Throughput Benchmark for tempokv
//!
//! This benchmark measures the performance of the cache
//! under various workloads.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;
use tempokv::{Cache, Settings};

fn sharded(shards: u32) -> Cache<Bytes, Bytes> {
    Cache::new(Settings::expiring(Duration::from_secs(3600)).with_shards(shards))
        .expect("cache without cleaner")
}

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let cache = sharded(64);

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("key:{}", i));
            let value = Bytes::from("small_value");
            cache.set(key, value);
            i += 1;
        });
    });

    group.bench_function("set_medium", |b| {
        let mut i = 0u64;
        let value = Bytes::from("x".repeat(1024)); // 1KB value
        b.iter(|| {
            let key = Bytes::from(format!("key:{}", i));
            cache.set(key, value.clone());
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let cache = sharded(64);

    // Pre-populate with data
    for i in 0..100_000 {
        let key = Bytes::from(format!("key:{}", i));
        let value = Bytes::from(format!("value:{}", i));
        cache.set(key, value);
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("key:{}", i % 100_000));
            black_box(cache.get(&key));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("missing:{}", i));
            black_box(cache.get(&key));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark FETCH hits and misses
fn bench_fetch(c: &mut Criterion) {
    let cache = sharded(64);

    let mut group = c.benchmark_group("fetch");
    group.throughput(Throughput::Elements(1));

    group.bench_function("fetch_hit", |b| {
        cache.set(Bytes::from("hot"), Bytes::from("value"));
        b.iter(|| black_box(cache.fetch(Bytes::from("hot"), |_| Some(Bytes::from("value")))));
    });

    group.bench_function("fetch_miss", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("fetch:{}", i));
            black_box(cache.fetch(key, |k| Some(k.clone())));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark mixed read/write contention across shard counts
fn bench_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");
    group.throughput(Throughput::Elements(4 * 1000));

    for shards in [1u32, 16, 64] {
        let cache = Arc::new(sharded(shards));

        group.bench_function(format!("mixed_4_threads_{}_shards", shards), |b| {
            b.iter(|| {
                let handles: Vec<_> = (0..4)
                    .map(|t| {
                        let cache = Arc::clone(&cache);
                        std::thread::spawn(move || {
                            for i in 0..1000u64 {
                                let key = Bytes::from(format!("key:{}:{}", t, i % 100));
                                if i % 4 == 0 {
                                    cache.set(key, Bytes::from("value"));
                                } else {
                                    black_box(cache.get(&key));
                                }
                            }
                        })
                    })
                    .collect();

                for handle in handles {
                    handle.join().unwrap();
                }
            });
        });
    }

    group.finish();
}

/// Benchmark the expiry sweep
fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep");

    group.bench_function("delete_expired_10k_live", |b| {
        let cache = sharded(16);
        for i in 0..10_000 {
            cache.set(Bytes::from(format!("key:{}", i)), Bytes::from("value"));
        }
        b.iter(|| black_box(cache.delete_expired()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_set,
    bench_get,
    bench_fetch,
    bench_concurrent,
    bench_sweep
);
criterion_main!(benches);
