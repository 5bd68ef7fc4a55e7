//! Criterion benchmarks for the fetch paths of the three eviction
//! policies.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use memocache::{Algorithm, CacheConfig, CallArgs, MemoCache};

const CAPACITY: usize = 1024;

fn bench_hit_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("hit_path");
    for algorithm in [Algorithm::Lru, Algorithm::Lfu, Algorithm::Fifo] {
        let cache: MemoCache<i64> = MemoCache::new(
            CacheConfig::new().algorithm(algorithm).max_size(CAPACITY),
        )
        .unwrap();
        for n in 0..CAPACITY as i64 {
            cache.fetch_or_compute(&CallArgs::new().arg(n), || n);
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(algorithm),
            &cache,
            |b, cache| {
                let mut n = 0i64;
                b.iter(|| {
                    n = (n + 1) % CAPACITY as i64;
                    black_box(cache.fetch_or_compute(&CallArgs::new().arg(n), || unreachable!()))
                });
            },
        );
    }
    group.finish();
}

fn bench_miss_and_evict_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("miss_evict_path");
    for algorithm in [Algorithm::Lru, Algorithm::Lfu, Algorithm::Fifo] {
        let cache: MemoCache<i64> = MemoCache::new(
            CacheConfig::new().algorithm(algorithm).max_size(CAPACITY),
        )
        .unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(algorithm),
            &cache,
            |b, cache| {
                let mut n = 0i64;
                b.iter(|| {
                    // monotonically fresh keys: every fetch misses and, past
                    // capacity, evicts
                    n += 1;
                    black_box(cache.fetch_or_compute(&CallArgs::new().arg(n), || n))
                });
            },
        );
    }
    group.finish();
}

fn bench_structural_keys(c: &mut Criterion) {
    let cache: MemoCache<i64> = MemoCache::new(CacheConfig::new().max_size(CAPACITY)).unwrap();
    for n in 0..64 {
        cache.fetch_or_compute(&CallArgs::new().arg(n as f64 + 0.5), || n);
    }

    c.bench_function("structural_hit_64_entries", |b| {
        let mut n = 0i64;
        b.iter(|| {
            n = (n + 1) % 64;
            black_box(cache.fetch_or_compute(&CallArgs::new().arg(n as f64 + 0.5), || {
                unreachable!()
            }))
        });
    });
}

criterion_group!(
    benches,
    bench_hit_path,
    bench_miss_and_evict_path,
    bench_structural_keys
);
criterion_main!(benches);
