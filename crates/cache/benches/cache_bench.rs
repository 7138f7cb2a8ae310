//! Cache lookup benchmarks
//!
//! Measures the hot paths: fresh hits, stale hits that find a refresh
//! already in flight, bulk lookups and concurrent readers.
//!
//! Run with: `cargo bench --bench cache_bench -p refreshahead-cache`

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use refreshahead_cache::{
    source_fn, BoxedError, CacheParameters, FaultTolerantCache, MockClock, SystemClock,
};

const FRESHNESS: Duration = Duration::from_secs(5 * 60);
const STALE: Duration = Duration::from_secs(20 * 60);

fn populated_cache(size: u64) -> FaultTolerantCache<u64, String, SystemClock> {
    let cache = FaultTolerantCache::new(
        source_fn(|key: &u64| Ok(Some(format!("value_{key}")))),
        CacheParameters::new(FRESHNESS, STALE),
    )
    .unwrap();
    for i in 0..size {
        cache.put(i, format!("value_{i}"));
    }
    cache
}

// ============================================================================
// Lookup Benchmarks
// ============================================================================

fn bench_fresh_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fresh_hit");

    for size in [100u64, 1000, 10_000] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let cache = populated_cache(size);
            let mut counter = 0u64;
            b.iter(|| {
                let key = counter % size;
                let _ = black_box(cache.get(&black_box(key)));
                counter = counter.wrapping_add(1);
            });
        });
    }

    group.finish();
}

fn bench_stale_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("stale_hit");
    group.throughput(Throughput::Elements(1));

    // The source never returns, so after the first lookup every hit finds the
    // key locked and skips scheduling.
    let clock = MockClock::new();
    let cache = FaultTolerantCache::with_clock(
        |_: &u64| -> Result<Option<u64>, BoxedError> {
            thread::sleep(Duration::from_secs(3600));
            Ok(None)
        },
        CacheParameters::new(FRESHNESS, STALE),
        clock.clone(),
    )
    .unwrap();
    cache.put(1, 1);
    clock.advance_minutes(10);

    group.bench_function("single_key", |b| {
        b.iter(|| black_box(cache.get(&black_box(1))));
    });

    group.finish();
}

fn bench_get_present_fresh(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_present_fresh");

    for batch in [10u64, 100, 1000] {
        let cache = populated_cache(batch * 2);
        let keys: Vec<u64> = (0..batch).map(|i| i * 2).collect();
        group.throughput(Throughput::Elements(batch));
        group.bench_with_input(BenchmarkId::from_parameter(batch), &keys, |b, keys| {
            b.iter(|| black_box(cache.get_present_fresh(keys)));
        });
    }

    group.finish();
}

// ============================================================================
// Concurrency Benchmarks
// ============================================================================

fn bench_concurrent_readers(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_readers");
    let cache = Arc::new(populated_cache(1000));

    for threads in [2usize, 4, 8] {
        group.throughput(Throughput::Elements(1000 * threads as u64));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let cache = Arc::clone(&cache);
                        thread::spawn(move || {
                            for key in 0..1000u64 {
                                let _ = black_box(cache.get(&key));
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

criterion_group!(
    benches,
    bench_fresh_hit,
    bench_stale_hit,
    bench_get_present_fresh,
    bench_concurrent_readers
);
criterion_main!(benches);
