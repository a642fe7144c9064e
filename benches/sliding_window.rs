//! # Sliding Window Benchmarks
//!
//! Decision cost of both limiter variants and of the key registry.
//!
//! Run with: `cargo bench`

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use slidewin::{
    AdvanceStrategy, BackgroundLimiter, KeyRegistry, Limiter, ManualClock, OnDemandLimiter,
    SlidingWindowConfig,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Limit high enough that benchmarks measure the accept path.
const HIGH_LIMIT: u64 = u64::MAX / 2;

/// Benchmark single-threaded decisions on each variant
fn bench_single_decision(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_decision");
    group.throughput(Throughput::Elements(1));

    let config = SlidingWindowConfig::per_second(HIGH_LIMIT);

    group.bench_function("on_demand", |b| {
        let limiter = OnDemandLimiter::new(config);
        b.iter(|| std::hint::black_box(limiter.should_allow(1)));
    });

    group.bench_function("background", |b| {
        let limiter = BackgroundLimiter::new(config);
        b.iter(|| std::hint::black_box(limiter.should_allow(1)));
    });

    group.bench_function("rejected", |b| {
        let limiter = OnDemandLimiter::new(SlidingWindowConfig::per_minute(1));
        let _ = limiter.should_allow(1);
        b.iter(|| std::hint::black_box(limiter.should_allow(1)));
    });

    group.finish();
}

/// Benchmark window alignment when every call crosses a boundary
fn bench_on_demand_slides(c: &mut Criterion) {
    let mut group = c.benchmark_group("on_demand_slides");

    for step_ms in [1u64, 10, 2_500] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}ms_step", step_ms)),
            &step_ms,
            |b, &step_ms| {
                let clock = ManualClock::new(0);
                let limiter = OnDemandLimiter::with_clock(
                    SlidingWindowConfig::new(HIGH_LIMIT, Duration::from_secs(1)),
                    Arc::new(clock.clone()),
                );

                b.iter(|| {
                    clock.advance(Duration::from_millis(step_ms));
                    std::hint::black_box(limiter.should_allow(1))
                });
            },
        );
    }

    group.finish();
}

/// Benchmark concurrent decisions on one shared limiter
fn bench_concurrent_decisions(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_decisions");

    for num_threads in [2, 4, 8] {
        group.throughput(Throughput::Elements(num_threads as u64 * 1000));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_threads", num_threads)),
            &num_threads,
            |b, &num_threads| {
                let limiter: Arc<dyn Limiter> =
                    Arc::new(OnDemandLimiter::new(SlidingWindowConfig::per_second(HIGH_LIMIT)));

                b.iter_custom(|iters| {
                    let mut total_duration = Duration::ZERO;

                    for _ in 0..iters {
                        let start = std::time::Instant::now();

                        let handles: Vec<_> = (0..num_threads)
                            .map(|_| {
                                let limiter = limiter.clone();
                                thread::spawn(move || {
                                    for _ in 0..1000 {
                                        let _ = limiter.should_allow(1);
                                    }
                                })
                            })
                            .collect();

                        for handle in handles {
                            handle.join().unwrap();
                        }

                        total_duration += start.elapsed();
                    }

                    total_duration
                });
            },
        );
    }

    group.finish();
}

/// Benchmark registry lookups and lifecycle
fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");
    let size = Duration::from_secs(1);

    group.bench_function("should_allow", |b| {
        let registry = KeyRegistry::new(AdvanceStrategy::OnDemand);
        registry.create_new_key("client", HIGH_LIMIT, size).unwrap();

        b.iter(|| std::hint::black_box(registry.should_allow("client", 1)));
    });

    group.bench_function("must_should_allow_many_keys", |b| {
        let registry = KeyRegistry::new(AdvanceStrategy::OnDemand);
        let keys: Vec<String> = (0..256).map(|i| format!("client-{}", i)).collect();
        let mut counter = 0usize;

        b.iter(|| {
            counter = counter.wrapping_add(1);
            let key = &keys[counter % keys.len()];
            std::hint::black_box(registry.must_should_allow(key, 1, HIGH_LIMIT, size))
        });
    });

    group.bench_function("create_delete_on_demand", |b| {
        let registry = KeyRegistry::new(AdvanceStrategy::OnDemand);

        b.iter(|| {
            registry.create_new_key("k", 10, size).unwrap();
            registry.delete_key("k").unwrap();
        });
    });

    group.bench_function("create_delete_background", |b| {
        b.iter_batched(
            || KeyRegistry::new(AdvanceStrategy::Background),
            |registry| {
                registry.create_new_key("k", 10, size).unwrap();
                registry.delete_key("k").unwrap();
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

/// Benchmark metrics snapshots
fn bench_metrics(c: &mut Criterion) {
    let limiter = OnDemandLimiter::new(SlidingWindowConfig::per_second(HIGH_LIMIT));
    let _ = limiter.should_allow(10);

    c.bench_function("metrics_snapshot", |b| {
        b.iter(|| std::hint::black_box(limiter.metrics()));
    });

    c.bench_function("metrics_summary", |b| {
        let metrics = limiter.metrics();
        b.iter(|| std::hint::black_box(metrics.summary()));
    });
}

criterion_group!(
    benches,
    bench_single_decision,
    bench_on_demand_slides,
    bench_concurrent_decisions,
    bench_registry,
    bench_metrics,
);

criterion_main!(benches);
