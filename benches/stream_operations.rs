use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rx_lite::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn bench_basic_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("basic_operations");

    // Test different data sizes
    for size in [1_000u64, 10_000, 100_000].iter() {
        group.bench_with_input(BenchmarkId::new("map_chain", size), size, |b, &size| {
            let source = from_iter(0..size)
                .pipe(map(|x: u64, _| black_box(x * 2)))
                .pipe(map(|x: u64, i| black_box(x + i as u64)));
            b.iter(|| {
                let sum = Arc::new(AtomicU64::new(0));
                let s = sum.clone();
                source.subscribe(PartialObserver::next(move |v: u64| {
                    s.fetch_add(v, Ordering::Relaxed);
                }));
                black_box(sum.load(Ordering::Relaxed))
            });
        });

        group.bench_with_input(BenchmarkId::new("pipe_all", size), size, |b, &size| {
            let ops = (0..8).map(|_| map(|x: u64, _| black_box(x + 1))).collect();
            let source = from_iter(0..size).pipe_all(ops);
            b.iter(|| {
                let count = Arc::new(AtomicU64::new(0));
                let c = count.clone();
                source.subscribe(PartialObserver::next(move |_: u64| {
                    c.fetch_add(1, Ordering::Relaxed);
                }));
                black_box(count.load(Ordering::Relaxed))
            });
        });
    }

    group.finish();
}

fn bench_debounce(c: &mut Criterion) {
    let mut group = c.benchmark_group("debounce");

    for burst in [100u64, 10_000].iter() {
        group.bench_with_input(BenchmarkId::new("virtual_burst", burst), burst, |b, &burst| {
            b.iter(|| {
                let clock = VirtualScheduler::new();
                let emitted = Arc::new(AtomicU64::new(0));
                let e = emitted.clone();
                from_iter(0..burst)
                    .pipe(debounce_with_config(
                        DebounceConfig::new(Duration::from_millis(10)).flush_on_complete(true),
                        clock.clone(),
                    ))
                    .subscribe(PartialObserver::next(move |v: u64| {
                        e.store(v, Ordering::Relaxed);
                    }));
                clock.flush();
                black_box(emitted.load(Ordering::Relaxed))
            });
        });
    }

    group.finish();
}

fn bench_subscription_teardown(c: &mut Criterion) {
    c.bench_function("teardown_1000", |b| {
        b.iter(|| {
            let sub = Subscription::new();
            for _ in 0..1000 {
                sub.add(Teardown::action(|| {
                    black_box(());
                }));
            }
            sub.unsubscribe();
        });
    });
}

criterion_group!(
    benches,
    bench_basic_operations,
    bench_debounce,
    bench_subscription_teardown
);
criterion_main!(benches);
