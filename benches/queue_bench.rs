//! Benchmarks for the resource-loading scheduler.
//!
//! Covers submit throughput under capacity, mixed-priority admission,
//! and the sticky-loaded fast path.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;

use preflight::builders::SchedulerBuilder;
use preflight::config::LoaderConfig;
use preflight::core::{Priority, ResourceDescriptor, ResourceKind, ResourceScheduler};
use preflight::infra::StaticAdapter;
use preflight::runtime::TokioSpawner;

use tokio::runtime::Runtime;

fn build_scheduler(max_concurrent: usize) -> ResourceScheduler<TokioSpawner> {
    let config = LoaderConfig {
        max_concurrent_requests: max_concurrent,
        default_timeout_ms: 60_000,
        retry_delay_ms: 1_000,
        ..LoaderConfig::default()
    };
    SchedulerBuilder::new(TokioSpawner::current())
        .with_config(config)
        .register_adapter(ResourceKind::Fetch, Arc::new(StaticAdapter::new()))
        .build()
        .expect("valid config")
}

fn descriptor(i: u64, priority: Priority) -> ResourceDescriptor {
    ResourceDescriptor::new(format!("https://cdn.example/r{i}.json"), ResourceKind::Fetch)
        .with_priority(priority)
}

fn bench_submit_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_throughput");

    for count in [100u64, 1_000, 5_000] {
        group.throughput(Throughput::Elements(count));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.to_async(Runtime::new().unwrap()).iter(|| async move {
                let scheduler = build_scheduler(8);
                let outcome = scheduler
                    .preload_batch((0..count).map(|i| descriptor(i, Priority::Medium)).collect())
                    .await;
                black_box(outcome);
            });
        });
    }
    group.finish();
}

fn bench_mixed_priority_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_priority_admission");

    group.bench_function("mixed_500", |b| {
        b.to_async(Runtime::new().unwrap()).iter(|| async {
            let scheduler = build_scheduler(8);
            let descriptors = (0..500u64)
                .map(|i| {
                    let priority = match i % 5 {
                        0 => Priority::Critical,
                        1 => Priority::High,
                        2 => Priority::Medium,
                        3 => Priority::Low,
                        _ => Priority::Prefetch,
                    };
                    descriptor(i, priority)
                })
                .collect();
            let outcome = scheduler.preload_batch(descriptors).await;
            black_box(outcome);
        });
    });
    group.finish();
}

fn bench_sticky_loaded_fast_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("sticky_loaded_fast_path");

    for resubmits in [100u64, 1_000] {
        group.throughput(Throughput::Elements(resubmits));
        group.bench_with_input(
            BenchmarkId::from_parameter(resubmits),
            &resubmits,
            |b, &resubmits| {
                b.to_async(Runtime::new().unwrap()).iter(|| async move {
                    let scheduler = build_scheduler(4);
                    scheduler
                        .submit(descriptor(0, Priority::Critical))
                        .settled()
                        .await
                        .unwrap();
                    // Every further submit of the same url resolves from the
                    // loaded set without touching the adapter.
                    for _ in 0..resubmits {
                        let handle = scheduler.submit(descriptor(0, Priority::Low));
                        black_box(handle.settled().await.is_ok());
                    }
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    scheduler_benches,
    bench_submit_throughput,
    bench_mixed_priority_admission,
    bench_sticky_loaded_fast_path
);

criterion_main!(scheduler_benches);
