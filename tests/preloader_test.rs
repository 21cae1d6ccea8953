//! Integration tests for start-up sequencing and route prefetch.

use std::sync::Arc;

use preflight::builders::SchedulerBuilder;
use preflight::config::LoaderConfig;
use preflight::core::{
    LoadError, Priority, ResourceAdapter, ResourceDescriptor, ResourceKind, ResourceScheduler,
};
use preflight::infra::StaticAdapter;
use preflight::preload::{CriticalResourcePreloader, PreloadPlan, PreloadStage, RoutePreload};
use preflight::runtime::TokioSpawner;

fn build_scheduler(adapter: Arc<StaticAdapter>) -> Arc<ResourceScheduler<TokioSpawner>> {
    let adapter: Arc<dyn ResourceAdapter> = adapter;
    let config = LoaderConfig {
        max_concurrent_requests: 4,
        default_timeout_ms: 2_000,
        retry_delay_ms: 10,
        ..LoaderConfig::default()
    };
    let scheduler = SchedulerBuilder::new(TokioSpawner::current())
        .with_config(config)
        .register_adapter(ResourceKind::Script, Arc::clone(&adapter))
        .register_adapter(ResourceKind::Style, Arc::clone(&adapter))
        .register_adapter(ResourceKind::Image, adapter)
        .build()
        .expect("valid config");
    Arc::new(scheduler)
}

fn script(url: &str, priority: Priority) -> ResourceDescriptor {
    ResourceDescriptor::new(url, ResourceKind::Script).with_priority(priority)
}

fn plan() -> PreloadPlan {
    PreloadPlan::new()
        .critical([
            script("https://cdn.example/core.js", Priority::Critical),
            script("https://cdn.example/boot.js", Priority::Critical),
        ])
        .essential([
            ResourceDescriptor::new("https://cdn.example/theme.css", ResourceKind::Style)
                .with_priority(Priority::High),
        ])
        .non_critical([
            ResourceDescriptor::new("https://cdn.example/hero.png", ResourceKind::Image)
                .with_priority(Priority::Low),
        ])
        .route(
            "dashboard",
            [script("https://cdn.example/dashboard.js", Priority::Prefetch)],
        )
}

#[tokio::test]
async fn run_walks_all_stages_to_complete() {
    let adapter = Arc::new(StaticAdapter::new());
    let scheduler = build_scheduler(Arc::clone(&adapter));
    let preloader = CriticalResourcePreloader::new(Arc::clone(&scheduler), plan());

    assert_eq!(preloader.stage(), PreloadStage::NotStarted);
    assert_eq!(preloader.progress(), 0);

    preloader.run().await.unwrap();

    assert_eq!(preloader.stage(), PreloadStage::Complete);
    assert_eq!(preloader.progress(), 100);
    assert!(scheduler.is_loaded("https://cdn.example/core.js"));
    assert!(scheduler.is_loaded("https://cdn.example/theme.css"));
    assert!(scheduler.is_loaded("https://cdn.example/hero.png"));
}

#[tokio::test]
async fn critical_member_exhaustion_aborts_the_sequence() {
    let adapter = Arc::new(StaticAdapter::new());
    adapter.fail_always("https://cdn.example/boot.js");
    let scheduler = build_scheduler(Arc::clone(&adapter));

    let preloader = CriticalResourcePreloader::new(
        Arc::clone(&scheduler),
        plan().critical([
            script("https://cdn.example/core.js", Priority::Critical),
            script("https://cdn.example/boot.js", Priority::Critical).with_max_retries(2),
        ]),
    );

    let result = preloader.run().await;
    assert!(matches!(result, Err(LoadError::Failed { .. })));
    assert_eq!(preloader.stage(), PreloadStage::Failed);
    assert_eq!(preloader.progress(), 0);

    // Exactly the full attempt sequence for the failing member.
    assert_eq!(adapter.calls_for("https://cdn.example/boot.js"), 3);
    // No later group was dispatched.
    assert_eq!(adapter.calls_for("https://cdn.example/theme.css"), 0);
    assert_eq!(adapter.calls_for("https://cdn.example/hero.png"), 0);
}

#[tokio::test]
async fn essential_failure_does_not_block_later_stages() {
    let adapter = Arc::new(StaticAdapter::new());
    adapter.fail_always("https://cdn.example/theme.css");
    let scheduler = build_scheduler(Arc::clone(&adapter));
    let preloader = CriticalResourcePreloader::new(Arc::clone(&scheduler), plan());

    preloader.run().await.unwrap();

    assert_eq!(preloader.stage(), PreloadStage::Complete);
    assert!(scheduler.has_failed("https://cdn.example/theme.css"));
    // The non-critical group still ran.
    assert!(scheduler.is_loaded("https://cdn.example/hero.png"));
}

#[tokio::test]
async fn run_is_a_noop_once_started() {
    let adapter = Arc::new(StaticAdapter::new());
    let scheduler = build_scheduler(Arc::clone(&adapter));
    let preloader = CriticalResourcePreloader::new(scheduler, plan());

    preloader.run().await.unwrap();
    let calls_after_first = adapter.total_calls();

    preloader.run().await.unwrap();
    assert_eq!(adapter.total_calls(), calls_after_first);
    assert_eq!(preloader.stage(), PreloadStage::Complete);
}

#[tokio::test]
async fn known_route_prefetches_best_effort() {
    let adapter = Arc::new(StaticAdapter::new());
    let scheduler = build_scheduler(Arc::clone(&adapter));
    let preloader = CriticalResourcePreloader::new(Arc::clone(&scheduler), plan());

    match preloader.preload_route("dashboard").await {
        RoutePreload::Completed(outcome) => {
            assert_eq!(outcome.attempted, 1);
            assert_eq!(outcome.loaded, 1);
        }
        RoutePreload::UnknownRoute => panic!("route is registered"),
    }
    assert!(scheduler.is_loaded("https://cdn.example/dashboard.js"));
}

#[tokio::test]
async fn unknown_route_is_explicit_not_silent() {
    let adapter = Arc::new(StaticAdapter::new());
    let scheduler = build_scheduler(Arc::clone(&adapter));
    let preloader = CriticalResourcePreloader::new(scheduler, plan());

    assert!(matches!(
        preloader.preload_route("settings").await,
        RoutePreload::UnknownRoute
    ));
    assert_eq!(adapter.total_calls(), 0);
}

#[tokio::test]
async fn stage_weights_are_fixed() {
    assert_eq!(PreloadStage::NotStarted.progress(), 0);
    assert_eq!(PreloadStage::CriticalReady.progress(), 40);
    assert_eq!(PreloadStage::LoadingNonCritical.progress(), 70);
    assert_eq!(PreloadStage::Complete.progress(), 100);
}
