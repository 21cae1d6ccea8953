//! Tests for configuration-driven construction.

use std::sync::Arc;

use preflight::builders::SchedulerBuilder;
use preflight::config::{LoaderConfig, NetworkPolicyConfig};
use preflight::core::{LoadError, Priority, ResourceDescriptor, ResourceKind};
use preflight::infra::StaticAdapter;
use preflight::runtime::TokioSpawner;

#[tokio::test]
async fn invalid_config_is_rejected_at_build_time() {
    let config = LoaderConfig {
        max_concurrent_requests: 0,
        ..LoaderConfig::default()
    };
    let result = SchedulerBuilder::new(TokioSpawner::current())
        .with_config(config)
        .build();
    assert!(matches!(result, Err(LoadError::Config(_))));
}

#[tokio::test]
async fn json_config_drives_the_scheduler() {
    let json = r#"{
        "max_concurrent_requests": 3,
        "default_timeout_ms": 2000,
        "retry_delay_ms": 10,
        "network": { "slow_cap": 1, "moderate_cap": 2 }
    }"#;
    let config = LoaderConfig::from_json_str(json).unwrap();

    let scheduler = SchedulerBuilder::new(TokioSpawner::current())
        .with_config(config)
        .register_adapter(ResourceKind::Fetch, Arc::new(StaticAdapter::new()))
        .build()
        .unwrap();

    assert_eq!(scheduler.stats().max_concurrent, 3);
    scheduler
        .submit(
            ResourceDescriptor::new("https://cdn.example/data.json", ResourceKind::Fetch)
                .with_priority(Priority::High),
        )
        .settled()
        .await
        .unwrap();
    assert!(scheduler.is_loaded("https://cdn.example/data.json"));
}

#[tokio::test]
async fn zero_network_cap_is_rejected_at_build_time() {
    let config = LoaderConfig {
        network: NetworkPolicyConfig {
            slow_cap: 0,
            moderate_cap: 2,
        },
        ..LoaderConfig::default()
    };
    let result = SchedulerBuilder::new(TokioSpawner::current())
        .with_config(config)
        .build();
    assert!(matches!(result, Err(LoadError::Config(_))));
}
