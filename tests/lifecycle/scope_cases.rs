use std::sync::Arc;

use shardbed::sim::SimProvisioner;
use shardbed::ClusterRegistry;
use shardbed::HarnessConfig;
use shardbed::Scope;
use shardbed::WorkloadOptions;

use crate::commons::batch;
use crate::commons::sim_harness;

/// SUITE scope: one build, every acquire returns the cached cluster.
#[tokio::test]
async fn test_suite_scope_builds_once() {
    crate::enable_logger();
    let (harness, provisioner) = sim_harness(HarnessConfig::default());

    let first = harness.acquire_cluster().await.unwrap();
    let second = harness.acquire_cluster().await.unwrap();

    assert_eq!(first.id(), second.id());
    assert_eq!(provisioner.provisions(), 1);
}

/// TEST scope: every acquire closes the previous cluster and builds fresh.
#[tokio::test]
async fn test_test_scope_rebuilds_each_time() {
    crate::enable_logger();
    let config = HarnessConfig {
        scope: Scope::Test,
        ..Default::default()
    };
    let (harness, provisioner) = sim_harness(config);

    let first = harness.acquire_cluster().await.unwrap();
    let second = harness.acquire_cluster().await.unwrap();

    assert_ne!(first.id(), second.id());
    assert_eq!(provisioner.provisions(), 2);
    let built = provisioner.built();
    assert!(built[0].is_closed(), "previous test-scoped cluster kept running");
    assert!(!built[1].is_closed());
}

/// Setup wipes data left behind by a previous test on the shared cluster.
#[tokio::test]
async fn test_setup_wipes_leftover_indices() {
    crate::enable_logger();
    let (harness, _provisioner) = sim_harness(HarnessConfig::default());
    harness.acquire_cluster().await.unwrap();
    harness.setup().await.unwrap();

    harness
        .run_workload(
            &batch("leftover", 10),
            &WorkloadOptions {
                force_refresh: true,
                decoys: false,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let handle = harness.cluster().unwrap();
    assert_eq!(handle.count(&[]).await.unwrap(), 10);

    // next test's setup starts from a clean slate
    harness.setup().await.unwrap();
    assert_eq!(handle.count(&[]).await.unwrap(), 0);
    assert!(handle.state(None, false).await.unwrap().indices.is_empty());
}

/// Excluded templates survive the wipe.
#[tokio::test]
async fn test_wipe_honors_template_exclusions() {
    crate::enable_logger();
    let config = HarnessConfig {
        exclude_templates: vec!["pinned_template".to_string()],
        ..Default::default()
    };
    let (harness, _provisioner) = sim_harness(config);
    harness.acquire_cluster().await.unwrap();

    let handle = harness.cluster().unwrap();
    handle
        .put_template(&shardbed::TemplateSpec {
            name: "pinned_template".to_string(),
            patterns: vec!["pinned-*".to_string()],
            order: 5,
            settings: Default::default(),
        })
        .await
        .unwrap();

    harness.setup().await.unwrap();

    // the pinned template is still installed alongside the fresh random one
    let names = handle.list_templates().await.unwrap();
    assert!(names.contains(&"pinned_template".to_string()), "exclusion was wiped: {names:?}");
    assert!(names.contains(&"random_index_template".to_string()), "missing: {names:?}");
}

/// release_all attempts every cluster even when one refuses to close.
#[tokio::test]
async fn test_release_all_is_best_effort() {
    crate::enable_logger();
    let provisioner = Arc::new(SimProvisioner::new());
    let registry = ClusterRegistry::new(HarnessConfig::default(), provisioner.clone());

    registry.acquire("suite_a", Scope::Suite, 1).await.unwrap();
    registry.acquire("suite_b", Scope::Suite, 2).await.unwrap();

    let built = provisioner.built();
    built[0].faults().fail_on_close();

    let err = registry.release_all().await.unwrap_err();
    assert_eq!(err.failures.len(), 1);
    // the failing cluster did not prevent closing the healthy one
    assert!(built[1].is_closed());
    assert!(registry.is_empty());
}
