use std::time::Duration;

use shardbed::Error;
use shardbed::HarnessConfig;
use shardbed::HealthError;
use shardbed::HealthReport;
use shardbed::HealthStatus;
use shardbed::HealthTarget;

use crate::commons::fixed_nodes_config;
use crate::commons::sim_harness;

/// With no outage, ensure_green converges well within the timeout.
#[tokio::test]
async fn test_ensure_green_on_quiet_cluster() {
    crate::enable_logger();
    let (harness, _provisioner) = sim_harness(fixed_nodes_config(3));
    harness.acquire_cluster().await.unwrap();

    let status = harness.ensure_green().await.unwrap();
    assert!(status.at_least(HealthStatus::Green));
}

/// Degraded polls delay satisfaction but do not fail the gate.
#[tokio::test]
async fn test_gate_waits_out_a_degraded_phase() {
    crate::enable_logger();
    let (harness, provisioner) = sim_harness(fixed_nodes_config(3));
    harness.acquire_cluster().await.unwrap();

    let sim = provisioner.last().unwrap();
    sim.faults().script_health([
        HealthReport {
            status: HealthStatus::Red,
            relocating_shards: 0,
            initializing_shards: 2,
            node_count: 3,
        },
        HealthReport {
            status: HealthStatus::Yellow,
            relocating_shards: 1,
            initializing_shards: 0,
            node_count: 3,
        },
    ]);

    // scripted degradation drains, then the derived green answer satisfies
    let status = harness.ensure_green().await.unwrap();
    assert_eq!(status, HealthStatus::Green);
}

/// Requesting GREEN with 3 expected nodes while only 2 respond is a
/// timeout, not a success.
#[tokio::test(start_paused = true)]
async fn test_missing_node_is_a_timeout() {
    crate::enable_logger();
    let config = HarnessConfig {
        health_timeout_ms: 1_000,
        ..fixed_nodes_config(3)
    };
    let (harness, provisioner) = sim_harness(config);
    harness.acquire_cluster().await.unwrap();

    let sim = provisioner.last().unwrap();
    sim.faults().set_unreachable_nodes(1);

    let err = harness.ensure_green().await.unwrap_err();
    match err {
        Error::Health(HealthError::Timeout { target, last, .. }) => {
            assert_eq!(target, "green");
            assert_eq!(last.unwrap().node_count, 2);
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
}

/// A custom target with its own deadline overrides the configured one.
#[tokio::test(start_paused = true)]
async fn test_custom_target_timeout() {
    crate::enable_logger();
    let (harness, provisioner) = sim_harness(fixed_nodes_config(2));
    harness.acquire_cluster().await.unwrap();

    let sim = provisioner.last().unwrap();
    sim.faults().set_unreachable_nodes(2);

    let target = HealthTarget::yellow()
        .timeout(Duration::from_millis(300))
        .expect_nodes(2);
    let err = harness.ensure_health(&target).await.unwrap_err();
    match err {
        Error::Health(HealthError::Timeout { elapsed, .. }) => {
            assert!(elapsed >= Duration::from_millis(300));
            assert!(elapsed < Duration::from_secs(5), "gate kept polling far too long");
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
}

/// wait_for_docs sees writes once they are refreshed into visibility.
#[tokio::test]
async fn test_wait_for_docs_converges_after_writes() {
    crate::enable_logger();
    let (harness, _provisioner) = sim_harness(HarnessConfig::default());
    harness.acquire_cluster().await.unwrap();
    harness.setup().await.unwrap();

    harness
        .run_workload(&crate::commons::batch("docs", 25), &Default::default())
        .await
        .unwrap();

    // no explicit refresh ran; wait_for_docs refreshes on stall itself
    let seen = harness.wait_for_docs(&["docs".to_string()], 25).await.unwrap();
    assert!(seen >= 25);
}
