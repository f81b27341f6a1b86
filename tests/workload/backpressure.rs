use std::time::Duration;

use shardbed::Error;
use shardbed::HarnessConfig;
use shardbed::Strategy;
use shardbed::WorkloadConfig;
use shardbed::WorkloadError;
use shardbed::WorkloadOptions;

use crate::commons::batch;
use crate::commons::sim_harness;

/// The in-flight count never exceeds the configured ceiling, even with
/// slow writes keeping many operations outstanding.
#[tokio::test]
async fn test_in_flight_never_exceeds_ceiling() {
    crate::enable_logger();
    let config = HarnessConfig {
        workload: WorkloadConfig {
            max_in_flight: 8,
            ..Default::default()
        },
        ..Default::default()
    };
    let (harness, provisioner) = sim_harness(config);
    harness.acquire_cluster().await.unwrap();
    harness.setup().await.unwrap();

    let sim = provisioner.last().unwrap();
    sim.faults().delay_writes(Duration::from_millis(2));

    let report = harness
        .run_workload(
            &batch("docs", 100),
            &WorkloadOptions {
                forced_strategy: Some(Strategy::Async),
                decoys: false,
                force_refresh: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(
        report.in_flight_high_water <= 8,
        "ceiling breached: high water {}",
        report.in_flight_high_water
    );
    // slow writes should actually have filled the window
    assert!(
        report.in_flight_high_water >= 2,
        "backpressure never engaged: high water {}",
        report.in_flight_high_water
    );

    let handle = harness.cluster().unwrap();
    assert_eq!(handle.count(&["docs".to_string()]).await.unwrap(), 100);
}

/// An external deadline fails loudly, reporting operations still in
/// flight, instead of silently dropping them.
#[tokio::test(start_paused = true)]
async fn test_deadline_fires_loudly_with_hung_writes() {
    crate::enable_logger();
    let (harness, provisioner) = sim_harness(HarnessConfig::default());
    harness.acquire_cluster().await.unwrap();

    // writes hang far beyond the deadline
    let sim = provisioner.last().unwrap();
    sim.faults().delay_writes(Duration::from_secs(3600));

    let err = harness
        .run_workload(
            &batch("docs", 5),
            &WorkloadOptions {
                forced_strategy: Some(Strategy::Async),
                decoys: false,
                deadline: Some(Duration::from_millis(200)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    match err {
        Error::Workload(WorkloadError::DeadlineExceeded { outstanding }) => {
            assert!(outstanding > 0, "deadline error must report hung operations");
        }
        other => panic!("expected DeadlineExceeded, got {other:?}"),
    }
}
