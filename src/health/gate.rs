use std::time::Duration;

use tokio::time::sleep;
use tokio::time::Instant;
use tracing::debug;
use tracing::info;

use super::HealthTarget;
use crate::cluster::ClusterHandle;
use crate::cluster::HealthReport;
use crate::cluster::HealthStatus;
use crate::constants::HEALTH_POLL_INTERVAL_MS;
use crate::HealthDiagnostics;
use crate::HealthError;

/// Polls a cluster until a [`HealthTarget`] holds or its timeout elapses.
///
/// `POLLING → SATISFIED | TIMED_OUT`: a satisfied gate returns the observed
/// status, a timed-out gate returns a terminal error carrying the last
/// observation plus a diagnostic snapshot (full state, pending tasks) for
/// failure reporting.
#[derive(Debug, Clone)]
pub struct HealthGate {
    poll_interval: Duration,
}

impl Default for HealthGate {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(HEALTH_POLL_INTERVAL_MS),
        }
    }
}

impl HealthGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poll_interval(
        mut self,
        interval: Duration,
    ) -> Self {
        self.poll_interval = interval;
        self
    }

    pub async fn ensure(
        &self,
        handle: &ClusterHandle,
        target: &HealthTarget,
    ) -> std::result::Result<HealthStatus, HealthError> {
        let started = Instant::now();
        let mut last: Option<HealthReport> = None;

        loop {
            match handle.health(&target.indices).await {
                Ok(report) => {
                    if Self::satisfied(&report, target) {
                        debug!(
                            "cluster is {} (requested {})",
                            report.status, target.status
                        );
                        return Ok(report.status);
                    }
                    last = Some(report);
                }
                // nodes may still be coming up; the deadline decides
                Err(e) => debug!("health poll failed: {e}"),
            }

            if started.elapsed() >= target.timeout {
                let diagnostics = Self::diagnostics(handle).await;
                info!(
                    "ensure {} timed out, cluster state:\n{:?}\npending tasks: {:?}",
                    target.status, diagnostics.state, diagnostics.pending_tasks
                );
                return Err(HealthError::Timeout {
                    target: target.status.to_string(),
                    elapsed: started.elapsed(),
                    last,
                    diagnostics: Box::new(diagnostics),
                });
            }

            sleep(self.poll_interval).await;
        }
    }

    /// Waits for all relocating shards to become active, optionally also
    /// requiring the given status.
    pub async fn wait_for_relocation(
        &self,
        handle: &ClusterHandle,
        status: Option<HealthStatus>,
    ) -> std::result::Result<HealthStatus, HealthError> {
        // RED is always satisfied severity-wise, leaving only the
        // relocation condition
        let target = HealthTarget::status(status.unwrap_or(HealthStatus::Red));
        self.ensure(handle, &target).await
    }

    /// Waits until at least `min_docs` documents are visible to search,
    /// issuing a refresh whenever the count stalls.
    pub async fn wait_for_docs(
        &self,
        handle: &ClusterHandle,
        indices: &[String],
        min_docs: u64,
        timeout: Duration,
    ) -> std::result::Result<u64, HealthError> {
        let started = Instant::now();
        let mut last_count = 0u64;

        loop {
            let count = match handle.count(indices).await {
                Ok(count) => count,
                // count acts like a search and fails while shards start up
                Err(e) => {
                    debug!("failed to execute count: {e}");
                    0
                }
            };

            if count >= min_docs {
                debug!("[{count}] docs visible for search (waited for [{min_docs}])");
                return Ok(count);
            }

            if count == last_count {
                // no progress - refresh for the next round
                let _ = handle.refresh(indices).await;
            }
            last_count = count;

            if started.elapsed() >= timeout {
                return Err(HealthError::DocsTimeout {
                    expected: min_docs,
                    seen: count,
                    elapsed: started.elapsed(),
                });
            }

            sleep(self.poll_interval).await;
        }
    }

    fn satisfied(
        report: &HealthReport,
        target: &HealthTarget,
    ) -> bool {
        if !report.status.at_least(target.status) {
            return false;
        }
        if target.no_relocating && report.relocating_shards > 0 {
            return false;
        }
        if target.no_initializing && report.initializing_shards > 0 {
            return false;
        }
        if let Some(expected) = target.expected_nodes {
            if report.node_count != expected {
                return false;
            }
        }
        true
    }

    /// Best-effort failure context; a dead cluster yields an empty snapshot
    /// rather than a second error.
    async fn diagnostics(handle: &ClusterHandle) -> HealthDiagnostics {
        HealthDiagnostics {
            state: handle.state(None, false).await.ok(),
            pending_tasks: handle.pending_tasks().await.unwrap_or_default(),
        }
    }
}
