use std::time::Duration;

use crate::cluster::HealthStatus;
use crate::constants::DEFAULT_HEALTH_TIMEOUT_MS;

/// The condition a health gate waits for.
///
/// A gate call either observes a status at least as good as `status` (with
/// the shard/node side conditions) or fails with a timeout; it never
/// returns silently degraded.
#[derive(Debug, Clone)]
pub struct HealthTarget {
    pub status: HealthStatus,
    pub timeout: Duration,
    /// Indices the health request is scoped to; empty means all.
    pub indices: Vec<String>,
    /// Require zero relocating shards. On by default: a relocating shard
    /// means the cluster has not converged yet.
    pub no_relocating: bool,
    /// Additionally require zero initializing shards.
    pub no_initializing: bool,
    /// Exact number of nodes that must be responding. Guards against a
    /// stale state that still lists a stopped node.
    pub expected_nodes: Option<usize>,
}

impl HealthTarget {
    pub fn status(status: HealthStatus) -> Self {
        Self {
            status,
            timeout: Duration::from_millis(DEFAULT_HEALTH_TIMEOUT_MS),
            indices: vec![],
            no_relocating: true,
            no_initializing: false,
            expected_nodes: None,
        }
    }

    pub fn green() -> Self {
        Self::status(HealthStatus::Green)
    }

    pub fn yellow() -> Self {
        Self::status(HealthStatus::Yellow)
    }

    pub fn timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn indices(
        mut self,
        indices: Vec<String>,
    ) -> Self {
        self.indices = indices;
        self
    }

    pub fn require_no_initializing(mut self) -> Self {
        self.no_initializing = true;
        self
    }

    pub fn allow_relocating(mut self) -> Self {
        self.no_relocating = false;
        self
    }

    pub fn expect_nodes(
        mut self,
        count: usize,
    ) -> Self {
        self.expected_nodes = Some(count);
        self
    }
}
