//! Harness Error Hierarchy
//!
//! Defines the error types for the cluster test harness, categorized by
//! harness phase (provisioning, health gating, workload execution,
//! consistency checking, teardown) and by the backend contract.

use std::time::Duration;

use config::ConfigError;
use tokio::task::JoinError;

use crate::cluster::HealthReport;
use crate::cluster::PendingTask;
use crate::cluster::ShardFailure;
use crate::cluster::StateSnapshot;
use crate::cluster::WriteOp;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Cluster failed to build. Fatal, aborts the test run.
    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),

    /// Health gate deadline exceeded. Fails the current test only.
    #[error(transparent)]
    Health(#[from] HealthError),

    /// Write workload failures surfaced after reconciliation.
    #[error(transparent)]
    Workload(#[from] WorkloadError),

    /// Cluster state divergence across nodes.
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    /// Best-effort teardown failures, collected once all handles were
    /// attempted.
    #[error(transparent)]
    Teardown(#[from] TeardownError),

    /// Harness configuration validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A backend call failed outside of any richer harness context.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// An operation required an active cluster but none was acquired.
    #[error("no active cluster (acquire_cluster must run first)")]
    NoActiveCluster,

    /// Unrecoverable failures requiring the run to stop
    #[error("Fatal error: {0}")]
    Fatal(String),
}

/// Errors reported by a [`ClusterBackend`](crate::cluster::ClusterBackend)
/// implementation.
///
/// `Rejected` is the only transient class: the target refused the operation
/// under admission-control pressure and a retry may succeed. Every other
/// variant is permanent from the harness's point of view.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Transient admission-control rejection (the store was temporarily
    /// overloaded, not a semantic failure).
    #[error("operation rejected under admission pressure: {0}")]
    Rejected(String),

    /// Administrative request completed but was not acknowledged.
    #[error("request not acknowledged: {0}")]
    NotAcknowledged(String),

    /// Semantic failure from the store (mapping conflict, invalid payload).
    #[error("write failed: {0}")]
    Semantic(String),

    /// Endpoint unavailable or the cluster is already closed.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Document or index not found.
    #[error("not found: {index}/{id}")]
    NotFound { index: String, id: String },

    /// Disk I/O failures inside the backend
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Classification of a failed write, decided once at the boundary where the
/// backend result is received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Recovered locally by a single synchronous retry, never surfaced.
    Transient,
    /// Kept and surfaced as a batch failure.
    Permanent,
}

impl BackendError {
    /// Decide whether this failure is transient admission pressure or a
    /// genuine error.
    pub fn admission(&self) -> Admission {
        match self {
            BackendError::Rejected(_) => Admission::Transient,
            _ => Admission::Permanent,
        }
    }
}

/// Diagnostic snapshot attached to terminal health failures for test
/// reporting.
#[derive(Debug, Default)]
pub struct HealthDiagnostics {
    pub state: Option<StateSnapshot>,
    pub pending_tasks: Vec<PendingTask>,
}

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    /// The requested condition did not hold before the deadline. Terminal,
    /// non-retryable for the current gate call.
    #[error("timed out after {elapsed:?} waiting for {target} state (last observed: {last:?})")]
    Timeout {
        target: String,
        elapsed: Duration,
        last: Option<HealthReport>,
        diagnostics: Box<HealthDiagnostics>,
    },

    /// Fewer documents than expected became visible before the deadline.
    #[error("timed out after {elapsed:?} waiting for {expected} docs ({seen} seen)")]
    DocsTimeout {
        expected: u64,
        seen: u64,
        elapsed: Duration,
    },
}

/// One write operation that failed for a genuine (non-transient) reason.
#[derive(Debug)]
pub struct FailedWrite {
    pub op: WriteOp,
    pub cause: BackendError,
}

impl std::fmt::Display for FailedWrite {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "[{}/{}/{}]: {}",
            self.op.index, self.op.doc_type, self.op.id, self.cause
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkloadError {
    /// A bulk response contained item failures. Hard batch failure, never
    /// retried.
    #[error("bulk request failed for {} operation(s): {}", .failures.len(), format_failures(.failures))]
    BulkFailure { failures: Vec<FailedWrite> },

    /// Genuine write failures remaining after transient rejections were
    /// retried.
    #[error("{} write(s) failed: {}", .failures.len(), format_failures(.failures))]
    WriteFailures { failures: Vec<FailedWrite> },

    /// A decoy document could not be deleted. Indicates a consistency bug in
    /// the write/delete path under test.
    #[error("failed to delete decoy doc [{index}][{id}]: {reason}")]
    DecoyRetraction {
        index: String,
        id: String,
        reason: String,
    },

    /// The final refresh reported shard failures.
    #[error("refresh failed on {} shard(s)", .failures.len())]
    RefreshFailed { failures: Vec<ShardFailure> },

    /// The optional external deadline fired with operations still in flight.
    /// Incomplete operations are reported, never masked.
    #[error("workload deadline exceeded with {outstanding} operation(s) still in flight")]
    DeadlineExceeded { outstanding: usize },

    /// A transport-level failure while submitting a bulk chunk.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A spawned submission task panicked or was cancelled.
    #[error("workload task failed: {0}")]
    TaskFailed(#[from] JoinError),
}

fn format_failures(failures: &[FailedWrite]) -> String {
    failures.iter().map(|f| f.to_string()).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, thiserror::Error)]
pub enum ConsistencyError {
    /// A node at the master's state version served a different state.
    #[error("cluster state on node {node} diverges from master: {reason}\nmaster state:\n{master_state}\nlocal state:\n{local_state}")]
    Divergence {
        node: String,
        reason: String,
        master_state: String,
        local_state: String,
    },

    /// A node's state could not be fetched at all.
    #[error("failed to fetch cluster state from {node}")]
    StateFetch {
        node: String,
        #[source]
        cause: BackendError,
    },

    /// No node reported an elected master.
    #[error("no elected master in cluster state")]
    NoElectedMaster,

    /// Canonical state serialization failures
    #[error(transparent)]
    Encode(#[from] bincode::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    /// The provisioner could not build the requested cluster.
    #[error("cluster failed to build: {0}")]
    Failed(String),

    /// One node of the cluster failed to start.
    #[error("node {node} failed to start: {reason}")]
    NodeStartFailed { node: String, reason: String },

    /// The cluster spec was rejected before any node started.
    #[error("invalid cluster spec: {0}")]
    InvalidSpec(String),
}

/// Best-effort teardown outcome: every step is attempted, failures are
/// collected and surfaced once.
#[derive(Debug, Default, thiserror::Error)]
#[error("teardown left {} failure(s): {}", .failures.len(), format_teardown(.failures))]
pub struct TeardownError {
    pub failures: Vec<(String, String)>,
}

fn format_teardown(failures: &[(String, String)]) -> String {
    failures
        .iter()
        .map(|(what, cause)| format!("{what}: {cause}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl TeardownError {
    pub fn push(
        &mut self,
        what: impl Into<String>,
        cause: impl std::fmt::Display,
    ) {
        self.failures.push((what.into(), cause.to_string()));
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_result(self) -> std::result::Result<(), TeardownError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

// ============== Conversion Implementations ============== //
impl From<JoinError> for Error {
    fn from(err: JoinError) -> Self {
        WorkloadError::TaskFailed(err).into()
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        ConsistencyError::Encode(err).into()
    }
}
