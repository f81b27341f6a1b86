use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use parking_lot::Mutex;

use crate::cluster::HealthReport;
use crate::cluster::PendingTask;

/// How a node's locally-served state diverges from the master's.
#[derive(Debug, Clone)]
pub enum Divergence {
    /// Same version and master, but tampered content. A consistency check
    /// must flag this.
    TamperedContent,
    /// The node lags behind at an older state version. An expected
    /// transient; a consistency check must skip it.
    StaleVersion,
}

/// Scripted misbehavior for a [`SimCluster`](super::SimCluster).
///
/// Everything defaults to "healthy"; tests opt into individual faults.
#[derive(Default)]
pub struct FaultPlan {
    reject_next_writes: AtomicUsize,
    fail_write_ids: Mutex<HashSet<String>>,
    write_delay: Mutex<Option<Duration>>,
    health_script: Mutex<VecDeque<HealthReport>>,
    pending_tasks: Mutex<Vec<PendingTask>>,
    divergence: Mutex<Vec<(String, Divergence)>>,
    fail_on_close: AtomicBool,
    unreachable_nodes: AtomicUsize,
}

impl FaultPlan {
    /// The next `n` single-document writes are rejected with admission
    /// pressure. Retries then succeed.
    pub fn reject_next_writes(
        &self,
        n: usize,
    ) {
        self.reject_next_writes.store(n, Ordering::SeqCst);
    }

    pub(super) fn take_rejection(&self) -> bool {
        self.reject_next_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Writes (and bulk items) with this id always fail semantically.
    pub fn fail_writes_with_id(
        &self,
        id: impl Into<String>,
    ) {
        self.fail_write_ids.lock().insert(id.into());
    }

    pub(super) fn write_should_fail(
        &self,
        id: &str,
    ) -> bool {
        self.fail_write_ids.lock().contains(id)
    }

    /// Every single-document write takes this long. Used to hold
    /// operations in flight.
    pub fn delay_writes(
        &self,
        delay: Duration,
    ) {
        *self.write_delay.lock() = Some(delay);
    }

    pub(super) fn write_delay(&self) -> Option<Duration> {
        *self.write_delay.lock()
    }

    /// Serve these health reports, in order, before falling back to the
    /// derived healthy answer.
    pub fn script_health(
        &self,
        reports: impl IntoIterator<Item = HealthReport>,
    ) {
        self.health_script.lock().extend(reports);
    }

    pub(super) fn next_scripted_health(&self) -> Option<HealthReport> {
        self.health_script.lock().pop_front()
    }

    pub fn script_pending_tasks(
        &self,
        tasks: Vec<PendingTask>,
    ) {
        *self.pending_tasks.lock() = tasks;
    }

    pub(super) fn scripted_pending_tasks(&self) -> Vec<PendingTask> {
        self.pending_tasks.lock().clone()
    }

    /// The given node serves a divergent local state.
    pub fn diverge_node(
        &self,
        node: impl Into<String>,
        divergence: Divergence,
    ) {
        self.divergence.lock().push((node.into(), divergence));
    }

    pub(super) fn divergence_for(
        &self,
        node: &str,
    ) -> Option<Divergence> {
        self.divergence
            .lock()
            .iter()
            .find(|(n, _)| n == node)
            .map(|(_, d)| d.clone())
    }

    /// `close()` fails. Exercises best-effort teardown paths.
    pub fn fail_on_close(&self) {
        self.fail_on_close.store(true, Ordering::SeqCst);
    }

    pub(super) fn close_should_fail(&self) -> bool {
        self.fail_on_close.load(Ordering::SeqCst)
    }

    /// This many nodes stop answering health requests (they drop out of
    /// the responding node count).
    pub fn set_unreachable_nodes(
        &self,
        n: usize,
    ) {
        self.unreachable_nodes.store(n, Ordering::SeqCst);
    }

    pub(super) fn unreachable_nodes(&self) -> usize {
        self.unreachable_nodes.load(Ordering::SeqCst)
    }
}
