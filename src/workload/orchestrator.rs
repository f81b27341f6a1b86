use std::collections::BTreeSet;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use lazy_static::lazy_static;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::bulk_chunk_size;
use super::choose_strategy;
use super::Strategy;
use super::WriteBatch;
use crate::cluster::ClusterHandle;
use crate::cluster::ShardFailure;
use crate::cluster::WriteOp;
use crate::cluster::WriteOutcome;
use crate::config::WorkloadConfig;
use crate::constants::DECOY_ID_PREFIX;
use crate::Admission;
use crate::BackendError;
use crate::FailedWrite;
use crate::RandomSource;
use crate::WorkloadError;

lazy_static! {
    /// Monotonic suffix keeping decoy ids unique across orchestrator runs
    /// in one process.
    static ref DECOY_SEQ: AtomicUsize = AtomicUsize::new(0);
}

/// Per-call workload options.
#[derive(Debug, Clone)]
pub struct WorkloadOptions {
    /// Issue one final refresh over the batch's indices and fail on any
    /// shard failure.
    pub force_refresh: bool,
    /// Allow decoy-document injection for this batch.
    pub decoys: bool,
    /// Allow opportunistic flushes between submissions.
    pub maybe_flush: bool,
    /// Pin the execution strategy instead of drawing one. Test hook.
    pub forced_strategy: Option<Strategy>,
    /// Optional external deadline on the completion join. The join itself
    /// is unbounded by design (a hung operation should hang the test); a
    /// firing deadline fails loudly, reporting the operations still in
    /// flight.
    pub deadline: Option<Duration>,
}

impl Default for WorkloadOptions {
    fn default() -> Self {
        Self {
            force_refresh: false,
            decoys: true,
            maybe_flush: true,
            forced_strategy: None,
            deadline: None,
        }
    }
}

/// What a finished workload did, for assertions and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadReport {
    pub strategy: Strategy,
    /// Non-decoy operations submitted.
    pub submitted: usize,
    pub decoys_injected: usize,
    pub bulk_requests: usize,
    pub single_writes: usize,
    pub retried_rejections: usize,
    /// Highest number of concurrently outstanding operations observed.
    pub in_flight_high_water: usize,
}

/// Executes a [`WriteBatch`] while maximizing the chance of hitting
/// concurrency and deletion edge cases.
///
/// By the time `run` returns, every operation has either been durably
/// applied or classified as a genuine failure: asynchronous completions are
/// all joined, transient admission rejections are retried once
/// synchronously, decoys are retracted.
pub struct IndexingOrchestrator {
    config: WorkloadConfig,
    rng: RandomSource,
}

impl IndexingOrchestrator {
    pub fn new(
        config: WorkloadConfig,
        rng: RandomSource,
    ) -> Self {
        Self { config, rng }
    }

    pub async fn run(
        &mut self,
        handle: &ClusterHandle,
        batch: &WriteBatch,
        options: &WorkloadOptions,
    ) -> std::result::Result<WorkloadReport, WorkloadError> {
        // Decoys go into a private copy; the caller's batch is never
        // touched.
        let mut ops: Vec<WriteOp> = batch.ops().to_vec();
        let decoys = if options.decoys && self.config.decoys {
            self.inject_decoys(batch, &mut ops)
        } else {
            vec![]
        };

        self.rng.shuffle(&mut ops);

        let n = ops.len();
        let strategy = options
            .forced_strategy
            .unwrap_or_else(|| choose_strategy(n, &self.config, &mut self.rng));
        info!("indexing [{n}] docs ({} decoy(s)) using {strategy} strategy", decoys.len());

        let indices: Vec<String> = ops
            .iter()
            .map(|op| op.index.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let cancel = CancellationToken::new();
        if let Some(deadline) = options.deadline {
            let token = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                token.cancel();
            });
        }

        let mut report = WorkloadReport {
            strategy,
            submitted: batch.len(),
            decoys_injected: decoys.len(),
            bulk_requests: 0,
            single_writes: 0,
            retried_rejections: 0,
            in_flight_high_water: 0,
        };
        let mut pending = PendingOperations::new(cancel);
        let mut errors: Vec<FailedWrite> = Vec::new();

        match strategy {
            Strategy::Bulk => {
                let chunk = bulk_chunk_size(n, &self.config, &mut self.rng);
                debug!("bulk chunk size [{chunk}] for [{n}] docs");
                for segment in ops.chunks(chunk.max(1)) {
                    report.bulk_requests += 1;
                    let results = handle.bulk_write(segment).await?;
                    let failures: Vec<FailedWrite> = results
                        .into_iter()
                        .filter_map(|item| item.err())
                        .map(|failure| FailedWrite {
                            cause: BackendError::Semantic(failure.reason),
                            op: failure.op,
                        })
                        .collect();
                    // any item failure is a hard batch failure, not retried
                    if !failures.is_empty() {
                        return Err(WorkloadError::BulkFailure { failures });
                    }
                }
            }
            Strategy::Sync => {
                for op in &ops {
                    report.single_writes += 1;
                    if let Err(cause) = handle.write(op).await {
                        errors.push(FailedWrite { op: op.clone(), cause });
                    }
                    self.post_submit_actions(handle, &indices, options, &mut pending, &mut errors)
                        .await?;
                }
            }
            Strategy::Async => {
                for op in &ops {
                    report.single_writes += 1;
                    pending.admit(self.config.max_in_flight, &mut errors).await?;
                    pending.submit_write(handle, op.clone());
                    self.post_submit_actions(handle, &indices, options, &mut pending, &mut errors)
                        .await?;
                }
            }
        }

        // all completions observed before return
        pending.join(&mut errors).await?;
        report.in_flight_high_water = pending.high_water();

        self.reconcile(handle, errors, &mut report).await?;
        self.retract_decoys(handle, &decoys).await?;

        if options.force_refresh {
            let failures = handle.refresh(&indices).await?;
            if !failures.is_empty() {
                return Err(WorkloadError::RefreshFailed { failures });
            }
        }

        Ok(report)
    }

    /// Append `1..=2n` synthetic documents to the private copy, each routed
    /// by its own id so it lands on a deterministic shard regardless of any
    /// mapping-level routing requirement.
    fn inject_decoys(
        &mut self,
        batch: &WriteBatch,
        ops: &mut Vec<WriteOp>,
    ) -> Vec<WriteOp> {
        if batch.is_empty() || !self.rng.bool() {
            return vec![];
        }

        let index_types = batch.indices_and_types();
        let count = self.rng.between(1, batch.len() * 2);
        let fragment_len = self.rng.between(1, 10);
        let mut decoys = Vec::with_capacity(count);

        for _ in 0..count {
            let seq = DECOY_SEQ.fetch_add(1, Ordering::Relaxed);
            let id = format!("{DECOY_ID_PREFIX}{}{seq}", self.rng.id_fragment(fragment_len));
            let (index, types) = self.rng.pick(&index_types);
            let doc_type = self.rng.pick(types);
            let op = WriteOp::new(index.clone(), doc_type.clone(), id.clone(), b"{}".to_vec())
                .routing(id);
            decoys.push(op.clone());
            ops.push(op);
        }
        decoys
    }

    /// Maybe refresh, flush or force-merge, then always fall back under the
    /// in-flight ceiling.
    async fn post_submit_actions(
        &mut self,
        handle: &ClusterHandle,
        indices: &[String],
        options: &WorkloadOptions,
        pending: &mut PendingOperations,
        errors: &mut Vec<FailedWrite>,
    ) -> std::result::Result<(), WorkloadError> {
        if self.rng.rarely() {
            if self.rng.rarely() {
                pending.admit(self.config.max_in_flight, errors).await?;
                let h = handle.clone();
                let idx = indices.to_vec();
                pending.submit_maintenance("refresh", async move { h.refresh(&idx).await });
            } else if options.maybe_flush && self.rng.rarely() {
                pending.admit(self.config.max_in_flight, errors).await?;
                let durable = self.rng.bool();
                let h = handle.clone();
                let idx = indices.to_vec();
                pending.submit_maintenance("flush", async move { h.flush(&idx, durable).await });
            } else if self.rng.rarely() {
                pending.admit(self.config.max_in_flight, errors).await?;
                let max_segments = self.rng.between(1, 10) as u32;
                let h = handle.clone();
                let idx = indices.to_vec();
                pending.submit_maintenance("force-merge", async move {
                    h.force_merge(&idx, max_segments).await
                });
            }
        }
        pending.admit(self.config.max_in_flight, errors).await
    }

    /// Classify each captured error once: transient admission rejections
    /// are re-submitted synchronously and discarded on success; everything
    /// else (including a second rejection on the retry) is genuine.
    async fn reconcile(
        &mut self,
        handle: &ClusterHandle,
        errors: Vec<FailedWrite>,
        report: &mut WorkloadReport,
    ) -> std::result::Result<(), WorkloadError> {
        let mut remaining = Vec::new();
        for failed in errors {
            match failed.cause.admission() {
                Admission::Transient => {
                    report.retried_rejections += 1;
                    debug!("re-indexing rejected op [{}/{}]", failed.op.index, failed.op.id);
                    if let Err(cause) = handle.write(&failed.op).await {
                        remaining.push(FailedWrite { op: failed.op, cause });
                    }
                }
                Admission::Permanent => remaining.push(failed),
            }
        }

        if remaining.is_empty() {
            Ok(())
        } else {
            Err(WorkloadError::WriteFailures { failures: remaining })
        }
    }

    /// Delete every decoy again - it might trigger merges or at least holes
    /// in the segments and enforces deleted docs. Anything but a successful
    /// delete is a consistency bug in the path under test.
    async fn retract_decoys(
        &self,
        handle: &ClusterHandle,
        decoys: &[WriteOp],
    ) -> std::result::Result<(), WorkloadError> {
        for decoy in decoys {
            let outcome = handle
                .delete(&decoy.index, &decoy.doc_type, &decoy.id, Some(&decoy.id))
                .await;
            match outcome {
                Ok(WriteOutcome::Deleted) => {}
                Ok(other) => {
                    return Err(WorkloadError::DecoyRetraction {
                        index: decoy.index.clone(),
                        id: decoy.id.clone(),
                        reason: format!("unexpected delete outcome {other:?}"),
                    })
                }
                Err(e) => {
                    return Err(WorkloadError::DecoyRetraction {
                        index: decoy.index.clone(),
                        id: decoy.id.clone(),
                        reason: e.to_string(),
                    })
                }
            }
        }
        Ok(())
    }
}

enum Completion {
    Write {
        op: WriteOp,
        result: std::result::Result<WriteOutcome, BackendError>,
    },
    Maintenance {
        kind: &'static str,
        result: std::result::Result<Vec<ShardFailure>, BackendError>,
    },
}

/// Outstanding asynchronous operations.
///
/// Each submission spawns a task that reports its typed result into a
/// channel; waiting means draining completions, not counting down shared
/// latches. The orchestrator's thread is the only one that blocks.
struct PendingOperations {
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    outstanding: usize,
    high_water: usize,
    cancel: CancellationToken,
}

impl PendingOperations {
    fn new(cancel: CancellationToken) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            outstanding: 0,
            high_water: 0,
            cancel,
        }
    }

    fn high_water(&self) -> usize {
        self.high_water
    }

    fn submit_write(
        &mut self,
        handle: &ClusterHandle,
        op: WriteOp,
    ) {
        self.track();
        let tx = self.tx.clone();
        let handle = handle.clone();
        tokio::spawn(async move {
            let result = handle.write(&op).await;
            let _ = tx.send(Completion::Write { op, result });
        });
    }

    fn submit_maintenance<F>(
        &mut self,
        kind: &'static str,
        fut: F,
    ) where
        F: std::future::Future<Output = std::result::Result<Vec<ShardFailure>, BackendError>>
            + Send
            + 'static,
    {
        self.track();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = fut.await;
            let _ = tx.send(Completion::Maintenance { kind, result });
        });
    }

    fn track(&mut self) {
        self.outstanding += 1;
        self.high_water = self.high_water.max(self.outstanding);
    }

    /// Block until the number of outstanding operations is below `ceiling`.
    /// Called before every submission, so the ceiling is never exceeded.
    async fn admit(
        &mut self,
        ceiling: usize,
        errors: &mut Vec<FailedWrite>,
    ) -> std::result::Result<(), WorkloadError> {
        while self.outstanding >= ceiling {
            self.drain_one(errors).await?;
        }
        Ok(())
    }

    /// Wait for every outstanding operation. Unbounded unless an external
    /// deadline token fires.
    async fn join(
        &mut self,
        errors: &mut Vec<FailedWrite>,
    ) -> std::result::Result<(), WorkloadError> {
        while self.outstanding > 0 {
            self.drain_one(errors).await?;
        }
        Ok(())
    }

    async fn drain_one(
        &mut self,
        errors: &mut Vec<FailedWrite>,
    ) -> std::result::Result<(), WorkloadError> {
        let completion = tokio::select! {
            _ = self.cancel.cancelled() => {
                return Err(WorkloadError::DeadlineExceeded {
                    outstanding: self.outstanding,
                });
            }
            completion = self.rx.recv() => {
                match completion {
                    Some(completion) => completion,
                    // we hold a sender ourselves, so this cannot trigger
                    // while operations are outstanding
                    None => {
                        self.outstanding = 0;
                        return Ok(());
                    }
                }
            }
        };

        self.outstanding -= 1;
        match completion {
            Completion::Write { op, result } => {
                if let Err(cause) = result {
                    errors.push(FailedWrite { op, cause });
                }
            }
            Completion::Maintenance { kind, result } => match result {
                Ok(failures) if !failures.is_empty() => {
                    // opportunistic maintenance is allowed to fail on
                    // shards mid-churn; it must not fail the batch
                    warn!("{kind} reported {} shard failure(s) during workload", failures.len());
                }
                Ok(_) => {}
                Err(e) => warn!("{kind} during workload failed: {e}"),
            },
        }
        Ok(())
    }
}
