use std::sync::Arc;

use arc_swap::ArcSwapOption;
use autometrics::autometrics;
use parking_lot::Mutex;
use tracing::debug;
use tracing::info;

use crate::cluster::ClusterHandle;
use crate::cluster::HealthStatus;
use crate::cluster::Scope;
use crate::cluster::Settings;
use crate::cluster::TemplateSpec;
use crate::config::HarnessConfig;
use crate::consistency::ConsistencyChecker;
use crate::constants::DEFAULT_MAX_NUM_SHARDS;
use crate::constants::DEFAULT_MIN_NUM_SHARDS;
use crate::constants::RANDOM_INDEX_TEMPLATE;
use crate::health::HealthGate;
use crate::health::HealthTarget;
use crate::registry::ClusterProvisioner;
use crate::registry::ClusterRegistry;
use crate::workload::IndexingOrchestrator;
use crate::workload::WorkloadOptions;
use crate::workload::WorkloadReport;
use crate::workload::WriteBatch;
use crate::Error;
use crate::RandomSource;
use crate::Result;
use crate::TeardownError;
use crate::API_SLO;

/// The harness context: one explicit object exposing cluster acquisition,
/// health gating, workload execution and consistency checking.
///
/// Construction resolves the configuration once; every random decision
/// afterwards flows from the configured seed.
pub struct Harness {
    config: HarnessConfig,
    registry: ClusterRegistry,
    gate: HealthGate,
    active: ArcSwapOption<ClusterHandle>,
    rng: Mutex<RandomSource>,
}

impl Harness {
    pub fn new(
        config: HarnessConfig,
        provisioner: Arc<dyn ClusterProvisioner>,
    ) -> Result<Self> {
        config.validate()?;
        let rng = RandomSource::from_seed(config.seed);
        Ok(Self {
            registry: ClusterRegistry::new(config.clone(), provisioner),
            gate: HealthGate::new(),
            active: ArcSwapOption::empty(),
            rng: Mutex::new(rng),
            config,
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn registry(&self) -> &ClusterRegistry {
        &self.registry
    }

    /// The active cluster handle, or [`Error::NoActiveCluster`] before
    /// acquisition.
    pub fn cluster(&self) -> Result<Arc<ClusterHandle>> {
        self.active.load_full().ok_or(Error::NoActiveCluster)
    }

    /// Acquire the cluster for this harness's suite, building one when the
    /// scope policy requires it.
    #[autometrics(objective = API_SLO)]
    pub async fn acquire_cluster(&self) -> Result<Arc<ClusterHandle>> {
        let handle = self
            .registry
            .acquire(&self.config.suite, self.config.scope, self.config.seed)
            .await?;
        self.active.store(Some(handle.clone()));
        Ok(handle)
    }

    /// Close and evict this suite's cluster. Safe to call when none was
    /// acquired.
    #[autometrics(objective = API_SLO)]
    pub async fn release_cluster(&self) -> Result<()> {
        self.active.store(None);
        self.registry.release(&self.config.suite).await?;
        Ok(())
    }

    /// Per-test setup: wipe leftovers and install a freshly randomized
    /// wildcard index template.
    #[autometrics(objective = API_SLO)]
    pub async fn setup(&self) -> Result<()> {
        let handle = self.cluster()?;
        handle.wipe(&self.config.exclude_templates).await?;
        let template = self.random_index_template(&handle);
        debug!("installing {} with settings {:?}", template.name, template.settings);
        handle.put_template(&template).await?;
        Ok(())
    }

    /// Wait until the cluster satisfies `target`.
    #[autometrics(objective = API_SLO)]
    pub async fn ensure_health(
        &self,
        target: &HealthTarget,
    ) -> Result<HealthStatus> {
        let handle = self.cluster()?;
        Ok(self.gate.ensure(&handle, target).await?)
    }

    /// Ensures the cluster is fully available, every node responding.
    pub async fn ensure_green(&self) -> Result<HealthStatus> {
        let target = self.default_target(HealthStatus::Green)?;
        self.ensure_health(&target).await
    }

    /// Ensures at least partial availability (every primary shard active).
    pub async fn ensure_yellow(&self) -> Result<HealthStatus> {
        let target = self.default_target(HealthStatus::Yellow)?;
        self.ensure_health(&target).await
    }

    pub async fn ensure_yellow_and_no_initializing(&self) -> Result<HealthStatus> {
        let target = self.default_target(HealthStatus::Yellow)?.require_no_initializing();
        self.ensure_health(&target).await
    }

    /// Waits for all relocating shards to become active, optionally also
    /// requiring a status.
    pub async fn wait_for_relocation(
        &self,
        status: Option<HealthStatus>,
    ) -> Result<HealthStatus> {
        let handle = self.cluster()?;
        Ok(self.gate.wait_for_relocation(&handle, status).await?)
    }

    /// Waits until at least `min_docs` documents are visible to search.
    pub async fn wait_for_docs(
        &self,
        indices: &[String],
        min_docs: u64,
    ) -> Result<u64> {
        let handle = self.cluster()?;
        Ok(self
            .gate
            .wait_for_docs(&handle, indices, min_docs, self.config.health_timeout())
            .await?)
    }

    /// Execute a write batch with randomized strategy, bounded async
    /// concurrency, decoy churn and transient-rejection recovery.
    #[autometrics(objective = API_SLO)]
    pub async fn run_workload(
        &self,
        batch: &WriteBatch,
        options: &WorkloadOptions,
    ) -> Result<WorkloadReport> {
        let handle = self.cluster()?;
        let rng = self.rng.lock().fork();
        let mut orchestrator = IndexingOrchestrator::new(self.config.workload, rng);
        let report = orchestrator.run(&handle, batch, options).await?;
        info!(
            "workload done: {} op(s) via {} ({} decoy(s), high water {})",
            report.submitted, report.strategy, report.decoys_injected, report.in_flight_high_water
        );
        Ok(report)
    }

    /// Verify all nodes agree with the master's cluster state.
    #[autometrics(objective = API_SLO)]
    pub async fn check_consistency(&self) -> Result<()> {
        let handle = self.cluster()?;
        ConsistencyChecker::check(&handle).await?;
        Ok(())
    }

    /// Per-test teardown: leftover-settings check, consistency check, wipe,
    /// and (for TEST scope) cluster shutdown.
    ///
    /// Consistency divergence propagates immediately; everything after it
    /// is best-effort with failures collected, so a broken step cannot
    /// leave later cleanup unattempted.
    pub async fn teardown(&self) -> Result<()> {
        let Some(handle) = self.active.load_full() else {
            return Ok(());
        };
        let mut teardown = TeardownError::default();

        if self.config.scope != Scope::Test {
            match handle.state(None, false).await {
                Ok(state) if !state.settings.is_empty() => {
                    teardown.push(
                        "test leaves cluster settings behind",
                        format!("{:?}", state.settings.keys().collect::<Vec<_>>()),
                    );
                }
                Ok(_) => {}
                Err(e) => teardown.push("fetch cluster settings", e),
            }
        }

        ConsistencyChecker::check(&handle).await?;

        // wipe after the checks so an un-acked delete fails the test that
        // caused it
        if let Err(e) = handle.wipe(&self.config.exclude_templates).await {
            teardown.push("wipe cluster", e);
        }

        if self.config.scope == Scope::Test {
            self.active.store(None);
            if let Err(e) = self.registry.release(&self.config.suite).await {
                teardown.push("close test-scoped cluster", e);
            }
        }

        teardown.into_result()?;
        Ok(())
    }

    /// Process-wide teardown: close every cluster this harness built.
    pub async fn shutdown(&self) -> Result<()> {
        self.active.store(None);
        self.registry.release_all().await?;
        Ok(())
    }

    fn default_target(
        &self,
        status: HealthStatus,
    ) -> Result<HealthTarget> {
        let handle = self.cluster()?;
        Ok(HealthTarget::status(status)
            .timeout(self.config.health_timeout())
            .expect_nodes(handle.nodes().len()))
    }

    /// A wildcard template with randomized index settings, drawn from the
    /// harness seed.
    fn random_index_template(
        &self,
        handle: &ClusterHandle,
    ) -> TemplateSpec {
        let mut rng = self.rng.lock();
        let mut settings = Settings::new();

        let shards = rng.between(DEFAULT_MIN_NUM_SHARDS as usize, DEFAULT_MAX_NUM_SHARDS as usize);
        settings.insert("index.number_of_shards".to_string(), shards.to_string());

        // use either 0 or 1 replica, yet a higher amount when possible, but
        // only rarely
        let data_nodes = handle.nodes().iter().filter(|n| n.data).count();
        let max_replicas = data_nodes.saturating_sub(1);
        let replicas = if rng.frequently() { max_replicas.min(1) } else { max_replicas };
        settings.insert("index.number_of_replicas".to_string(), replicas.to_string());

        if rng.bool() {
            settings.insert("index.merge.scheduler.auto_throttle".to_string(), "false".to_string());
        }
        if rng.between(0, 3) == 3 {
            let max_threads = rng.between(1, 4);
            let max_merges = rng.between(max_threads, max_threads + 4);
            settings.insert(
                "index.merge.scheduler.max_thread_count".to_string(),
                max_threads.to_string(),
            );
            settings.insert(
                "index.merge.scheduler.max_merge_count".to_string(),
                max_merges.to_string(),
            );
        }
        if rng.bool() {
            settings.insert(
                "index.translog.flush_threshold_size_mb".to_string(),
                rng.between(1, 300).to_string(),
            );
        }
        if rng.bool() {
            let durability = if rng.bool() { "request" } else { "async" };
            settings.insert("index.translog.durability".to_string(), durability.to_string());
        }
        if rng.bool() {
            settings.insert(
                "index.translog.sync_interval_ms".to_string(),
                rng.between(100, 5000).to_string(),
            );
        }
        if rng.bool() {
            settings.insert(
                "index.queries.cache.enabled".to_string(),
                rng.bool().to_string(),
            );
        }
        // always zero so delayed allocation never stalls a test
        settings.insert(
            "index.unassigned.node_left.delayed_timeout_ms".to_string(),
            "0".to_string(),
        );

        TemplateSpec {
            name: RANDOM_INDEX_TEMPLATE.to_string(),
            patterns: vec!["*".to_string()],
            order: 0,
            settings,
        }
    }
}

impl std::fmt::Debug for Harness {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("suite", &self.config.suite)
            .field("scope", &self.config.scope)
            .field("seed", &self.config.seed)
            .finish_non_exhaustive()
    }
}
