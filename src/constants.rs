// -
// Workload thresholds

/// Threshold at which indexing switches from frequently one-by-one to
/// frequently bulk.
pub(crate) const FREQUENT_BULK_THRESHOLD: usize = 300;

/// Threshold at which bulk indexing will always be used.
pub(crate) const ALWAYS_BULK_THRESHOLD: usize = 3000;

/// Maximum number of asynchronous operations the orchestrator keeps in
/// flight at one time.
pub(crate) const MAX_IN_FLIGHT_ASYNC_OPS: usize = 150;

/// Maximum number of operations in a single bulk request.
pub(crate) const MAX_BULK_REQUEST_SIZE: usize = 1000;

// -
// Provisioning

/// Minimum number of primary shards a randomized index template may pick.
pub(crate) const DEFAULT_MIN_NUM_SHARDS: u32 = 1;

/// Maximum number of primary shards a randomized index template may pick.
pub(crate) const DEFAULT_MAX_NUM_SHARDS: u32 = 10;

/// Name of the wildcard template installed by `Harness::setup`.
pub(crate) const RANDOM_INDEX_TEMPLATE: &str = "random_index_template";

/// Prefix of every decoy document id.
pub(crate) const DECOY_ID_PREFIX: &str = "decoy_doc_";

// -
// Health

/// Default ceiling for health gates when the caller does not set one.
pub(crate) const DEFAULT_HEALTH_TIMEOUT_MS: u64 = 30_000;

/// Interval between two health polls.
pub(crate) const HEALTH_POLL_INTERVAL_MS: u64 = 100;
