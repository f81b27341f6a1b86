use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::ALWAYS_BULK_THRESHOLD;
use crate::constants::FREQUENT_BULK_THRESHOLD;
use crate::constants::MAX_BULK_REQUEST_SIZE;
use crate::constants::MAX_IN_FLIGHT_ASYNC_OPS;
use crate::Result;

/// Tuning knobs for the indexing orchestrator.
///
/// Defaults match the thresholds the workload was designed around; tests
/// lower them to force specific strategies.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct WorkloadConfig {
    /// Ceiling on outstanding asynchronous operations.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Below this batch size, one-by-one submission is the frequent choice.
    #[serde(default = "default_frequent_bulk_threshold")]
    pub frequent_bulk_threshold: usize,

    /// At or above this batch size, bulk is always used.
    #[serde(default = "default_always_bulk_threshold")]
    pub always_bulk_threshold: usize,

    /// Hard cap on the number of operations per bulk request.
    #[serde(default = "default_max_bulk_request_size")]
    pub max_bulk_request_size: usize,

    /// Whether workloads may inject decoy documents by default. Individual
    /// calls can still opt out.
    #[serde(default = "default_true")]
    pub decoys: bool,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            frequent_bulk_threshold: default_frequent_bulk_threshold(),
            always_bulk_threshold: default_always_bulk_threshold(),
            max_bulk_request_size: default_max_bulk_request_size(),
            decoys: true,
        }
    }
}

impl WorkloadConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_in_flight == 0 {
            return Err(ConfigError::Message("max_in_flight must be non-zero".to_string()).into());
        }
        if self.max_bulk_request_size == 0 {
            return Err(ConfigError::Message(
                "max_bulk_request_size must be non-zero".to_string(),
            )
            .into());
        }
        if self.frequent_bulk_threshold > self.always_bulk_threshold {
            return Err(ConfigError::Message(format!(
                "frequent_bulk_threshold ({}) exceeds always_bulk_threshold ({})",
                self.frequent_bulk_threshold, self.always_bulk_threshold
            ))
            .into());
        }
        Ok(())
    }
}

fn default_max_in_flight() -> usize {
    MAX_IN_FLIGHT_ASYNC_OPS
}
fn default_frequent_bulk_threshold() -> usize {
    FREQUENT_BULK_THRESHOLD
}
fn default_always_bulk_threshold() -> usize {
    ALWAYS_BULK_THRESHOLD
}
fn default_max_bulk_request_size() -> usize {
    MAX_BULK_REQUEST_SIZE
}
fn default_true() -> bool {
    true
}
