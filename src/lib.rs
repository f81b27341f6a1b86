mod cluster;
mod config;
mod consistency;
mod constants;
mod errors;
mod harness;
mod health;
mod random;
mod registry;
mod workload;

pub mod sim;

pub use cluster::*;
pub use config::*;
pub use consistency::*;
pub use errors::*;
pub use harness::*;
pub use health::*;
pub use random::*;
pub use registry::*;
pub use workload::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
mod random_test;
//-----------------------------------------------------------
// Autometrics
/// autometrics: https://docs.autometrics.dev/rust/adding-alerts-and-slos
use autometrics::objectives::Objective;
use autometrics::objectives::ObjectiveLatency;
use autometrics::objectives::ObjectivePercentile;
const API_SLO: Objective = Objective::new("harness_api")
    .success_rate(ObjectivePercentile::P99_9)
    .latency(ObjectiveLatency::Ms100, ObjectivePercentile::P99);
