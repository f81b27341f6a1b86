//! Randomized write-workload orchestration.
//!
//! Takes a caller-built [`WriteBatch`], picks one of three execution
//! strategies at random, bounds concurrent asynchronous operations,
//! retries transient admission rejections, and injects/retracts decoy
//! documents to exercise deletion paths.

mod batch;
mod orchestrator;
mod strategy;

pub use batch::*;
pub use orchestrator::*;
pub use strategy::*;
