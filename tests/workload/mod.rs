//! # Indexing Workload Tests
//!
//! Drives the indexing orchestrator end-to-end against the simulated
//! backend: strategy scenarios, async backpressure, decoy churn and
//! admission-rejection recovery.

mod backpressure;
mod decoys;
mod indexing_strategies;
mod rejections;
