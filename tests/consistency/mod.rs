//! # Cluster State Consistency Tests
//!
//! Cross-node state agreement after quiet rebuilds, divergence detection
//! and the version-mismatch transient.

mod state_cases;
