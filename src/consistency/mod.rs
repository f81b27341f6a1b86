//! Cross-node cluster-state consistency checking.

mod checker;

pub use checker::*;
