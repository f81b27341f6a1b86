mod harness;
mod workload;

pub use harness::*;
pub use workload::*;
