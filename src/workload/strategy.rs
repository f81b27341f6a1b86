use crate::config::WorkloadConfig;
use crate::RandomSource;

/// How a batch is executed. One decision per batch, not per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One request per operation, each awaited before the next.
    Sync,
    /// One request per operation, fire-and-forget with a completion ticket.
    Async,
    /// Operations partitioned into bulk requests of randomized size.
    Bulk,
}

impl std::fmt::Display for Strategy {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let name = match self {
            Strategy::Sync => "one-by-one/sync",
            Strategy::Async => "one-by-one/async",
            Strategy::Bulk => "bulk",
        };
        write!(f, "{name}")
    }
}

/// Small batches frequently go one at a time, mid-size batches rarely do,
/// large batches always go in bulk. Within one-by-one, async is the
/// frequent choice.
pub(crate) fn choose_strategy(
    n: usize,
    config: &WorkloadConfig,
    rng: &mut RandomSource,
) -> Strategy {
    let one_by_one = if n < config.frequent_bulk_threshold {
        rng.frequently()
    } else if n < config.always_bulk_threshold {
        rng.rarely()
    } else {
        false
    };

    if one_by_one {
        if rng.frequently() {
            Strategy::Async
        } else {
            Strategy::Sync
        }
    } else {
        Strategy::Bulk
    }
}

/// Chunk size for bulk requests: a fresh random fraction of the batch per
/// run, capped, never zero. Produces bulk requests of widely varying size
/// across runs.
pub(crate) fn bulk_chunk_size(
    n: usize,
    config: &WorkloadConfig,
    rng: &mut RandomSource,
) -> usize {
    config
        .max_bulk_request_size
        .min(((n as f64 * rng.fraction()) as usize).max(1))
}
