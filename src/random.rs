//! Seeded randomness for the harness.
//!
//! Every random decision in the harness (cluster sizing, template settings,
//! workload strategy, decoy injection) flows through a [`RandomSource`]
//! derived from the harness seed, so a failing run can be replayed exactly
//! by re-running with the same seed.

use rand::rngs::StdRng;
use rand::Rng;
use rand::RngCore;
use rand::SeedableRng;

/// Probability used by [`RandomSource::rarely`]. `frequently` is its
/// complement.
const RARELY: f64 = 0.1;

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Derive an independent child stream.
    ///
    /// Used when a component needs its own stream without advancing the
    /// parent in a call-order-dependent way.
    pub fn fork(&mut self) -> Self {
        Self::from_seed(self.rng.next_u64())
    }

    pub fn bool(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }

    /// True roughly nine times out of ten.
    pub fn frequently(&mut self) -> bool {
        !self.rarely()
    }

    /// True roughly one time out of ten.
    pub fn rarely(&mut self) -> bool {
        self.rng.gen_bool(RARELY)
    }

    /// Uniform integer in `lo..=hi`.
    pub fn between(
        &mut self,
        lo: usize,
        hi: usize,
    ) -> usize {
        debug_assert!(lo <= hi, "between({lo}, {hi})");
        self.rng.gen_range(lo..=hi)
    }

    /// Uniform fraction in `[0, 1)`.
    pub fn fraction(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    pub fn pick<'a, T>(
        &mut self,
        items: &'a [T],
    ) -> &'a T {
        debug_assert!(!items.is_empty());
        &items[self.rng.gen_range(0..items.len())]
    }

    pub fn shuffle<T>(
        &mut self,
        items: &mut [T],
    ) {
        use rand::seq::SliceRandom;
        items.shuffle(&mut self.rng);
    }

    /// Short random lowercase-alphanumeric fragment, e.g. for decoy ids.
    pub fn id_fragment(
        &mut self,
        len: usize,
    ) -> String {
        (0..len)
            .map(|_| ID_ALPHABET[self.rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect()
    }
}

impl std::fmt::Debug for RandomSource {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RandomSource").finish_non_exhaustive()
    }
}
