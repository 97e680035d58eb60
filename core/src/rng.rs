//! Seedable random number generation for the mock report generator.
//!
//! RULE: Report synthesis never calls a platform RNG directly.
//! All randomness flows through a ReportRng, which is either seeded
//! explicitly (tests, reproducible runs) or from OS entropy once at
//! session start.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub struct ReportRng {
    seed:  u64,
    inner: Pcg64Mcg,
}

impl ReportRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Seed from OS entropy. The drawn seed is kept so a run can be
    /// reported and replayed.
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng().gen())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.gen_range(0..n)
    }

    /// Roll a u64 in [lo, hi).
    pub fn range(&mut self, lo: u64, hi: u64) -> u64 {
        assert!(hi > lo, "empty range [{lo}, {hi})");
        lo + self.next_u64_below(hi - lo)
    }

    /// Roll a u64 in [lo, hi].
    pub fn range_inclusive(&mut self, lo: u64, hi: u64) -> u64 {
        assert!(hi >= lo, "empty range [{lo}, {hi}]");
        self.inner.gen_range(lo..=hi)
    }
}
