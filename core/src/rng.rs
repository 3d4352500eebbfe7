//! Deterministic random numbers for scenario seeding and randomized tests.
//!
//! RULE: Nothing in the core draws randomness on its own. Drivers and
//! tests build a `ScenarioRng` from an explicit seed, so every run is
//! reproducible from that seed alone.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub struct ScenarioRng {
    inner: Pcg64Mcg,
}

impl ScenarioRng {
    /// `stream` separates independent sequences drawn from one seed.
    pub fn new(seed: u64, stream: u64) -> Self {
        let derived = seed ^ stream.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self { inner: Pcg64Mcg::seed_from_u64(derived) }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Roll a u64 in [0, n).
    pub fn below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll a u64 in [lo, hi].
    pub fn between(&mut self, lo: u64, hi: u64) -> u64 {
        assert!(lo <= hi, "empty range");
        lo + self.below(hi - lo + 1)
    }

    /// Pick one element of a non-empty slice.
    pub fn pick<'s, T>(&mut self, items: &'s [T]) -> &'s T {
        &items[self.below(items.len() as u64) as usize]
    }

    /// Bernoulli trial: true with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        let unit = (self.inner.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64);
        unit < p
    }
}
