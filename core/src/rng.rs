//! Deterministic random number generation.
//!
//! RULE: Nothing in the scorer may call a platform RNG.
//! All randomness flows through ScoringRng instances derived
//! from a single seed (42 for the demo segmentation view).
//!
//! Each consumer gets its own stream, seeded deterministically
//! from (seed XOR stream_index). This means:
//!   - Sampling more customers never shifts the noise stream's seed.
//!   - Each stream is fully reproducible in isolation.

use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single stream.
pub struct ScoringRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl ScoringRng {
    /// Create a stream RNG from the seed and a stable stream index.
    /// The index must never change once assigned.
    pub fn new(seed: u64, stream_index: u64) -> Self {
        let derived_seed = seed ^ (stream_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::Rng;
        assert!(n > 0, "n must be > 0");
        self.inner.gen_range(0..n)
    }

    /// Draw from N(mean, std_dev). A zero or negative std_dev yields `mean`.
    pub fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        match Normal::new(mean, std_dev) {
            Ok(dist) if std_dev > 0.0 => dist.sample(&mut self.inner),
            _ => mean,
        }
    }

    /// Pick `k` distinct indices from 0..n (partial Fisher-Yates).
    /// Returns all n indices, shuffled, when k >= n.
    pub fn sample_indices(&mut self, n: usize, k: usize) -> Vec<usize> {
        let mut pool: Vec<usize> = (0..n).collect();
        let take = k.min(n);
        for i in 0..take {
            let j = i + self.next_u64_below((n - i) as u64) as usize;
            pool.swap(i, j);
        }
        pool.truncate(take);
        pool
    }
}

/// All stream RNGs for one segmentation run, indexed by stable slot.
pub struct RngBank {
    seed: u64,
}

impl RngBank {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn for_stream(&self, slot: StreamSlot) -> ScoringRng {
        ScoringRng::new(self.seed, slot as u64).with_name(slot.name())
    }
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries. Only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    Sample = 0,
    Noise  = 1,
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sample => "sample",
            Self::Noise  => "noise",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = RngBank::new(42).for_stream(StreamSlot::Noise);
        let mut b = RngBank::new(42).for_stream(StreamSlot::Noise);
        for _ in 0..32 {
            assert_eq!(a.gaussian(0.0, 0.1).to_bits(), b.gaussian(0.0, 0.1).to_bits());
        }
    }

    #[test]
    fn streams_are_independent() {
        let bank = RngBank::new(42);
        let mut sample = bank.for_stream(StreamSlot::Sample);
        let mut noise = bank.for_stream(StreamSlot::Noise);
        assert_ne!(sample.next_f64(), noise.next_f64());
    }

    #[test]
    fn sample_indices_are_distinct_and_in_range() {
        let mut rng = RngBank::new(7).for_stream(StreamSlot::Sample);
        let mut picked = rng.sample_indices(100, 40);
        assert_eq!(picked.len(), 40);
        picked.sort_unstable();
        picked.dedup();
        assert_eq!(picked.len(), 40, "indices must be drawn without replacement");
        assert!(picked.iter().all(|&i| i < 100));
    }

    #[test]
    fn oversized_sample_returns_everything() {
        let mut rng = RngBank::new(7).for_stream(StreamSlot::Sample);
        let mut picked = rng.sample_indices(5, 50);
        picked.sort_unstable();
        assert_eq!(picked, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn zero_std_dev_returns_mean() {
        let mut rng = RngBank::new(1).for_stream(StreamSlot::Noise);
        assert_eq!(rng.gaussian(0.25, 0.0), 0.25);
    }
}
