//! Injectable source of randomness.
//!
//! Key-phrase relevance and resource selection are the only randomized parts of
//! a turn. Everything else in the pipeline is a pure function of its input, so
//! the randomness lives behind this trait and tests can pin it with a seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniformly distributed values.
pub trait RandomSource: Send + Sync {
    /// Returns a value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Returns a value in `[low, high)`.
    fn range(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    /// Returns an index in `[0, len)`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        ((self.next_f64() * len as f64) as usize).min(len.saturating_sub(1))
    }

    /// Picks an index with probability proportional to its weight.
    ///
    /// Returns `None` when the slice is empty or every weight is zero.
    fn pick_weighted(&mut self, weights: &[u32]) -> Option<usize> {
        let total: u32 = weights.iter().sum();
        if total == 0 {
            return None;
        }
        let mut roll = self.next_f64() * f64::from(total);
        for (i, weight) in weights.iter().enumerate() {
            let w = f64::from(*weight);
            if roll < w {
                return Some(i);
            }
            roll -= w;
        }
        weights.iter().rposition(|w| *w > 0)
    }
}

/// Deterministic source for reproducible runs and tests.
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Entropy-seeded source used in production.
pub struct ThreadRandom {
    rng: StdRng,
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomSource for ThreadRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}
