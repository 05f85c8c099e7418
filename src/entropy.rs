//! Sources of randomness.
//!
//! Every draw in the crate goes through [`Entropy`], so a seeded or scripted
//! source makes whole runs reproducible.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Uniform, Bernoulli and weighted draws
pub trait Entropy {
    /// Uniform real in `[0, 1)`
    fn unit(&mut self) -> f64;

    /// Uniform real in `[min, max)`
    fn real(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.unit()
    }

    /// Uniform integer in `[min, max]`
    fn integer(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f64;
        (min + (self.unit() * span) as usize).min(max)
    }

    /// Bernoulli trial with success probability `p`
    fn chance(&mut self, p: f64) -> bool {
        p > 0.0 && self.unit() < p
    }

    /// Weighted choice over `weights` by cumulative-threshold scan.
    ///
    /// Returns `None` when there is nothing to choose or the total weight
    /// is not positive.
    fn weighted(&mut self, weights: &[f64]) -> Option<usize> {
        let total: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();
        if weights.is_empty() || total <= 0.0 {
            return None;
        }

        let threshold = self.unit() * total;
        let mut cumulative = 0.0;
        let mut last = None;
        for (i, &w) in weights.iter().enumerate() {
            if !w.is_finite() || w <= 0.0 {
                continue;
            }
            cumulative += w;
            last = Some(i);
            if threshold < cumulative {
                return Some(i);
            }
        }
        // Rounding can leave the threshold at the very top
        last
    }
}

/// ChaCha8-backed entropy, seeded for reproducibility
#[derive(Clone, Debug)]
pub struct SeededEntropy {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SeededEntropy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed drawn from the thread RNG
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng().gen())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Entropy for SeededEntropy {
    #[inline]
    fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed sequence of unit draws, cycling when exhausted.
///
/// Values are clamped into `[0, 1)`. An empty script always yields `0.0`.
#[derive(Clone, Debug, Default)]
pub struct ScriptedEntropy {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedEntropy {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    /// A source that always draws the same value
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of draws made so far
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl Entropy for ScriptedEntropy {
    fn unit(&mut self) -> f64 {
        if self.values.is_empty() {
            self.cursor += 1;
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = SeededEntropy::new(7);
        let mut b = SeededEntropy::new(7);
        for _ in 0..100 {
            assert_eq!(a.unit().to_bits(), b.unit().to_bits());
        }
    }

    #[test]
    fn test_real_in_range() {
        let mut rng = SeededEntropy::new(1);
        for _ in 0..1000 {
            let v = rng.real(-2.0, 3.0);
            assert!((-2.0..3.0).contains(&v));
        }
    }

    #[test]
    fn test_integer_bounds() {
        let mut low = ScriptedEntropy::constant(0.0);
        let mut high = ScriptedEntropy::constant(0.999_999);
        assert_eq!(low.integer(2, 5), 2);
        assert_eq!(high.integer(2, 5), 5);
        assert_eq!(low.integer(3, 3), 3);
    }

    #[test]
    fn test_chance_edges() {
        let mut rng = ScriptedEntropy::constant(0.0);
        assert!(!rng.chance(0.0));
        assert!(rng.chance(0.01));
        let mut rng = ScriptedEntropy::constant(0.5);
        assert!(!rng.chance(0.5));
        assert!(rng.chance(1.0));
    }

    #[test]
    fn test_weighted_cumulative_scan() {
        let weights = [1.0, 0.0, 3.0];
        // threshold = u * 4
        assert_eq!(ScriptedEntropy::constant(0.1).weighted(&weights), Some(0));
        assert_eq!(ScriptedEntropy::constant(0.25).weighted(&weights), Some(2));
        assert_eq!(ScriptedEntropy::constant(0.99).weighted(&weights), Some(2));
    }

    #[test]
    fn test_weighted_empty() {
        let mut rng = ScriptedEntropy::constant(0.3);
        assert_eq!(rng.weighted(&[]), None);
        assert_eq!(rng.weighted(&[0.0, 0.0]), None);
    }

    #[test]
    fn test_scripted_cycles() {
        let mut rng = ScriptedEntropy::new(vec![0.1, 0.2]);
        assert_eq!(rng.unit(), 0.1);
        assert_eq!(rng.unit(), 0.2);
        assert_eq!(rng.unit(), 0.1);
        assert_eq!(rng.draws(), 3);
    }
}
