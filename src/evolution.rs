//! Selection mechanics and per-generation statistics.

use crate::entropy::Entropy;
use crate::neural::Network;
use std::fmt;

/// Selection weight of every individual.
///
/// `weight = normalize(score) * (1 - equality) + equality`, where
/// normalize maps the score range onto `[0, 1]`. When all scores are equal
/// every normalized score is 1. Non-finite scores normalize to 0.
pub fn selection_weights(scores: &[f64], equality: f64) -> Vec<f64> {
    let finite = scores.iter().copied().filter(|s| s.is_finite());
    let min = finite.clone().fold(f64::INFINITY, f64::min);
    let max = finite.fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    scores
        .iter()
        .map(|&score| {
            let normalized = if !score.is_finite() {
                0.0
            } else if span > 0.0 {
                (score - min) / span
            } else {
                1.0
            };
            normalized * (1.0 - equality) + equality
        })
        .collect()
}

/// Draw `count` parent indices with replacement, proportional to `weights`.
///
/// Falls back to a uniform draw when no weight is positive.
pub fn draw_parents(weights: &[f64], count: usize, rng: &mut dyn Entropy) -> Vec<usize> {
    if weights.is_empty() {
        return Vec::new();
    }
    (0..count)
        .map(|_| {
            rng.weighted(weights)
                .unwrap_or_else(|| rng.integer(0, weights.len() - 1))
        })
        .collect()
}

/// Summary of one generation, taken just before it is replaced
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationStats {
    pub generation: u64,
    pub size: usize,
    pub alive: usize,
    pub min_score: f64,
    pub max_score: f64,
    pub mean_score: f64,
    pub mean_complexity: f64,
    pub mean_synapses: f64,
}

impl GenerationStats {
    pub fn collect(generation: u64, networks: &[Network]) -> Self {
        let size = networks.len();
        if size == 0 {
            return Self {
                generation,
                ..Self::default()
            };
        }
        let scores: Vec<f64> = networks.iter().map(Network::score).collect();
        let n = size as f64;

        Self {
            generation,
            size,
            alive: networks.iter().filter(|n| !n.is_dead()).count(),
            min_score: scores.iter().copied().fold(f64::INFINITY, f64::min),
            max_score: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean_score: scores.iter().sum::<f64>() / n,
            mean_complexity: networks.iter().map(|n| n.complexity() as f64).sum::<f64>() / n,
            mean_synapses: networks.iter().map(|n| n.synapse_count() as f64).sum::<f64>() / n,
        }
    }
}

impl fmt::Display for GenerationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gen {} | alive {}/{} | score min {:.3} max {:.3} mean {:.3} | hidden {:.2} | synapses {:.2}",
            self.generation,
            self.alive,
            self.size,
            self.min_score,
            self.max_score,
            self.mean_score,
            self.mean_complexity,
            self.mean_synapses
        )
    }
}
