//! Reward folding and intra-generation hill climbing.
//!
//! When a network's reward delta turns negative after a non-negative one, a
//! short local search perturbs its biases and weights and keeps the best
//! trial, if any beats the regression.

use super::mutations::Parameters;
use super::network::Network;
use crate::config::Config;
use crate::entropy::Entropy;
use crate::error::Result;
use std::collections::BTreeSet;

impl Network {
    /// Score an output with `reward`, adapting first on a regression.
    ///
    /// Returns the output the update hook should see: the adapted one when a
    /// trial was committed, otherwise `output` unchanged.
    pub fn reinforce(
        &mut self,
        index: usize,
        output: Vec<f64>,
        config: &Config,
        reward: &mut dyn FnMut(usize, &[f64]) -> f64,
        rng: &mut dyn Entropy,
    ) -> Result<Vec<f64>> {
        let delta = reward(index, &output);
        let regressed = matches!(self.last_delta, Some(previous) if previous >= 0.0) && delta < 0.0;

        let (delta, output) = if config.adapt.enabled && regressed {
            self.adapt(index, delta, output, config, reward, rng)?
        } else {
            (delta, output)
        };

        self.last_delta = Some(delta);
        self.reward(delta);
        Ok(output)
    }

    /// Hill-climb from the current parameters.
    ///
    /// Each trial re-evaluates the neurons affected by the input positions
    /// the last presentation changed, plus the constant neurons. A stale map
    /// is rebuilt before the snapshot. Without an improvement the network
    /// ends bit-for-bit as it started.
    fn adapt(
        &mut self,
        index: usize,
        delta: f64,
        output: Vec<f64>,
        config: &Config,
        reward: &mut dyn FnMut(usize, &[f64]) -> f64,
        rng: &mut dyn Entropy,
    ) -> Result<(f64, Vec<f64>)> {
        if self.update_map.is_none() {
            // Edits since the last presentation: bring every value up to date first
            let all: BTreeSet<usize> = (0..self.layers.first().map_or(0, |l| l.height())).collect();
            self.calculate_update_map();
            self.propagate(&all);
            self.history.changed = all;
        }
        let original = self.parameters();
        let group = self.history.changed.clone();
        let mut best: Option<(f64, Parameters)> = None;

        for trial in 0..config.adapt.iterations {
            if let Err(e) = self.perturb(config, rng) {
                self.restore(&original);
                self.retrace(&group);
                return Err(e);
            }
            self.retrace(&group);
            let candidate = reward(index, &self.output());
            log::trace!(
                "network {} adaptation trial {}: reward {:.4} (baseline {:.4})",
                self.id,
                trial,
                candidate,
                delta
            );
            // Later trials win ties
            if candidate.is_finite() && best.as_ref().map_or(true, |(r, _)| candidate >= *r) {
                best = Some((candidate, self.parameters()));
            }
            self.restore(&original);
        }

        match best {
            Some((improved, parameters)) if improved > delta => {
                self.restore(&parameters);
                self.retrace(&group);
                // Neurons outside the group still hold values from the old parameters
                self.invalidate();
                log::debug!(
                    "network {} adapted: reward {:.4} -> {:.4}",
                    self.id,
                    delta,
                    improved
                );
                Ok((improved, self.output()))
            }
            _ => {
                self.retrace(&group);
                Ok((delta, output))
            }
        }
    }
}
