//! Per-generation structural and parameter mutation.

use super::network::Network;
use crate::config::{Config, LayerMutation, NeuronMutation, Perturbation, SynapseConfig};
use crate::entropy::Entropy;
use crate::error::Result;
use crate::identity::{Id, IdRegistry};
use std::collections::BTreeMap;

/// Snapshot of every bias and weight
#[derive(Clone, Debug, PartialEq)]
pub struct Parameters {
    pub(crate) biases: BTreeMap<Id, f64>,
    pub(crate) weights: BTreeMap<(Id, Id), f64>,
}

impl Network {
    /// Apply one generation's worth of mutation.
    ///
    /// Dynamic networks first mutate layers, then hidden neurons. Every
    /// network then mutates biases and synapses. Each draw is an independent
    /// Bernoulli trial. An error stops the current step; steps already
    /// applied stay applied.
    pub fn evolve(
        &mut self,
        config: &Config,
        rng: &mut dyn Entropy,
        ids: &mut IdRegistry,
    ) -> Result<()> {
        let before = (self.layers.len(), self.neurons.len(), self.synapses.len());

        if self.dynamic {
            self.mutate_layers(&config.network.mutate, rng, ids)?;
            self.mutate_neurons(&config.neuron.mutate, rng, ids)?;
        }
        self.mutate_biases(&config.neuron.mutate.change, rng)?;
        self.mutate_synapses(&config.synapse, rng)?;

        log::debug!(
            "network {} evolved: layers {} -> {}, neurons {} -> {}, synapses {} -> {}",
            self.id,
            before.0,
            self.layers.len(),
            before.1,
            self.neurons.len(),
            before.2,
            self.synapses.len()
        );
        Ok(())
    }

    /// Remove then add whole layers. Removals are capped at the hidden layer count.
    pub fn mutate_layers(
        &mut self,
        rules: &LayerMutation,
        rng: &mut dyn Entropy,
        ids: &mut IdRegistry,
    ) -> Result<()> {
        self.require_dynamic("layer mutation")?;
        let removals = rules.remove.roll(rng).min(self.layers.len().saturating_sub(2));
        for _ in 0..removals {
            let depth = rng.integer(1, self.layers.len() - 2);
            self.remove_layer(depth, ids)?;
        }

        let room = self.limits.max_layers.saturating_sub(self.layers.len());
        let additions = rules.add.roll(rng).min(room);
        for _ in 0..additions {
            self.add_layer(ids)?;
        }
        Ok(())
    }

    /// Remove then add neurons in every hidden layer
    pub fn mutate_neurons(
        &mut self,
        rules: &NeuronMutation,
        rng: &mut dyn Entropy,
        ids: &mut IdRegistry,
    ) -> Result<()> {
        self.require_dynamic("neuron mutation")?;
        let hidden = 1..self.layers.len().saturating_sub(1);
        for depth in hidden {
            let height = self.layers[depth].height();
            let removals = rules.remove.roll(rng).min(height.saturating_sub(1));
            for _ in 0..removals {
                let position = rng.integer(0, self.layers[depth].height() - 1);
                self.remove_neuron(depth, position, ids)?;
            }

            let room = self
                .limits
                .max_height
                .saturating_sub(self.layers[depth].height());
            let additions = rules.add.roll(rng).min(room);
            for _ in 0..additions {
                self.add_neuron(depth, ids)?;
            }
        }
        Ok(())
    }

    /// Roll a bias change for every neuron
    pub fn mutate_biases(&mut self, change: &Perturbation, rng: &mut dyn Entropy) -> Result<()> {
        for id in self.ordered_neurons() {
            let bias = self.neurons.get(&id).map_or(0.0, |n| n.bias);
            if let Some(bias) = change.apply(bias, rng) {
                self.set_bias_of(id, bias)?;
            }
        }
        Ok(())
    }

    /// Roll a synapse mutation for every neuron pair across adjacent layers:
    /// add when absent, otherwise remove or else change.
    pub fn mutate_synapses(&mut self, rules: &SynapseConfig, rng: &mut dyn Entropy) -> Result<()> {
        for depth in 0..self.layers.len().saturating_sub(1) {
            let sources = self.layers[depth].neurons.clone();
            let destinations = self.layers[depth + 1].neurons.clone();
            for &source in &sources {
                for &destination in &destinations {
                    match self.synapses.get(&(source, destination)).map(|s| s.weight) {
                        Some(weight) => {
                            if rules.mutate.remove.roll(rng) {
                                self.unlink(source, destination)?;
                            } else if let Some(weight) = rules.mutate.change.apply(weight, rng) {
                                self.set_weight_of(source, destination, weight)?;
                            }
                        }
                        None => {
                            if rules.mutate.add.roll(rng) {
                                let weight = rules.weight.sample(rng);
                                self.link(source, destination, weight)?;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Nudge biases and weights with the `change` distributions only.
    ///
    /// Leaves the update map in place; callers restore or invalidate.
    pub(crate) fn perturb(&mut self, config: &Config, rng: &mut dyn Entropy) -> Result<()> {
        for id in self.ordered_neurons() {
            let Some(bias) = self.neurons.get(&id).map(|n| n.bias) else {
                continue;
            };
            if let Some(bias) = config.neuron.mutate.change.apply(bias, rng) {
                let bias = self.bias_range.clamp(bias)?;
                if let Some(neuron) = self.neurons.get_mut(&id) {
                    neuron.bias = bias;
                }
            }
        }
        let weight_range = self.weight_range;
        for synapse in self.synapses.values_mut() {
            if let Some(weight) = config.synapse.mutate.change.apply(synapse.weight, rng) {
                synapse.weight = weight_range.clamp(weight)?;
            }
        }
        self.compile_all();
        Ok(())
    }

    pub fn parameters(&self) -> Parameters {
        Parameters {
            biases: self.neurons.iter().map(|(&id, n)| (id, n.bias)).collect(),
            weights: self
                .synapses
                .iter()
                .map(|(&key, s)| (key, s.weight))
                .collect(),
        }
    }

    /// Write back a snapshot taken from this network. Values are not re-evaluated.
    pub(crate) fn restore(&mut self, parameters: &Parameters) {
        for (id, bias) in &parameters.biases {
            if let Some(neuron) = self.neurons.get_mut(id) {
                neuron.bias = *bias;
            }
        }
        for (key, weight) in &parameters.weights {
            if let Some(synapse) = self.synapses.get_mut(key) {
                synapse.weight = *weight;
            }
        }
        self.compile_all();
    }

    /// Neuron ids in layer order, shallowest first
    fn ordered_neurons(&self) -> Vec<Id> {
        self.layers
            .iter()
            .flat_map(|layer| layer.neurons.iter().copied())
            .collect()
    }
}
