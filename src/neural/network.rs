//! Layered network graph: construction, topology edits and forward passes.
//!
//! Neurons live in an arena keyed by their registry [`Id`]. Layers hold the
//! ordered ids at each depth and synapses live in one table keyed by
//! `(source, destination)`, so neurons only refer to each other by id.

use super::activation::Activation;
use super::neuron::{Layer, Neuron, Synapse};
use super::update_map::UpdateMap;
use crate::config::{Config, Limits, ValueRange};
use crate::error::{EvoError, Result};
use crate::identity::{Id, IdRegistry, NETWORK_SCOPE, NEURON_SCOPE};
use std::collections::{BTreeMap, BTreeSet};

/// Last presented input vector and the positions it changed
#[derive(Clone, Debug, Default)]
pub(crate) struct InputHistory {
    pub(crate) last: Option<Vec<f64>>,
    pub(crate) changed: BTreeSet<usize>,
}

/// A directed, layered, mutable neural network
#[derive(Debug)]
pub struct Network {
    pub(crate) id: Id,
    pub(crate) dynamic: bool,
    pub(crate) layers: Vec<Layer>,
    pub(crate) neurons: BTreeMap<Id, Neuron>,
    pub(crate) synapses: BTreeMap<(Id, Id), Synapse>,
    pub(crate) activation: Activation,
    pub(crate) bias_range: ValueRange,
    pub(crate) weight_range: ValueRange,
    pub(crate) limits: Limits,
    pub(crate) score: f64,
    pub(crate) dead: bool,
    /// `None` whenever topology or parameters changed since the last build
    pub(crate) update_map: Option<UpdateMap>,
    pub(crate) history: InputHistory,
    /// Reward delta of the previous presentation
    pub(crate) last_delta: Option<f64>,
}

impl Network {
    /// Build a fresh network without synapses.
    ///
    /// Dynamic networks start with only input and output layers; static
    /// networks get every configured layer. All biases start at zero.
    pub fn new(config: &Config, ids: &mut IdRegistry) -> Result<Self> {
        config.validate()?;
        let mut network = Self::blank(ids.allocate(NETWORK_SCOPE), config);
        network.populate(&config.initial_layers(), ids);
        Ok(network)
    }

    /// Deep-clone the structure, biases and weights of `reference` with
    /// fresh identifiers. Score and caches start empty.
    pub fn clone_of(reference: &Network, ids: &mut IdRegistry) -> Self {
        let mut network = Self {
            id: ids.allocate(NETWORK_SCOPE),
            dynamic: reference.dynamic,
            layers: Vec::with_capacity(reference.layers.len()),
            neurons: BTreeMap::new(),
            synapses: BTreeMap::new(),
            activation: reference.activation.clone(),
            bias_range: reference.bias_range,
            weight_range: reference.weight_range,
            limits: reference.limits.clone(),
            score: 0.0,
            dead: false,
            update_map: None,
            history: InputHistory::default(),
            last_delta: None,
        };
        network.copy_structure(reference, ids);
        network
    }

    /// Rebuild in place, from `reference` when given or from `config`.
    ///
    /// Current neuron ids are released first; the network id is kept.
    pub fn reset(
        &mut self,
        reference: Option<&Network>,
        config: &Config,
        ids: &mut IdRegistry,
    ) -> Result<()> {
        config.validate()?;
        self.release_neurons(ids)?;

        self.score = 0.0;
        self.dead = false;
        self.update_map = None;
        self.history = InputHistory::default();
        self.last_delta = None;

        match reference {
            Some(reference) => {
                self.dynamic = reference.dynamic;
                self.activation = reference.activation.clone();
                self.bias_range = reference.bias_range;
                self.weight_range = reference.weight_range;
                self.limits = reference.limits.clone();
                self.copy_structure(reference, ids);
            }
            None => {
                self.dynamic = config.network.dynamic;
                self.activation = config.neuron.activation.clone();
                self.bias_range = config.neuron.bias;
                self.weight_range = config.synapse.weight;
                self.limits = config.network.limits.clone();
                self.populate(&config.initial_layers(), ids);
            }
        }
        Ok(())
    }

    /// Destroy the network, releasing every identifier it holds
    pub fn release(mut self, ids: &mut IdRegistry) -> Result<()> {
        self.release_neurons(ids)?;
        ids.release(NETWORK_SCOPE, self.id)
    }

    fn blank(id: Id, config: &Config) -> Self {
        Self {
            id,
            dynamic: config.network.dynamic,
            layers: Vec::new(),
            neurons: BTreeMap::new(),
            synapses: BTreeMap::new(),
            activation: config.neuron.activation.clone(),
            bias_range: config.neuron.bias,
            weight_range: config.synapse.weight,
            limits: config.network.limits.clone(),
            score: 0.0,
            dead: false,
            update_map: None,
            history: InputHistory::default(),
            last_delta: None,
        }
    }

    fn populate(&mut self, sizes: &[usize], ids: &mut IdRegistry) {
        for (depth, &size) in sizes.iter().enumerate() {
            let mut layer = Layer::default();
            for _ in 0..size {
                let id = ids.allocate(NEURON_SCOPE);
                self.neurons.insert(id, Neuron::new(id, depth, 0.0));
                layer.neurons.push(id);
            }
            self.layers.push(layer);
        }
    }

    fn copy_structure(&mut self, reference: &Network, ids: &mut IdRegistry) {
        let mut renamed: BTreeMap<Id, Id> = BTreeMap::new();

        for (depth, source_layer) in reference.layers.iter().enumerate() {
            let mut layer = Layer::default();
            for old in &source_layer.neurons {
                let id = ids.allocate(NEURON_SCOPE);
                let bias = reference.neurons.get(old).map_or(0.0, |n| n.bias);
                self.neurons.insert(id, Neuron::new(id, depth, bias));
                layer.neurons.push(id);
                renamed.insert(*old, id);
            }
            self.layers.push(layer);
        }

        for synapse in reference.synapses.values() {
            if let (Some(&source), Some(&destination)) = (
                renamed.get(&synapse.source),
                renamed.get(&synapse.destination),
            ) {
                self.attach(source, destination, synapse.weight);
            }
        }

        let all: Vec<Id> = self.neurons.keys().copied().collect();
        for id in all {
            self.compile(id);
        }
    }

    fn release_neurons(&mut self, ids: &mut IdRegistry) -> Result<()> {
        self.synapses.clear();
        self.layers.clear();
        let neurons = std::mem::take(&mut self.neurons);
        for id in neurons.into_keys() {
            ids.release(NEURON_SCOPE, id)?;
        }
        Ok(())
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Number of layers
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Largest layer size
    pub fn height(&self) -> usize {
        self.layers.iter().map(Layer::height).max().unwrap_or(0)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_sizes(&self) -> Vec<usize> {
        self.layers.iter().map(Layer::height).collect()
    }

    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    pub fn synapse_count(&self) -> usize {
        self.synapses.len()
    }

    /// Hidden neuron count (complexity metric)
    pub fn complexity(&self) -> usize {
        let n = self.layers.len();
        if n <= 2 {
            return 0;
        }
        self.layers[1..n - 1].iter().map(Layer::height).sum()
    }

    pub fn activation(&self) -> &Activation {
        &self.activation
    }

    pub fn neuron_id(&self, depth: usize, position: usize) -> Result<Id> {
        let layer = self.layers.get(depth).ok_or_else(|| {
            EvoError::InvalidTopology(format!(
                "depth {} outside 0..{}",
                depth,
                self.layers.len()
            ))
        })?;
        layer
            .neurons
            .get(position)
            .copied()
            .ok_or_else(|| EvoError::NotFound(format!("neuron ({}, {})", depth, position)))
    }

    pub fn neuron(&self, depth: usize, position: usize) -> Result<&Neuron> {
        let id = self.neuron_id(depth, position)?;
        self.neurons
            .get(&id)
            .ok_or_else(|| EvoError::NotFound(format!("neuron {}", id)))
    }

    pub fn neuron_by_id(&self, id: Id) -> Option<&Neuron> {
        self.neurons.get(&id)
    }

    /// `(depth, position)` of a neuron
    pub fn locate(&self, id: Id) -> Option<(usize, usize)> {
        let depth = self.neurons.get(&id)?.depth;
        let position = self.layers.get(depth)?.position_of(id)?;
        Some((depth, position))
    }

    pub fn synapse(&self, from: (usize, usize), to_position: usize) -> Result<&Synapse> {
        let source = self.neuron_id(from.0, from.1)?;
        let destination = self.neuron_id(from.0 + 1, to_position)?;
        self.synapses.get(&(source, destination)).ok_or_else(|| {
            EvoError::NotFound(format!(
                "synapse ({}, {}) -> ({}, {})",
                from.0,
                from.1,
                from.0 + 1,
                to_position
            ))
        })
    }

    pub fn synapses(&self) -> impl Iterator<Item = &Synapse> {
        self.synapses.values()
    }

    /// Check structural invariants and parameter ranges
    pub fn is_valid(&self) -> bool {
        if self.layers.len() < 2 {
            return false;
        }
        for (depth, layer) in self.layers.iter().enumerate() {
            for id in &layer.neurons {
                match self.neurons.get(id) {
                    Some(n) if n.depth == depth => {}
                    _ => return false,
                }
            }
        }
        let listed: usize = self.layers.iter().map(Layer::height).sum();
        if listed != self.neurons.len() {
            return false;
        }
        let output_depth = self.layers.len() - 1;
        for neuron in self.neurons.values() {
            if !neuron.bias.is_finite()
                || neuron.bias < self.bias_range.min
                || neuron.bias > self.bias_range.max
            {
                return false;
            }
            if (neuron.depth == 0 && !neuron.incoming.is_empty())
                || (neuron.depth == output_depth && !neuron.outgoing.is_empty())
            {
                return false;
            }
        }
        self.synapses.iter().all(|(&(s, d), synapse)| {
            let (Some(source), Some(destination)) = (self.neurons.get(&s), self.neurons.get(&d))
            else {
                return false;
            };
            synapse.source == s
                && synapse.destination == d
                && destination.depth == source.depth + 1
                && source.outgoing.contains(&d)
                && destination.incoming.contains(&s)
                && synapse.weight >= self.weight_range.min
                && synapse.weight <= self.weight_range.max
        })
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// Fold a reward delta into the score; non-finite deltas are ignored
    pub fn reward(&mut self, delta: f64) {
        if delta.is_finite() {
            self.score += delta;
        }
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn kill(&mut self) {
        self.dead = true;
    }

    /// Connect `(depth, position)` to neuron `to_position` one layer forward
    pub fn connect(&mut self, from: (usize, usize), to_position: usize, weight: f64) -> Result<()> {
        let (depth, position) = from;
        let source = self.neuron_id(depth, position)?;
        if depth + 1 >= self.layers.len() {
            return Err(EvoError::InvalidTopology(format!(
                "output neuron ({}, {}) cannot have outgoing synapses",
                depth, position
            )));
        }
        let destination = self.layers[depth + 1]
            .neurons
            .get(to_position)
            .copied()
            .ok_or_else(|| {
                EvoError::InvalidTopology(format!(
                    "no neuron at ({}, {})",
                    depth + 1,
                    to_position
                ))
            })?;
        let weight = self.weight_range.clamp(weight)?;
        self.link(source, destination, weight)
    }

    /// Remove the synapse from `(depth, position)` to `to_position`
    pub fn disconnect(&mut self, from: (usize, usize), to_position: usize) -> Result<()> {
        let source = self.neuron_id(from.0, from.1)?;
        let destination = self.neuron_id(from.0 + 1, to_position)?;
        self.unlink(source, destination)
    }

    /// Assign a bias, clamped to the configured range. Returns the stored value.
    pub fn set_bias(&mut self, depth: usize, position: usize, bias: f64) -> Result<f64> {
        let id = self.neuron_id(depth, position)?;
        self.set_bias_of(id, bias)
    }

    /// Assign a synapse weight, clamped to the configured range
    pub fn set_weight(&mut self, from: (usize, usize), to_position: usize, weight: f64) -> Result<f64> {
        let source = self.neuron_id(from.0, from.1)?;
        let destination = self.neuron_id(from.0 + 1, to_position)?;
        self.set_weight_of(source, destination, weight)
    }

    pub(crate) fn set_bias_of(&mut self, id: Id, bias: f64) -> Result<f64> {
        let bias = self.bias_range.clamp(bias)?;
        let neuron = self
            .neurons
            .get_mut(&id)
            .ok_or_else(|| EvoError::NotFound(format!("neuron {}", id)))?;
        neuron.bias = bias;
        self.compile(id);
        self.invalidate();
        Ok(bias)
    }

    pub(crate) fn set_weight_of(&mut self, source: Id, destination: Id, weight: f64) -> Result<f64> {
        let weight = self.weight_range.clamp(weight)?;
        let synapse = self
            .synapses
            .get_mut(&(source, destination))
            .ok_or_else(|| EvoError::NotFound(format!("synapse {} -> {}", source, destination)))?;
        synapse.weight = weight;
        self.compile(destination);
        self.invalidate();
        Ok(weight)
    }

    pub(crate) fn link(&mut self, source: Id, destination: Id, weight: f64) -> Result<()> {
        if self.synapses.contains_key(&(source, destination)) {
            return Err(EvoError::InvalidTopology(format!(
                "synapse {} -> {} already exists",
                source, destination
            )));
        }
        let (Some(s), Some(d)) = (self.neurons.get(&source), self.neurons.get(&destination)) else {
            return Err(EvoError::NotFound(format!(
                "endpoint of synapse {} -> {}",
                source, destination
            )));
        };
        if d.depth != s.depth + 1 {
            return Err(EvoError::InvalidTopology(format!(
                "synapse {} -> {} does not span adjacent layers",
                source, destination
            )));
        }
        self.attach(source, destination, weight);
        self.compile(destination);
        self.invalidate();
        Ok(())
    }

    pub(crate) fn unlink(&mut self, source: Id, destination: Id) -> Result<()> {
        self.synapses
            .remove(&(source, destination))
            .ok_or_else(|| EvoError::NotFound(format!("synapse {} -> {}", source, destination)))?;
        if let Some(s) = self.neurons.get_mut(&source) {
            s.outgoing.remove(&destination);
        }
        if let Some(d) = self.neurons.get_mut(&destination) {
            d.incoming.remove(&source);
        }
        self.compile(destination);
        self.compile(source);
        self.invalidate();
        Ok(())
    }

    fn attach(&mut self, source: Id, destination: Id, weight: f64) {
        self.synapses.insert(
            (source, destination),
            Synapse {
                source,
                destination,
                weight,
            },
        );
        if let Some(s) = self.neurons.get_mut(&source) {
            s.outgoing.insert(destination);
        }
        if let Some(d) = self.neurons.get_mut(&destination) {
            d.incoming.insert(source);
        }
    }

    /// Rebuild a neuron's evaluation plan from its incoming synapses
    pub(crate) fn compile(&mut self, id: Id) {
        let Some(neuron) = self.neurons.get(&id) else {
            return;
        };
        let compiled: Vec<(Id, f64)> = neuron
            .incoming
            .iter()
            .filter_map(|&source| self.synapses.get(&(source, id)).map(|s| (source, s.weight)))
            .collect();
        if let Some(neuron) = self.neurons.get_mut(&id) {
            neuron.compiled = compiled;
        }
    }

    pub(crate) fn compile_all(&mut self) {
        let all: Vec<Id> = self.neurons.keys().copied().collect();
        for id in all {
            self.compile(id);
        }
    }

    /// Mark the update map stale; the next presentation re-derives everything
    pub(crate) fn invalidate(&mut self) {
        self.update_map = None;
    }

    pub(crate) fn require_dynamic(&self, operation: &str) -> Result<()> {
        if self.dynamic {
            Ok(())
        } else {
            Err(EvoError::PreconditionFailed(format!(
                "{} requires a dynamic network",
                operation
            )))
        }
    }

    fn require_hidden(&self, depth: usize) -> Result<()> {
        if depth == 0 || depth + 1 >= self.layers.len() {
            return Err(EvoError::InvalidTopology(format!(
                "depth {} is not a hidden layer (layers: {})",
                depth,
                self.layers.len()
            )));
        }
        Ok(())
    }

    /// Append a layer after the current output layer.
    ///
    /// The old output layer becomes the last hidden layer; the new output
    /// layer has the same height and is wired one-to-one with weight 1.
    /// Returns the depth of the new layer.
    pub fn add_layer(&mut self, ids: &mut IdRegistry) -> Result<usize> {
        self.require_dynamic("add_layer")?;
        if self.layers.len() >= self.limits.max_layers {
            return Err(EvoError::ConstraintViolation(format!(
                "network already has the maximum of {} layers",
                self.limits.max_layers
            )));
        }
        let weight = self.weight_range.clamp(1.0)?;
        let prior: Vec<Id> = self
            .layers
            .last()
            .map(|l| l.neurons.clone())
            .unwrap_or_default();
        let depth = self.layers.len();

        let mut layer = Layer::default();
        for _ in &prior {
            let id = ids.allocate(NEURON_SCOPE);
            self.neurons.insert(id, Neuron::new(id, depth, 0.0));
            layer.neurons.push(id);
        }
        let fresh = layer.neurons.clone();
        self.layers.push(layer);

        for (&source, &destination) in prior.iter().zip(fresh.iter()) {
            self.link(source, destination, weight)?;
        }
        for id in fresh {
            self.compile(id);
        }
        self.invalidate();
        Ok(depth)
    }

    /// Remove a hidden layer and every synapse touching it.
    ///
    /// Deeper layers shift down by one. The gap is not rewired.
    pub fn remove_layer(&mut self, depth: usize, ids: &mut IdRegistry) -> Result<()> {
        self.require_dynamic("remove_layer")?;
        self.require_hidden(depth)?;

        let removed = self.layers.remove(depth);
        for id in removed.neurons {
            self.destroy_neuron(id, ids)?;
        }
        for (d, layer) in self.layers.iter().enumerate().skip(depth) {
            for id in &layer.neurons {
                if let Some(neuron) = self.neurons.get_mut(id) {
                    neuron.depth = d;
                }
            }
        }
        self.invalidate();
        Ok(())
    }

    /// Append an unconnected, zero-bias neuron to a hidden layer.
    /// Returns its position.
    pub fn add_neuron(&mut self, depth: usize, ids: &mut IdRegistry) -> Result<usize> {
        self.require_dynamic("add_neuron")?;
        self.require_hidden(depth)?;
        if self.layers[depth].height() >= self.limits.max_height {
            return Err(EvoError::ConstraintViolation(format!(
                "layer {} already has the maximum of {} neurons",
                depth, self.limits.max_height
            )));
        }
        let id = ids.allocate(NEURON_SCOPE);
        self.neurons.insert(id, Neuron::new(id, depth, 0.0));
        self.layers[depth].neurons.push(id);
        self.invalidate();
        Ok(self.layers[depth].height() - 1)
    }

    /// Remove a hidden neuron; later positions in its layer shift down
    pub fn remove_neuron(&mut self, depth: usize, position: usize, ids: &mut IdRegistry) -> Result<()> {
        self.require_dynamic("remove_neuron")?;
        self.require_hidden(depth)?;
        if self.layers[depth].height() <= 1 {
            return Err(EvoError::ConstraintViolation(format!(
                "layer {} cannot lose its last neuron",
                depth
            )));
        }
        let id = self.neuron_id(depth, position)?;
        self.layers[depth].neurons.remove(position);
        self.destroy_neuron(id, ids)?;
        self.invalidate();
        Ok(())
    }

    /// Detach every synapse of a neuron, drop it from the arena and release its id
    fn destroy_neuron(&mut self, id: Id, ids: &mut IdRegistry) -> Result<()> {
        let (incoming, outgoing) = match self.neurons.get(&id) {
            Some(n) => (n.incoming.clone(), n.outgoing.clone()),
            None => return Err(EvoError::NotFound(format!("neuron {}", id))),
        };
        for source in incoming {
            self.unlink(source, id)?;
        }
        for destination in outgoing {
            self.unlink(id, destination)?;
        }
        self.neurons.remove(&id);
        ids.release(NEURON_SCOPE, id)
    }

    /// Present an input vector and return the output layer values.
    ///
    /// Only neurons registered under changed input positions are
    /// re-evaluated. A stale update map is rebuilt first and then every
    /// position counts as changed.
    pub fn input(&mut self, values: &[f64]) -> Result<Vec<f64>> {
        let height = self.layers[0].height();
        if values.len() != height {
            return Err(EvoError::ConstraintViolation(format!(
                "expected {} inputs, got {}",
                height,
                values.len()
            )));
        }
        if values.iter().any(|v| v.is_nan()) {
            return Err(EvoError::ConstraintViolation("NaN input".to_string()));
        }

        let changed: BTreeSet<usize> = match (&self.update_map, &self.history.last) {
            (Some(_), Some(last)) => (0..height)
                .filter(|&p| last[p].to_bits() != values[p].to_bits())
                .collect(),
            _ => {
                self.calculate_update_map();
                (0..height).collect()
            }
        };

        for (position, id) in self.layers[0].neurons.iter().enumerate() {
            if let Some(neuron) = self.neurons.get_mut(id) {
                neuron.value = values[position];
            }
        }
        self.propagate(&changed);

        self.history.last = Some(values.to_vec());
        self.history.changed = changed;
        Ok(self.output())
    }

    /// Current output layer values
    pub fn output(&self) -> Vec<f64> {
        self.layers
            .last()
            .map(|layer| {
                layer
                    .neurons
                    .iter()
                    .map(|id| self.neurons.get(id).map_or(0.0, |n| n.value))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Full forward pass from scratch, leaving the network untouched
    pub fn evaluate(&self, values: &[f64]) -> Result<Vec<f64>> {
        let height = self.layers[0].height();
        if values.len() != height {
            return Err(EvoError::ConstraintViolation(format!(
                "expected {} inputs, got {}",
                height,
                values.len()
            )));
        }

        let mut computed: BTreeMap<Id, f64> = BTreeMap::new();
        for (depth, layer) in self.layers.iter().enumerate() {
            for (position, id) in layer.neurons.iter().enumerate() {
                let value = if depth == 0 {
                    values[position]
                } else {
                    let Some(neuron) = self.neurons.get(id) else {
                        continue;
                    };
                    let sum: f64 = neuron
                        .compiled
                        .iter()
                        .map(|(source, weight)| computed.get(source).copied().unwrap_or(0.0) * weight)
                        .sum();
                    self.activation.apply(sum, neuron.bias)
                };
                computed.insert(*id, value);
            }
        }

        Ok(self
            .layers
            .last()
            .map(|l| {
                l.neurons
                    .iter()
                    .map(|id| computed.get(id).copied().unwrap_or(0.0))
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Evaluate one neuron from its compiled plan. Input neurons keep their value.
    pub(crate) fn evaluate_neuron(&mut self, id: Id) {
        let Some(neuron) = self.neurons.get(&id) else {
            return;
        };
        if neuron.depth == 0 {
            return;
        }
        let sum: f64 = neuron
            .compiled
            .iter()
            .map(|(source, weight)| self.neurons.get(source).map_or(0.0, |s| s.value) * weight)
            .sum();
        let value = self.activation.apply(sum, neuron.bias);
        if let Some(neuron) = self.neurons.get_mut(&id) {
            neuron.value = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_config(layers: Vec<usize>) -> Config {
        let mut config = Config::default();
        config.network.dynamic = false;
        config.network.inputs = layers[0];
        config.network.outputs = layers[layers.len() - 1];
        config.network.layers = layers;
        config
    }

    fn dynamic_config() -> Config {
        let mut config = Config::default();
        config.network.dynamic = true;
        config
    }

    #[test]
    fn test_new_static_layers() {
        let mut ids = IdRegistry::new();
        let net = Network::new(&static_config(vec![2, 3, 1]), &mut ids).unwrap();
        assert_eq!(net.layer_sizes(), vec![2, 3, 1]);
        assert_eq!(net.height(), 3);
        assert_eq!(net.synapse_count(), 0);
        assert_eq!(ids.live(NEURON_SCOPE), 6);
        assert!(net.is_valid());
    }

    #[test]
    fn test_new_dynamic_has_io_only() {
        let mut ids = IdRegistry::new();
        let net = Network::new(&dynamic_config(), &mut ids).unwrap();
        assert_eq!(net.layer_sizes(), vec![2, 1]);
        assert_eq!(net.complexity(), 0);
    }

    #[test]
    fn test_unconnected_sigmoid_outputs_half() {
        let mut ids = IdRegistry::new();
        let mut net = Network::new(&static_config(vec![2, 2, 1]), &mut ids).unwrap();
        assert_eq!(net.input(&[0.3, -0.7]).unwrap(), vec![0.5]);
    }

    #[test]
    fn test_connect_linear_passes_value() {
        let mut config = static_config(vec![1, 1]);
        config.neuron.activation = Activation::Linear;
        let mut ids = IdRegistry::new();
        let mut net = Network::new(&config, &mut ids).unwrap();

        net.connect((0, 0), 0, 1.0).unwrap();
        net.input(&[1.0]).unwrap();
        assert_eq!(net.neuron(1, 0).unwrap().value(), 1.0);
    }

    #[test]
    fn test_connect_rejections() {
        let mut ids = IdRegistry::new();
        let mut net = Network::new(&static_config(vec![2, 2, 1]), &mut ids).unwrap();

        net.connect((0, 0), 1, 0.5).unwrap();
        assert!(matches!(
            net.connect((0, 0), 1, 0.5),
            Err(EvoError::InvalidTopology(_))
        ));
        assert!(matches!(
            net.connect((0, 0), 5, 0.5),
            Err(EvoError::InvalidTopology(_))
        ));
        assert!(matches!(
            net.connect((2, 0), 0, 0.5),
            Err(EvoError::InvalidTopology(_))
        ));
        assert!(matches!(
            net.connect((0, 9), 0, 0.5),
            Err(EvoError::NotFound(_))
        ));
    }

    #[test]
    fn test_disconnect() {
        let mut ids = IdRegistry::new();
        let mut net = Network::new(&static_config(vec![2, 2, 1]), &mut ids).unwrap();
        assert!(matches!(net.disconnect((0, 0), 0), Err(EvoError::NotFound(_))));

        net.connect((0, 0), 0, 0.5).unwrap();
        net.disconnect((0, 0), 0).unwrap();
        assert_eq!(net.synapse_count(), 0);
        assert!(net.neuron(1, 0).unwrap().incoming().is_empty());
        assert!(net.neuron(0, 0).unwrap().outgoing().is_empty());
        assert!(net.is_valid());
    }

    #[test]
    fn test_clamping() {
        let mut ids = IdRegistry::new();
        let mut net = Network::new(&static_config(vec![1, 1]), &mut ids).unwrap();
        net.connect((0, 0), 0, 100.0).unwrap();
        assert_eq!(net.synapse((0, 0), 0).unwrap().weight, 4.0);
        assert_eq!(net.set_bias(1, 0, -100.0).unwrap(), -4.0);
        assert_eq!(net.set_weight((0, 0), 0, -0.5).unwrap(), -0.5);
        assert!(matches!(
            net.set_bias(1, 0, f64::NAN),
            Err(EvoError::ConstraintViolation(_))
        ));
        assert_eq!(net.neuron(1, 0).unwrap().bias(), -4.0);
    }

    #[test]
    fn test_static_rejects_structure_edits() {
        let mut ids = IdRegistry::new();
        let mut net = Network::new(&static_config(vec![2, 2, 1]), &mut ids).unwrap();
        assert!(matches!(
            net.add_layer(&mut ids),
            Err(EvoError::PreconditionFailed(_))
        ));
        assert!(matches!(
            net.add_neuron(1, &mut ids),
            Err(EvoError::PreconditionFailed(_))
        ));
    }

    #[test]
    fn test_add_layer_wires_identity() {
        let mut config = dynamic_config();
        config.neuron.activation = Activation::Linear;
        let mut ids = IdRegistry::new();
        let mut net = Network::new(&config, &mut ids).unwrap();
        net.connect((0, 0), 0, 0.5).unwrap();

        let depth = net.add_layer(&mut ids).unwrap();
        assert_eq!(depth, 2);
        assert_eq!(net.layer_sizes(), vec![2, 1, 1]);
        assert_eq!(net.synapse((1, 0), 0).unwrap().weight, 1.0);
        assert_eq!(net.input(&[2.0, 0.0]).unwrap(), vec![1.0]);
        assert!(net.is_valid());
    }

    #[test]
    fn test_hidden_neuron_edits() {
        let mut ids = IdRegistry::new();
        let mut net = Network::new(&dynamic_config(), &mut ids).unwrap();
        assert!(matches!(
            net.add_neuron(0, &mut ids),
            Err(EvoError::InvalidTopology(_))
        ));

        net.add_layer(&mut ids).unwrap();
        let position = net.add_neuron(1, &mut ids).unwrap();
        assert_eq!(position, 1);
        net.connect((0, 1), 1, 0.3).unwrap();
        net.connect((1, 1), 0, 0.3).unwrap();

        net.remove_neuron(1, 1, &mut ids).unwrap();
        assert_eq!(net.layer_sizes(), vec![2, 1, 1]);
        assert_eq!(net.synapse_count(), 1);
        assert!(matches!(
            net.remove_neuron(1, 0, &mut ids),
            Err(EvoError::ConstraintViolation(_))
        ));
        assert!(net.is_valid());
        assert_eq!(ids.live(NEURON_SCOPE), net.neuron_count());
    }

    #[test]
    fn test_remove_layer_rejects_boundaries() {
        let mut ids = IdRegistry::new();
        let mut net = Network::new(&dynamic_config(), &mut ids).unwrap();
        assert!(matches!(
            net.remove_layer(0, &mut ids),
            Err(EvoError::InvalidTopology(_))
        ));
        assert!(matches!(
            net.remove_layer(1, &mut ids),
            Err(EvoError::InvalidTopology(_))
        ));
    }

    #[test]
    fn test_clone_of_copies_parameters_with_fresh_ids() {
        let mut ids = IdRegistry::new();
        let mut net = Network::new(&static_config(vec![2, 2, 1]), &mut ids).unwrap();
        net.connect((0, 1), 0, 0.75).unwrap();
        net.set_bias(1, 0, 0.25).unwrap();
        net.reward(3.0);

        let copy = Network::clone_of(&net, &mut ids);
        assert_ne!(copy.id(), net.id());
        assert_eq!(copy.layer_sizes(), net.layer_sizes());
        assert_eq!(copy.synapse((0, 1), 0).unwrap().weight, 0.75);
        assert_eq!(copy.neuron(1, 0).unwrap().bias(), 0.25);
        assert_eq!(copy.score(), 0.0);
        assert!(copy.neurons.keys().all(|id| !net.neurons.contains_key(id)));
        assert_eq!(copy.evaluate(&[0.2, 0.4]).unwrap(), net.evaluate(&[0.2, 0.4]).unwrap());
    }

    #[test]
    fn test_release_frees_all_ids() {
        let mut ids = IdRegistry::new();
        let net = Network::new(&static_config(vec![2, 2, 1]), &mut ids).unwrap();
        net.release(&mut ids).unwrap();
        assert_eq!(ids.live(NEURON_SCOPE), 0);
        assert_eq!(ids.live(NETWORK_SCOPE), 0);
    }

    #[test]
    fn test_reset_from_reference() {
        let mut ids = IdRegistry::new();
        let config = static_config(vec![2, 2, 1]);
        let mut reference = Network::new(&config, &mut ids).unwrap();
        reference.connect((1, 1), 0, -0.5).unwrap();

        let mut net = Network::new(&config, &mut ids).unwrap();
        let id = net.id();
        net.reset(Some(&reference), &config, &mut ids).unwrap();
        assert_eq!(net.id(), id);
        assert_eq!(net.synapse((1, 1), 0).unwrap().weight, -0.5);
        assert_eq!(ids.live(NEURON_SCOPE), 10);

        net.reset(None, &config, &mut ids).unwrap();
        assert_eq!(net.synapse_count(), 0);
    }

    #[test]
    fn test_input_length_checked() {
        let mut ids = IdRegistry::new();
        let mut net = Network::new(&static_config(vec![2, 1]), &mut ids).unwrap();
        assert!(matches!(
            net.input(&[1.0]),
            Err(EvoError::ConstraintViolation(_))
        ));
    }
}
