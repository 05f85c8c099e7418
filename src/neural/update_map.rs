//! Update-dependency map: which neurons to re-evaluate when an input changes.
//!
//! A neuron is registered under input position `p` when it still reaches the
//! output layer and its value depends on `p`. Neurons cut off from the output
//! are never registered, so dead branches cost nothing per presentation.

use super::network::Network;
use crate::identity::Id;
use std::collections::{BTreeMap, BTreeSet};

/// Index from input position to the dependent, output-reachable neurons.
///
/// Entries are `(depth, id)` so iteration is already in evaluation order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateMap {
    groups: BTreeMap<usize, BTreeSet<(usize, Id)>>,
    /// Output-reachable neurons that depend on no input
    constants: Vec<(usize, Id)>,
}

impl UpdateMap {
    /// Neurons registered under one input position, in depth order
    pub fn registered(&self, position: usize) -> Vec<Id> {
        self.groups
            .get(&position)
            .map(|group| group.iter().map(|&(_, id)| id).collect())
            .unwrap_or_default()
    }

    /// Union of the groups for `positions`, in ascending depth
    pub fn group(&self, positions: &BTreeSet<usize>) -> BTreeSet<(usize, Id)> {
        positions
            .iter()
            .filter_map(|p| self.groups.get(p))
            .flat_map(|group| group.iter().copied())
            .collect()
    }

    pub fn constants(&self) -> impl Iterator<Item = Id> + '_ {
        self.constants.iter().map(|&(_, id)| id)
    }

    /// Number of input positions covered
    pub fn positions(&self) -> usize {
        self.groups.len()
    }
}

impl Network {
    /// Recompute reachability flags and rebuild the update map.
    ///
    /// Constant neurons are evaluated here since no input presentation
    /// will ever touch them.
    pub fn calculate_update_map(&mut self) {
        let depth_count = self.layers.len();
        if depth_count == 0 {
            self.update_map = Some(UpdateMap::default());
            return;
        }
        let output_depth = depth_count - 1;

        for depth in (0..depth_count).rev() {
            for id in self.layers[depth].neurons.clone() {
                let reachable = depth == output_depth
                    || self.neurons.get(&id).map_or(false, |n| {
                        n.outgoing.iter().any(|d| {
                            self.neurons
                                .get(d)
                                .map_or(false, |dest| dest.output_reachable)
                        })
                    });
                if let Some(neuron) = self.neurons.get_mut(&id) {
                    neuron.output_reachable = reachable;
                }
            }
        }

        for depth in 0..depth_count {
            for (position, id) in self.layers[depth].neurons.clone().into_iter().enumerate() {
                let inputs: BTreeSet<usize> = if depth == 0 {
                    BTreeSet::from([position])
                } else {
                    self.neurons
                        .get(&id)
                        .map(|n| {
                            n.incoming
                                .iter()
                                .filter_map(|s| self.neurons.get(s))
                                .flat_map(|s| s.input_reachable.iter().copied())
                                .collect()
                        })
                        .unwrap_or_default()
                };
                if let Some(neuron) = self.neurons.get_mut(&id) {
                    neuron.input_reachable = inputs;
                }
            }
        }

        let mut map = UpdateMap::default();
        for position in 0..self.layers[0].height() {
            map.groups.insert(position, BTreeSet::new());
        }
        for (depth, layer) in self.layers.iter().enumerate() {
            for id in &layer.neurons {
                let Some(neuron) = self.neurons.get(id) else {
                    continue;
                };
                if !neuron.output_reachable {
                    continue;
                }
                if depth > 0 && neuron.input_reachable.is_empty() {
                    map.constants.push((depth, *id));
                }
                for position in &neuron.input_reachable {
                    map.groups
                        .entry(*position)
                        .or_default()
                        .insert((depth, *id));
                }
            }
        }

        let constants: Vec<Id> = map.constants().collect();
        self.update_map = Some(map);
        for id in constants {
            self.evaluate_neuron(id);
        }
    }

    /// The current map, `None` when stale
    pub fn update_map(&self) -> Option<&UpdateMap> {
        self.update_map.as_ref()
    }

    /// Re-evaluate the neurons registered under `positions`, shallowest first
    pub(crate) fn propagate(&mut self, positions: &BTreeSet<usize>) {
        if self.update_map.is_none() {
            self.calculate_update_map();
        }
        let order = self
            .update_map
            .as_ref()
            .map(|map| map.group(positions))
            .unwrap_or_default();
        for (_, id) in order {
            self.evaluate_neuron(id);
        }
    }

    /// Like `propagate`, but constant neurons are re-evaluated as well.
    /// Needed whenever biases or weights changed since the map was built.
    pub(crate) fn retrace(&mut self, positions: &BTreeSet<usize>) {
        if self.update_map.is_none() {
            self.calculate_update_map();
        }
        let order = self
            .update_map
            .as_ref()
            .map(|map| {
                let mut order = map.group(positions);
                order.extend(map.constants.iter().copied());
                order
            })
            .unwrap_or_default();
        for (_, id) in order {
            self.evaluate_neuron(id);
        }
    }
}
