//! Neurons, synapses and layers of the graph arena.

use crate::identity::Id;
use std::collections::BTreeSet;

/// A neuron in the arena. Its position is its index inside its layer.
#[derive(Clone, Debug)]
pub struct Neuron {
    pub(crate) id: Id,
    pub(crate) depth: usize,
    pub(crate) bias: f64,
    pub(crate) value: f64,
    /// Source neurons of incoming synapses
    pub(crate) incoming: BTreeSet<Id>,
    /// Destination neurons of outgoing synapses
    pub(crate) outgoing: BTreeSet<Id>,
    /// Compiled evaluation: `(source, weight)` for every incoming synapse
    pub(crate) compiled: Vec<(Id, f64)>,
    pub(crate) output_reachable: bool,
    /// Input positions this neuron's value depends on
    pub(crate) input_reachable: BTreeSet<usize>,
}

impl Neuron {
    pub(crate) fn new(id: Id, depth: usize, bias: f64) -> Self {
        Self {
            id,
            depth,
            bias,
            value: 0.0,
            incoming: BTreeSet::new(),
            outgoing: BTreeSet::new(),
            compiled: Vec::new(),
            output_reachable: false,
            input_reachable: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn incoming(&self) -> &BTreeSet<Id> {
        &self.incoming
    }

    pub fn outgoing(&self) -> &BTreeSet<Id> {
        &self.outgoing
    }

    /// Whether this neuron still influences the output layer
    pub fn is_output_reachable(&self) -> bool {
        self.output_reachable
    }

    pub fn input_reachable(&self) -> &BTreeSet<usize> {
        &self.input_reachable
    }
}

/// Weighted edge between neurons in adjacent layers
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Synapse {
    pub source: Id,
    pub destination: Id,
    pub weight: f64,
}

/// Ordered neuron ids at one depth
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layer {
    pub(crate) neurons: Vec<Id>,
}

impl Layer {
    pub fn height(&self) -> usize {
        self.neurons.len()
    }

    pub fn neurons(&self) -> &[Id] {
        &self.neurons
    }

    pub fn position_of(&self, id: Id) -> Option<usize> {
        self.neurons.iter().position(|&n| n == id)
    }
}
