//! Neural network module: the mutable layered graph engine.
//!
//! Implements evolvable layered networks with:
//! - Arena storage of neurons and a synapse table keyed by endpoints
//! - Structural mutations (layers, neurons, synapses)
//! - Incremental forward passes driven by an update-dependency map
//! - Hill-climbing adaptation on reward regression

mod activation;
mod adaptation;
mod mutations;
mod network;
mod neuron;
mod update_map;

pub use activation::{Activation, ActivationFn, CustomActivation};
pub use mutations::Parameters;
pub use network::Network;
pub use neuron::{Layer, Neuron, Synapse};
pub use update_map::UpdateMap;
