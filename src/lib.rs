//! # evonet
//!
//! Genetic evolution of small, topologically-mutable, layered neural networks.
//!
//! ## Features
//!
//! - **Mutable topology**: layers, neurons and synapses are added and removed
//!   between generations; biases and weights drift within configured ranges
//! - **Incremental evaluation**: an update-dependency map re-evaluates only
//!   neurons that depend on changed inputs and still reach the output
//! - **Local adaptation**: optional hill climbing when a network's reward
//!   turns negative within a generation
//! - **Configurable**: YAML configuration files, percent-valued chances
//! - **Reproducible**: every random draw goes through an injected, seedable
//!   entropy source
//!
//! ## Quick Start
//!
//! ```rust
//! use evonet::{Config, Hooks, Population};
//!
//! let mut config = Config::default();
//! config.population.size = 10;
//!
//! // Reward networks whose single output is high
//! let hooks = Hooks::reward_only(|_, output| output[0]);
//! let mut population = Population::with_seed(config, hooks, 42).unwrap();
//!
//! population.start(false).unwrap();
//! for _ in 0..5 {
//!     population.input(|_| vec![1.0, 0.0]).unwrap();
//!     population.evolve(false).unwrap();
//! }
//! assert_eq!(population.generation(), 5);
//! ```
//!
//! ## Working with a single network
//!
//! ```rust
//! use evonet::{Activation, Config, IdRegistry, Network};
//!
//! let mut config = Config::default();
//! config.network.dynamic = false;
//! config.network.layers = vec![2, 1];
//! config.neuron.activation = Activation::Linear;
//!
//! let mut ids = IdRegistry::new();
//! let mut network = Network::new(&config, &mut ids).unwrap();
//! network.connect((0, 0), 0, 1.0).unwrap();
//! assert_eq!(network.input(&[1.0, 0.0]).unwrap(), vec![1.0]);
//! ```

pub mod config;
pub mod entropy;
pub mod error;
pub mod evolution;
pub mod hooks;
pub mod identity;
pub mod neural;
pub mod population;

// Re-export main types
pub use config::Config;
pub use entropy::{Entropy, ScriptedEntropy, SeededEntropy};
pub use error::{EvoError, Result};
pub use hooks::Hooks;
pub use identity::{Id, IdRegistry};
pub use neural::{Activation, Network};
pub use population::{Population, State};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
