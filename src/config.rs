//! Configuration system for evonet.
//!
//! Supports YAML configuration files with sensible defaults. Mutation
//! probabilities accept either fractions (`0.05`) or percent strings (`"5%"`).

use crate::entropy::Entropy;
use crate::error::{EvoError, Result};
use crate::neural::Activation;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub population: PopulationConfig,
    pub network: NetworkConfig,
    pub neuron: NeuronConfig,
    pub synapse: SynapseConfig,
    #[serde(default)]
    pub adapt: AdaptConfig,
}

/// Population configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of networks per generation
    pub size: usize,
    /// Selection-pressure floor in (0, 1]; 1 means uniform selection
    pub equality: f64,
}

/// Network shape configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Whether layer count and hidden layer sizes may mutate
    pub dynamic: bool,
    /// Input layer height
    pub inputs: usize,
    /// Output layer height
    pub outputs: usize,
    /// Every layer size, input and output included (static networks only)
    #[serde(default)]
    pub layers: Vec<usize>,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub mutate: LayerMutation,
}

/// Growth caps for dynamic networks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    pub max_layers: usize,
    pub max_height: usize,
}

/// Layer-level structural mutation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerMutation {
    pub add: MutationCount,
    pub remove: MutationCount,
}

/// Neuron configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuronConfig {
    pub bias: ValueRange,
    #[serde(default)]
    pub activation: Activation,
    #[serde(default)]
    pub mutate: NeuronMutation,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NeuronMutation {
    pub add: MutationCount,
    pub remove: MutationCount,
    pub change: Perturbation,
}

/// Synapse configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynapseConfig {
    pub weight: ValueRange,
    #[serde(default)]
    pub mutate: SynapseMutation,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynapseMutation {
    pub add: Chance,
    pub remove: Chance,
    pub change: Perturbation,
}

/// Local adaptation (hill climbing on fitness regression)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptConfig {
    pub enabled: bool,
    pub iterations: usize,
}

/// Closed numeric range used for biases and weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamp into the range; NaN is rejected
    pub fn clamp(&self, value: f64) -> Result<f64> {
        if value.is_nan() {
            return Err(EvoError::ConstraintViolation(format!(
                "NaN is outside [{}, {}]",
                self.min, self.max
            )));
        }
        Ok(value.clamp(self.min, self.max))
    }

    /// Uniform draw inside the range
    pub fn sample(&self, rng: &mut dyn Entropy) -> f64 {
        rng.real(self.min, self.max).clamp(self.min, self.max)
    }

    fn validate(&self, what: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(EvoError::ConstraintViolation(format!(
                "{} range [{}, {}] is invalid",
                what, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Probability in `[0, 1]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawChance", into = "f64")]
pub struct Chance(f64);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawChance {
    Number(f64),
    Text(String),
}

impl TryFrom<RawChance> for Chance {
    type Error = String;

    fn try_from(raw: RawChance) -> std::result::Result<Self, Self::Error> {
        let value = match raw {
            RawChance::Number(v) => v,
            RawChance::Text(text) => {
                let text = text.trim();
                match text.strip_suffix('%') {
                    Some(percent) => {
                        percent.trim().parse::<f64>().map_err(|e| e.to_string())? / 100.0
                    }
                    None => text.parse::<f64>().map_err(|e| e.to_string())?,
                }
            }
        };
        Chance::new(value).map_err(|e| e.to_string())
    }
}

impl From<Chance> for f64 {
    fn from(chance: Chance) -> f64 {
        chance.0
    }
}

impl Chance {
    pub const NEVER: Chance = Chance(0.0);
    pub const ALWAYS: Chance = Chance(1.0);

    pub fn new(p: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(EvoError::ConstraintViolation(format!(
                "probability {} outside [0, 1]",
                p
            )));
        }
        Ok(Self(p))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn roll(self, rng: &mut dyn Entropy) -> bool {
        rng.chance(self.0)
    }
}

/// Number of independent mutation events: `attempts` Bernoulli trials
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MutationCount {
    pub chance: Chance,
    #[serde(default = "one")]
    pub attempts: usize,
}

fn one() -> usize {
    1
}

impl MutationCount {
    pub fn new(chance: Chance, attempts: usize) -> Self {
        Self { chance, attempts }
    }

    /// Roll every attempt and count the successes
    pub fn roll(&self, rng: &mut dyn Entropy) -> usize {
        (0..self.attempts).filter(|_| self.chance.roll(rng)).count()
    }
}

/// Chance of nudging a value by a uniform draw in `[-by, by)`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Perturbation {
    pub chance: Chance,
    pub by: f64,
}

impl Perturbation {
    pub fn new(chance: Chance, by: f64) -> Self {
        Self { chance, by }
    }

    /// The nudged value when the roll succeeds, unclamped
    pub fn apply(&self, value: f64, rng: &mut dyn Entropy) -> Option<f64> {
        if self.chance.roll(rng) {
            Some(value + rng.real(-self.by, self.by))
        } else {
            None
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: 50,
            equality: 0.1,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            dynamic: true,
            inputs: 2,
            outputs: 1,
            layers: vec![2, 3, 1],
            limits: Limits::default(),
            mutate: LayerMutation {
                add: MutationCount::new(Chance(0.05), 1),
                remove: MutationCount::new(Chance(0.02), 1),
            },
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_layers: 8,
            max_height: 16,
        }
    }
}

impl Default for NeuronConfig {
    fn default() -> Self {
        Self {
            bias: ValueRange::new(-4.0, 4.0),
            activation: Activation::Sigmoid,
            mutate: NeuronMutation {
                add: MutationCount::new(Chance(0.1), 2),
                remove: MutationCount::new(Chance(0.05), 1),
                change: Perturbation::new(Chance(0.2), 0.5),
            },
        }
    }
}

impl Default for SynapseConfig {
    fn default() -> Self {
        Self {
            weight: ValueRange::new(-4.0, 4.0),
            mutate: SynapseMutation {
                add: Chance(0.1),
                remove: Chance(0.02),
                change: Perturbation::new(Chance(0.3), 0.5),
            },
        }
    }
}

impl Default for AdaptConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            iterations: 8,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Layer sizes a fresh network starts with
    pub fn initial_layers(&self) -> Vec<usize> {
        if self.network.dynamic {
            vec![self.network.inputs, self.network.outputs]
        } else {
            self.network.layers.clone()
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(EvoError::ConstraintViolation(msg));

        if self.population.size == 0 {
            return fail("population.size must be > 0".to_string());
        }
        let equality = self.population.equality;
        if !(equality > 0.0 && equality <= 1.0) {
            return fail(format!("population.equality {} must be in (0, 1]", equality));
        }
        if self.network.inputs == 0 || self.network.outputs == 0 {
            return fail("network inputs/outputs must be > 0".to_string());
        }
        if !self.network.dynamic {
            let layers = &self.network.layers;
            if layers.len() < 2 {
                return fail("static networks need at least 2 layers".to_string());
            }
            if layers.iter().any(|&size| size == 0) {
                return fail("layer sizes must be > 0".to_string());
            }
            if layers[0] != self.network.inputs || layers[layers.len() - 1] != self.network.outputs {
                return fail("first/last layer sizes must match inputs/outputs".to_string());
            }
        }
        let limits = &self.network.limits;
        if limits.max_layers < 2 {
            return fail("network.limits.max_layers must be >= 2".to_string());
        }
        if limits.max_height < self.network.inputs.max(self.network.outputs) {
            return fail("network.limits.max_height is below the input/output height".to_string());
        }
        self.neuron.bias.validate("neuron.bias")?;
        self.synapse.weight.validate("synapse.weight")?;
        if self.adapt.enabled && self.adapt.iterations == 0 {
            return fail("adapt.iterations must be > 0 when adaptation is enabled".to_string());
        }
        Ok(())
    }
}
