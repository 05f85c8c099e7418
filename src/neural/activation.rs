//! Activation functions.
//!
//! Every activation takes the weighted input sum and the neuron bias.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Signature of a user-supplied activation: `(sum, bias) -> value`
pub type ActivationFn = dyn Fn(f64, f64) -> f64 + Send + Sync;

/// Named built-in activations plus one custom slot
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Sigmoid,
    Tanh,
    Relu,
    LeakyRelu,
    Linear,
    Step,
    /// Supplied at runtime, never read from a config file
    #[serde(skip)]
    Custom(CustomActivation),
}

/// Named wrapper around a custom activation closure
#[derive(Clone)]
pub struct CustomActivation {
    pub name: String,
    pub function: Arc<ActivationFn>,
}

impl Activation {
    pub fn custom<F>(name: &str, function: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        Activation::Custom(CustomActivation {
            name: name.to_string(),
            function: Arc::new(function),
        })
    }

    #[inline]
    pub fn apply(&self, sum: f64, bias: f64) -> f64 {
        let x = sum + bias;
        match self {
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
            Activation::Relu => x.max(0.0),
            Activation::LeakyRelu => {
                if x > 0.0 {
                    x
                } else {
                    0.01 * x
                }
            }
            Activation::Linear => x,
            Activation::Step => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Custom(custom) => (custom.function)(sum, bias),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Relu => "relu",
            Activation::LeakyRelu => "leaky_relu",
            Activation::Linear => "linear",
            Activation::Step => "step",
            Activation::Custom(custom) => &custom.name,
        }
    }
}

impl fmt::Debug for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Activation({})", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_midpoint() {
        assert_eq!(Activation::Sigmoid.apply(0.0, 0.0), 0.5);
    }

    #[test]
    fn test_linear_adds_bias() {
        assert_eq!(Activation::Linear.apply(1.0, 0.25), 1.25);
    }

    #[test]
    fn test_relu_family() {
        assert_eq!(Activation::Relu.apply(-1.0, 0.0), 0.0);
        assert!(Activation::LeakyRelu.apply(-1.0, 0.0) < 0.0);
        assert_eq!(Activation::Step.apply(0.5, 0.0), 1.0);
    }

    #[test]
    fn test_custom() {
        let double = Activation::custom("double", |sum, bias| 2.0 * sum + bias);
        assert_eq!(double.apply(1.0, 1.0), 3.0);
        assert_eq!(double.name(), "double");
    }

    #[test]
    fn test_yaml_names() {
        let a: Activation = serde_yaml::from_str("leaky_relu").unwrap();
        assert_eq!(a.name(), "leaky_relu");
        assert!(serde_yaml::from_str::<Activation>("nope").is_err());
    }
}
