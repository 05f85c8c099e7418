//! Error types shared by the graph engine and the evolution controller.

use thiserror::Error;

/// Errors raised by network and population operations.
///
/// None of these are retried internally. A structural operation that fails
/// part-way leaves whatever it already applied in place.
#[derive(Error, Debug)]
pub enum EvoError {
    /// Operation not allowed in the current lifecycle state
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Malformed depth or position, duplicate neuron or synapse
    #[error("invalid topology: {0}")]
    InvalidTopology(String),
    /// Value outside its configured range or type
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    /// Missing neuron, synapse or identifier
    #[error("not found: {0}")]
    NotFound(String),
    /// Dynamic-only operation on a static network, or vice versa
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, EvoError>;
