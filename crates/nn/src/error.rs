//! Error types for neural network components.

use thiserror::Error;

/// Errors that can occur while building or evaluating layers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NnError {
    /// A tensor does not have the width a layer expects.
    #[error("Dimension mismatch in {context}: expected {expected}, got {got}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },

    /// Lookup index outside an embedding table.
    #[error("Index {index} out of range for table of size {size}")]
    IndexOutOfRange { index: usize, size: usize },

    /// Encoder pointer that does not name a node of the current sequence tape.
    #[error("Encoder pointer {index} out of range (tape has {len} nodes)")]
    InvalidPointer { index: usize, len: usize },

    /// The root pointer has no parent.
    #[error("The root encoder state has no head")]
    RootHasNoHead,

    /// Layer hyper-parameters that cannot be instantiated.
    #[error("Invalid layer configuration: {reason}")]
    InvalidConfig { reason: String },
}
