//! Linear layers and the MLP scorer.
//!
//! ```text
//!          ┌──────────┐        ┌──────────┐
//!   x ────▶│ W₁x + b₁ │─ tanh ─▶│ W₂h + b₂ │────▶ scores
//!          └──────────┘        └──────────┘
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::NnError;
use crate::tensor::RTensor;

/// A simple linear layer: y = W @ x + b
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredLinear")]
pub struct Linear {
    /// Weight matrix (output_dim, input_dim)
    weights: RTensor,
    /// Bias vector (output_dim,)
    bias: RTensor,
}

#[derive(Deserialize)]
struct StoredLinear {
    weights: RTensor,
    bias: RTensor,
}

impl TryFrom<StoredLinear> for Linear {
    type Error = NnError;

    fn try_from(stored: StoredLinear) -> Result<Self, NnError> {
        Linear::from_parts(stored.weights, stored.bias)
    }
}

impl Linear {
    /// Create a new linear layer with random weights.
    pub fn new<R: Rng + ?Sized>(input_dim: usize, output_dim: usize, rng: &mut R) -> Self {
        // Xavier initialization: scale = sqrt(2 / (fan_in + fan_out))
        let scale = (2.0 / (input_dim + output_dim) as f32).sqrt();
        Self {
            weights: RTensor::randn(vec![output_dim, input_dim], scale, rng),
            bias: RTensor::zeros(vec![output_dim]),
        }
    }

    /// Build a layer from explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if `weights` is not a matrix or `bias` does not match
    /// its row count.
    pub fn from_parts(weights: RTensor, bias: RTensor) -> Result<Self, NnError> {
        if weights.shape.len() != 2 {
            return Err(NnError::InvalidConfig {
                reason: format!("weights must be 2D, got shape {:?}", weights.shape),
            });
        }
        if bias.size() != weights.rows() {
            return Err(NnError::DimensionMismatch {
                context: "linear bias",
                expected: weights.rows(),
                got: bias.size(),
            });
        }
        Ok(Self {
            weights,
            bias: RTensor::vector(bias.data),
        })
    }

    /// Width of accepted inputs.
    pub fn input_dim(&self) -> usize {
        self.weights.cols()
    }

    /// Width of produced outputs.
    pub fn output_dim(&self) -> usize {
        self.weights.rows()
    }

    /// Number of scalar parameters.
    pub fn parameter_count(&self) -> usize {
        self.weights.size() + self.bias.size()
    }

    /// Forward pass: y = W @ x + b
    pub fn forward(&self, x: &RTensor) -> Result<RTensor, NnError> {
        if x.size() != self.input_dim() {
            return Err(NnError::DimensionMismatch {
                context: "linear input",
                expected: self.input_dim(),
                got: x.size(),
            });
        }
        Ok(self.weights.matvec(x).add(&self.bias))
    }
}

/// Maps a fixed-size state vector to unnormalized scores over a vocabulary.
pub trait Scorer {
    /// Width of the state vectors the scorer accepts.
    fn input_dim(&self) -> usize;

    /// Number of scores produced (the vocabulary size).
    fn output_dim(&self) -> usize;

    /// Unnormalized scores for one state.
    fn score(&self, state: &RTensor) -> Result<RTensor, NnError>;
}

/// A multi-layer perceptron with one `tanh` hidden layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredMlp")]
pub struct Mlp {
    hidden: Linear,
    output: Linear,
}

#[derive(Deserialize)]
struct StoredMlp {
    hidden: Linear,
    output: Linear,
}

impl TryFrom<StoredMlp> for Mlp {
    type Error = NnError;

    fn try_from(stored: StoredMlp) -> Result<Self, NnError> {
        Mlp::from_layers(stored.hidden, stored.output)
    }
}

impl Mlp {
    /// Create a new MLP with given dimensions.
    pub fn new<R: Rng + ?Sized>(
        input_dim: usize,
        hidden_dim: usize,
        output_dim: usize,
        rng: &mut R,
    ) -> Self {
        Self {
            hidden: Linear::new(input_dim, hidden_dim, rng),
            output: Linear::new(hidden_dim, output_dim, rng),
        }
    }

    /// Assemble an MLP from two layers whose widths chain.
    pub fn from_layers(hidden: Linear, output: Linear) -> Result<Self, NnError> {
        if hidden.output_dim() != output.input_dim() {
            return Err(NnError::DimensionMismatch {
                context: "mlp hidden layer",
                expected: output.input_dim(),
                got: hidden.output_dim(),
            });
        }
        Ok(Self { hidden, output })
    }

    /// Number of scalar parameters.
    pub fn parameter_count(&self) -> usize {
        self.hidden.parameter_count() + self.output.parameter_count()
    }
}

impl Scorer for Mlp {
    fn input_dim(&self) -> usize {
        self.hidden.input_dim()
    }

    fn output_dim(&self) -> usize {
        self.output.output_dim()
    }

    fn score(&self, state: &RTensor) -> Result<RTensor, NnError> {
        let h = self.hidden.forward(state)?.tanh();
        self.output.forward(&h)
    }
}
