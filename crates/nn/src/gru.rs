//! Gated recurrent units.
//!
//! One layer update:
//!
//! ```text
//! z  = σ(Wz·x + bz + Uz·h + cz)
//! r  = σ(Wr·x + br + Ur·h + cr)
//! n  = tanh(Wn·x + bn + r ⊙ (Un·h + cn))
//! h' = (1 - z) ⊙ n + z ⊙ h
//! ```
//!
//! The three gates share one input projection and one recurrent projection,
//! split into equal thirds.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::NnError;
use crate::linear::Linear;
use crate::tensor::RTensor;

/// A single GRU layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredGruCell")]
pub struct GruCell {
    /// (3·hidden, input)
    input: Linear,
    /// (3·hidden, hidden)
    recurrent: Linear,
    hidden_dim: usize,
}

#[derive(Deserialize)]
struct StoredGruCell {
    input: Linear,
    recurrent: Linear,
    hidden_dim: usize,
}

impl TryFrom<StoredGruCell> for GruCell {
    type Error = NnError;

    fn try_from(stored: StoredGruCell) -> Result<Self, NnError> {
        let cell = GruCell::from_parts(stored.input, stored.recurrent)?;
        if cell.hidden_dim != stored.hidden_dim {
            return Err(NnError::DimensionMismatch {
                context: "gru hidden width",
                expected: cell.hidden_dim,
                got: stored.hidden_dim,
            });
        }
        Ok(cell)
    }
}

impl GruCell {
    /// Create a randomly initialised layer.
    pub fn new<R: Rng + ?Sized>(input_dim: usize, hidden_dim: usize, rng: &mut R) -> Self {
        Self {
            input: Linear::new(input_dim, 3 * hidden_dim, rng),
            recurrent: Linear::new(hidden_dim, 3 * hidden_dim, rng),
            hidden_dim,
        }
    }

    /// Assemble a layer from its input and recurrent projections.
    ///
    /// The hidden width is read off `recurrent`, which must be square up to
    /// the three gates.
    pub fn from_parts(input: Linear, recurrent: Linear) -> Result<Self, NnError> {
        let hidden_dim = recurrent.input_dim();
        if hidden_dim == 0 {
            return Err(NnError::InvalidConfig {
                reason: "GRU hidden width must be positive".to_string(),
            });
        }
        if recurrent.output_dim() != 3 * hidden_dim {
            return Err(NnError::DimensionMismatch {
                context: "gru recurrent gates",
                expected: 3 * hidden_dim,
                got: recurrent.output_dim(),
            });
        }
        if input.output_dim() != 3 * hidden_dim {
            return Err(NnError::DimensionMismatch {
                context: "gru input gates",
                expected: 3 * hidden_dim,
                got: input.output_dim(),
            });
        }
        Ok(Self {
            input,
            recurrent,
            hidden_dim,
        })
    }

    /// Width of accepted inputs.
    pub fn input_dim(&self) -> usize {
        self.input.input_dim()
    }

    /// Width of the hidden state.
    pub fn hidden_dim(&self) -> usize {
        self.hidden_dim
    }

    /// Number of scalar parameters.
    pub fn parameter_count(&self) -> usize {
        self.input.parameter_count() + self.recurrent.parameter_count()
    }

    /// Compute the next hidden state from the previous one and an input.
    pub fn step(&self, h: &RTensor, x: &RTensor) -> Result<RTensor, NnError> {
        let gx = self.input.forward(x)?;
        let gh = self.recurrent.forward(h)?;

        let z = gx.chunk(3, 0).add(&gh.chunk(3, 0)).sigmoid();
        let r = gx.chunk(3, 1).add(&gh.chunk(3, 1)).sigmoid();
        let n = gx.chunk(3, 2).add(&r.mul(&gh.chunk(3, 2))).tanh();

        let keep = z.mul(h);
        let update = z.map(|v| 1.0 - v).mul(&n);
        Ok(update.add(&keep))
    }
}

/// A stack of GRU layers; layer `i + 1` reads the output of layer `i`.
///
/// Never empty, and every layer has the same hidden width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredGruEncoder")]
pub struct GruEncoder {
    layers: Vec<GruCell>,
}

#[derive(Deserialize)]
struct StoredGruEncoder {
    layers: Vec<GruCell>,
}

impl TryFrom<StoredGruEncoder> for GruEncoder {
    type Error = NnError;

    fn try_from(stored: StoredGruEncoder) -> Result<Self, NnError> {
        GruEncoder::from_layers(stored.layers)
    }
}

impl GruEncoder {
    /// Create `layer_count` layers, the first reading `input_dim` wide vectors.
    pub fn new<R: Rng + ?Sized>(
        layer_count: usize,
        input_dim: usize,
        hidden_dim: usize,
        rng: &mut R,
    ) -> Result<Self, NnError> {
        if layer_count == 0 || hidden_dim == 0 {
            return Err(NnError::InvalidConfig {
                reason: format!(
                    "GRU needs at least one layer of positive width (layers = {}, width = {})",
                    layer_count, hidden_dim
                ),
            });
        }
        let mut layers = Vec::with_capacity(layer_count);
        for i in 0..layer_count {
            let in_dim = if i == 0 { input_dim } else { hidden_dim };
            layers.push(GruCell::new(in_dim, hidden_dim, &mut *rng));
        }
        Ok(Self { layers })
    }

    /// Stack existing layers, checking that their widths chain.
    pub fn from_layers(layers: Vec<GruCell>) -> Result<Self, NnError> {
        let hidden_dim = match layers.first() {
            Some(first) => first.hidden_dim(),
            None => {
                return Err(NnError::InvalidConfig {
                    reason: "GRU needs at least one layer".to_string(),
                })
            }
        };
        for layer in &layers {
            if layer.hidden_dim() != hidden_dim {
                return Err(NnError::DimensionMismatch {
                    context: "gru layer width",
                    expected: hidden_dim,
                    got: layer.hidden_dim(),
                });
            }
        }
        for layer in layers.iter().skip(1) {
            if layer.input_dim() != hidden_dim {
                return Err(NnError::DimensionMismatch {
                    context: "gru layer input",
                    expected: hidden_dim,
                    got: layer.input_dim(),
                });
            }
        }
        Ok(Self { layers })
    }

    /// Number of layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Width of accepted inputs.
    pub fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, GruCell::input_dim)
    }

    /// Width of every layer's hidden state.
    pub fn hidden_dim(&self) -> usize {
        self.layers.first().map_or(0, GruCell::hidden_dim)
    }

    /// Number of scalar parameters.
    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(GruCell::parameter_count).sum()
    }

    /// Advance every layer by one input; returns the new per-layer states.
    pub fn step(&self, previous: &[RTensor], x: &RTensor) -> Result<Vec<RTensor>, NnError> {
        if previous.len() != self.layers.len() {
            return Err(NnError::DimensionMismatch {
                context: "gru layer states",
                expected: self.layers.len(),
                got: previous.len(),
            });
        }
        let mut next = Vec::with_capacity(self.layers.len());
        let mut input = x.clone();
        for (layer, h) in self.layers.iter().zip(previous) {
            let h_new = layer.step(h, &input)?;
            input = h_new.clone();
            next.push(h_new);
        }
        Ok(next)
    }
}
