//! Learned parameters of the dependency decoder.
//!
//! ```text
//!   word id ──▶ embedder ──▶ projection ──┬──▶ stack GRU ──┐
//!                (E wide)     (S/2 wide)  └──▶ comp GRU  ──┴─▶ [S wide] ──▶ MLP ──▶ |V| scores
//! ```
//!
//! One [`DependencyParams`] is shared read-only, behind an `Arc`, by any
//! number of decoder instances.

use std::sync::Arc;

use deplm_nlp::{ControlTokens, Vocab};
use deplm_nn::{Embedder, GruEncoder, Linear, Mlp, RTensor, Scorer, StandardEmbedder};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::DecoderError;

fn default_layers() -> usize {
    2
}

/// Hyper-parameters of a decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Width of word embeddings.
    pub embedding_dim: usize,
    /// Width of a decoder state; half goes to each encoder.
    pub state_dim: usize,
    /// Width of the scorer's hidden layer.
    pub hidden_dim: usize,
    /// Layers per GRU encoder.
    #[serde(default = "default_layers")]
    pub layers: usize,
    /// Seed for parameter initialisation.
    #[serde(default)]
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 64,
            state_dim: 64,
            hidden_dim: 64,
            layers: default_layers(),
            seed: 0,
        }
    }
}

impl ModelConfig {
    /// Width of each encoder's hidden state.
    pub fn half_state_dim(&self) -> usize {
        self.state_dim / 2
    }

    /// Check that the widths can be built.
    ///
    /// # Errors
    ///
    /// [`DecoderError::OddStateDim`] for an odd state width,
    /// [`DecoderError::InvalidConfig`] for any zero width or layer count.
    pub fn validate(&self) -> Result<(), DecoderError> {
        if self.state_dim % 2 != 0 {
            return Err(DecoderError::OddStateDim {
                state_dim: self.state_dim,
            });
        }
        let widths = [
            ("embedding_dim", self.embedding_dim),
            ("state_dim", self.state_dim),
            ("hidden_dim", self.hidden_dim),
            ("layers", self.layers),
        ];
        if let Some((name, _)) = widths.iter().find(|(_, v)| *v == 0) {
            return Err(DecoderError::InvalidConfig {
                reason: format!("{} must be positive", name),
            });
        }
        Ok(())
    }
}

/// Everything a [`DependencyOutputModel`](crate::DependencyOutputModel) learns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyParams {
    config: ModelConfig,
    controls: ControlTokens,
    vocab_size: usize,
    embedder: StandardEmbedder,
    projection: Linear,
    stack_encoder: Arc<GruEncoder>,
    comp_encoder: Arc<GruEncoder>,
    scorer: Mlp,
    stack_init: RTensor,
    comp_init: RTensor,
}

impl DependencyParams {
    /// Randomly initialise parameters for `vocab`.
    ///
    /// # Errors
    ///
    /// Configuration faults from [`ModelConfig::validate`], or
    /// [`DecoderError::Vocabulary`] if `</LEFT>` or `</RIGHT>` is missing.
    pub fn new(config: ModelConfig, vocab: &Vocab) -> Result<Self, DecoderError> {
        config.validate()?;
        let controls = ControlTokens::resolve(vocab)?;
        let vocab_size = vocab.len();
        let half = config.half_state_dim();
        let mut rng = StdRng::seed_from_u64(config.seed);

        let embedder = StandardEmbedder::new(vocab_size, config.embedding_dim, &mut rng);
        let projection = Linear::new(config.embedding_dim, half, &mut rng);
        let stack_encoder = Arc::new(GruEncoder::new(config.layers, half, half, &mut rng)?);
        let comp_encoder = Arc::new(GruEncoder::new(config.layers, half, half, &mut rng)?);
        let scorer = Mlp::new(config.state_dim, config.hidden_dim, vocab_size, &mut rng);
        let stack_init = RTensor::randn(vec![config.layers * half], 0.1, &mut rng);
        let comp_init = RTensor::randn(vec![config.layers * half], 0.1, &mut rng);

        Ok(Self {
            config,
            controls,
            vocab_size,
            embedder,
            projection,
            stack_encoder,
            comp_encoder,
            scorer,
            stack_init,
            comp_init,
        })
    }

    /// Replace the scorer.
    ///
    /// # Errors
    ///
    /// [`DecoderError::InvalidConfig`] unless the scorer reads a full state
    /// and scores every vocabulary entry.
    pub fn with_scorer(mut self, scorer: Mlp) -> Result<Self, DecoderError> {
        if scorer.input_dim() != self.config.state_dim || scorer.output_dim() != self.vocab_size {
            return Err(DecoderError::InvalidConfig {
                reason: format!(
                    "scorer maps {} -> {}, decoder needs {} -> {}",
                    scorer.input_dim(),
                    scorer.output_dim(),
                    self.config.state_dim,
                    self.vocab_size
                ),
            });
        }
        self.scorer = scorer;
        Ok(self)
    }

    /// Check reloaded parameters against the vocabulary they will decode.
    ///
    /// Control ids must resolve to the stored values and every component
    /// width must agree with the stored configuration.
    pub fn validate(&self, vocab: &Vocab) -> Result<(), DecoderError> {
        self.config.validate()?;
        let controls = ControlTokens::resolve(vocab)?;
        if controls != self.controls {
            return Err(DecoderError::InvalidConfig {
                reason: format!(
                    "control tokens resolve to {:?}, model was built with {:?}",
                    controls, self.controls
                ),
            });
        }

        let half = self.config.half_state_dim();
        let layers = self.config.layers;
        let checks = [
            ("vocabulary size", self.vocab_size, vocab.len()),
            ("embedder rows", self.embedder.vocab_size(), self.vocab_size),
            ("embedder width", self.embedder.dim(), self.config.embedding_dim),
            ("projection input", self.projection.input_dim(), self.config.embedding_dim),
            ("projection output", self.projection.output_dim(), half),
            ("stack encoder layers", self.stack_encoder.layer_count(), layers),
            ("stack encoder input", self.stack_encoder.input_dim(), half),
            ("stack encoder width", self.stack_encoder.hidden_dim(), half),
            ("comp encoder layers", self.comp_encoder.layer_count(), layers),
            ("comp encoder input", self.comp_encoder.input_dim(), half),
            ("comp encoder width", self.comp_encoder.hidden_dim(), half),
            ("scorer input", self.scorer.input_dim(), self.config.state_dim),
            ("scorer output", self.scorer.output_dim(), self.vocab_size),
            ("stack initial state", self.stack_init.size(), layers * half),
            ("comp initial state", self.comp_init.size(), layers * half),
        ];
        for (what, got, expected) in checks {
            if got != expected {
                return Err(DecoderError::InvalidConfig {
                    reason: format!("{} is {}, expected {}", what, got, expected),
                });
            }
        }
        Ok(())
    }

    /// Hyper-parameters.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Resolved `</LEFT>` / `</RIGHT>` ids.
    pub fn controls(&self) -> ControlTokens {
        self.controls
    }

    /// Number of scored vocabulary entries.
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn embedder(&self) -> &StandardEmbedder {
        &self.embedder
    }

    pub fn projection(&self) -> &Linear {
        &self.projection
    }

    pub fn stack_encoder(&self) -> &Arc<GruEncoder> {
        &self.stack_encoder
    }

    pub fn comp_encoder(&self) -> &Arc<GruEncoder> {
        &self.comp_encoder
    }

    pub fn scorer(&self) -> &Mlp {
        &self.scorer
    }

    pub fn stack_init(&self) -> &RTensor {
        &self.stack_init
    }

    pub fn comp_init(&self) -> &RTensor {
        &self.comp_init
    }

    /// Total number of learned scalars.
    pub fn parameter_count(&self) -> usize {
        self.embedder.parameter_count()
            + self.projection.parameter_count()
            + self.stack_encoder.parameter_count()
            + self.comp_encoder.parameter_count()
            + self.scorer.parameter_count()
            + self.stack_init.size()
            + self.comp_init.size()
    }
}
