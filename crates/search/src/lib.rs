//! # Search - Whole-Sentence Drivers
//!
//! Everything here drives an [`OutputModel`](deplm_core::OutputModel)
//! through its public capability only, so any decoder variant plugs in:
//!
//! - [`beam_search`]: k-best sentences with layer-wise early termination
//! - [`sample_sentence`]: ancestral sampling under the legality masks
//! - [`greedy_decode`]: repeated top-1 choice
//! - [`sentence_loss`] / [`diagnose`]: scoring of observed sentences
//! - [`output`]: the `|||`-separated text formats
//!
//! Every driver starts a new graph. A failing driver call loses only the
//! sentence it was working on; callers log it and move on.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use deplm_core::{DependencyOutputModel, DependencyParams, ModelConfig};
//! use deplm_nlp::Vocab;
//! use deplm_search::{beam_search, BeamConfig};
//!
//! let mut vocab = Vocab::with_control_tokens();
//! vocab.convert("dog").unwrap();
//! let config = ModelConfig { embedding_dim: 4, state_dim: 4, hidden_dim: 4, ..ModelConfig::default() };
//! let params = Arc::new(DependencyParams::new(config, &vocab).unwrap());
//! let mut model = DependencyOutputModel::new(params).unwrap();
//!
//! let beam = BeamConfig { kbest_size: 2, beam_size: 4, max_length: 12, ..BeamConfig::default() };
//! let kbest = beam_search(&mut model, &beam).unwrap();
//! assert!(!kbest.is_empty() && kbest.len() <= 2);
//! ```

pub mod beam;
mod error;
pub mod output;
pub mod sample;
pub mod score;

pub use beam::{beam_search, BeamConfig};
pub use error::SearchError;
pub use output::{format_diagnostic, format_kbest, format_loss, format_sample};
pub use sample::{greedy_decode, sample_sentence, ScoredSentence};
pub use score::{diagnose, sentence_loss, TokenDiagnostic};
