//! # Core - Incremental Dependency Decoder
//!
//! The decoder reads a sentence as a sequence of tree-building actions and
//! answers, at any state it has visited, "what comes next?":
//!
//! - **State arena** ([`StateArena`]): append-only decoder states addressed
//!   by [`StatePointer`], so hypotheses branch without copying history
//! - **Output model** ([`OutputModel`]): the capability drivers use
//!   (transitions, log-distributions, k-best, sampling, loss)
//! - **Dependency decoder** ([`DependencyOutputModel`]): stack and
//!   composition GRUs driven by PUSH / `</LEFT>` / `</RIGHT>`, with
//!   legality masks
//! - **Parameters** ([`DependencyParams`]): learned weights shared read-only
//!   between decoder instances
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use deplm_core::{DependencyOutputModel, DependencyParams, ModelConfig, OutputModel};
//! use deplm_nlp::{Vocab, Word};
//!
//! let mut vocab = Vocab::with_control_tokens();
//! let dog = vocab.convert("dog").unwrap();
//! let config = ModelConfig { embedding_dim: 4, state_dim: 4, hidden_dim: 4, ..ModelConfig::default() };
//! let params = Arc::new(DependencyParams::new(config, &vocab).unwrap());
//! let mut model = DependencyOutputModel::new(params).unwrap();
//!
//! // "dog </LEFT> </RIGHT> </RIGHT>"
//! let sentence: Vec<Word> = [dog, 0, 1, 1].into_iter().map(Word::from).collect();
//! let loss = model.build_graph(&sentence).unwrap();
//! assert!(loss > 0.0);
//! assert!(model.is_done().unwrap());
//! ```

pub mod dependency;
pub mod dist;
pub mod error;
pub mod kbest;
pub mod model;
pub mod params;
pub mod state;

pub use dependency::{DependencyOutputModel, MAX_OPEN_DEPTH};
pub use dist::ActionDist;
pub use error::DecoderError;
pub use kbest::KBestList;
pub use model::OutputModel;
pub use params::{DependencyParams, ModelConfig};
pub use state::{DecoderState, StateArena, StatePointer, TERMINAL_DEPTH};
