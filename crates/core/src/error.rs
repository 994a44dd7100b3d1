//! # Error Types
//!
//! Decoder faults fall into five groups:
//!
//! | group | variants | cause |
//! |-------|----------|-------|
//! | configuration | `OddStateDim`, `InvalidConfig`, `Vocabulary` | parameters that cannot be built or do not fit the vocabulary |
//! | illegal action | `IllegalAction` | an action the tree shape does not allow at this state |
//! | consistency | `InconsistentPop` | the arena disagrees with itself while closing a sub-tree |
//! | bounds | `PointerOutOfRange`, `WordOutOfRange` | a handle or id that names nothing |
//! | degenerate | `DegenerateDistribution` | every action masked away |
//!
//! None of these are retried inside the decoder. Drivers discard the
//! sentence or hypothesis that produced them.

use deplm_nlp::{Action, NlpError};
use deplm_nn::NnError;
use thiserror::Error;

use crate::state::StatePointer;

/// Errors raised by the decoder state machine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecoderError {
    /// The state width must split evenly between the two encoders.
    #[error("State dimension must be even, got {state_dim}")]
    OddStateDim { state_dim: usize },

    /// Model hyper-parameters or stored weights that do not agree.
    #[error("Invalid model configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Vocabulary lookups, including missing control tokens.
    #[error(transparent)]
    Vocabulary(#[from] NlpError),

    /// An action observed where the tree shape forbids it.
    #[error("Illegal action {action:?} at state {pointer}: {reason}")]
    IllegalAction {
        pointer: StatePointer,
        action: Action,
        reason: &'static str,
    },

    /// Closing a sub-tree landed somewhere other than the recorded ancestor.
    #[error("Inconsistent pop at state {pointer}: {field} expected {expected}, got {got}")]
    InconsistentPop {
        pointer: StatePointer,
        field: &'static str,
        expected: String,
        got: String,
    },

    /// State pointer outside the arena.
    #[error("State pointer {pointer} out of range (arena has {len} states)")]
    PointerOutOfRange { pointer: StatePointer, len: usize },

    /// Word id outside the output vocabulary.
    #[error("Word id {id} out of range for vocabulary of size {size}")]
    WordOutOfRange { id: usize, size: usize },

    /// No legal action has any probability mass.
    #[error("No legal action has probability mass at state {pointer}")]
    DegenerateDistribution { pointer: StatePointer },

    /// Numeric failure inside a learned component.
    #[error(transparent)]
    Nn(#[from] NnError),
}
