//! Error types for search drivers.

use deplm_core::DecoderError;
use deplm_nlp::NlpError;
use thiserror::Error;

/// Errors that can occur while decoding whole sentences.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// Search parameters that cannot be honoured.
    #[error("Invalid search configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The decoder rejected a step.
    #[error(transparent)]
    Decoder(#[from] DecoderError),

    /// A word could not be rendered.
    #[error(transparent)]
    Vocabulary(#[from] NlpError),
}
