//! Error types for vocabulary and corpus handling.

use thiserror::Error;

/// Errors that can occur while mapping or reading text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NlpError {
    /// Word not found in a frozen vocabulary without an UNK entry.
    #[error("Unknown word: '{word}'")]
    UnknownWord { word: String },

    /// Word id with no vocabulary entry.
    #[error("Word id {id} out of range for vocabulary of size {size}")]
    UnknownId { id: usize, size: usize },

    /// A reserved control token is absent from the vocabulary.
    #[error("Vocabulary is missing control token '{token}'")]
    MissingControlToken { token: &'static str },

    /// An action that cannot be applied at this point of the tree.
    #[error("Malformed tree at action {position}: {reason}")]
    MalformedTree { position: usize, reason: String },

    /// A malformed line in a corpus file.
    #[error("Line {line}: {source}")]
    BadLine {
        line: usize,
        #[source]
        source: Box<NlpError>,
    },

    /// Empty sentence.
    #[error("Cannot read empty sentence")]
    EmptySentence,

    /// Reading a corpus file failed.
    #[error("Cannot read '{path}': {message}")]
    Io { path: String, message: String },
}
