//! # NLP - Words, Vocabulary and Dependency-Tree Text
//!
//! Sentences are read as action sequences that build a binary dependency
//! tree left to right. Ordinary words open sub-trees; two reserved control
//! tokens close them:
//!
//! - **`</LEFT>`**: the current node has no more left children
//! - **`</RIGHT>`**: the current node is complete; fold it into its parent
//!
//! This crate owns the text side of that picture: the [`Word`] and
//! [`Action`] types, the [`Vocab`] mapping, resolution of the
//! [`ControlTokens`], and a corpus reader that rejects badly nested lines
//! before they ever reach a decoder.
//!
//! ## Example
//!
//! ```rust
//! use deplm_nlp::{parse_sentence, Action, ControlTokens, Vocab};
//!
//! let mut vocab = Vocab::with_control_tokens();
//! let sentence = parse_sentence("dogs </LEFT> bark </LEFT> </RIGHT> </RIGHT> </RIGHT>", &mut vocab).unwrap();
//!
//! let controls = ControlTokens::resolve(&vocab).unwrap();
//! assert_eq!(controls.classify(sentence[1].id()), Action::CloseLeft);
//! assert_eq!(sentence.len(), 7);
//! ```

mod error;
pub mod reader;
pub mod tree;
pub mod vocab;
pub mod word;

pub use error::NlpError;
pub use reader::{parse_sentence, parse_text, read_text};
pub use tree::TreeChecker;
pub use vocab::Vocab;
pub use word::{
    Action, ControlTokens, Sentence, Word, WordId, CLOSE_LEFT_TOKEN, CLOSE_RIGHT_TOKEN,
};
