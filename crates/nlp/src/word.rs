//! Words, actions and the two reserved control tokens.
//!
//! Every vocabulary entry is read as one of three tree-building actions:
//!
//! | token | action | effect |
//! |-------|--------|--------|
//! | any ordinary word | [`Action::Push`] | open a new sub-tree as a child of the current node |
//! | `</LEFT>` | [`Action::CloseLeft`] | the current node has no more left children |
//! | `</RIGHT>` | [`Action::CloseRight`] | the current node is finished; fold it into its parent |

use serde::{Deserialize, Serialize};

use crate::vocab::Vocab;
use crate::NlpError;

/// Integer id of a vocabulary entry.
pub type WordId = usize;

/// Surface form of the close-left control token.
pub const CLOSE_LEFT_TOKEN: &str = "</LEFT>";

/// Surface form of the close-right control token.
pub const CLOSE_RIGHT_TOKEN: &str = "</RIGHT>";

/// A token of an output sentence.
///
/// Only integer-id words exist today; code outside this crate should go
/// through [`Word::id`] rather than matching on the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Word {
    /// A plain vocabulary entry.
    Standard(WordId),
}

impl Word {
    /// The vocabulary id of this word.
    pub fn id(&self) -> WordId {
        match self {
            Word::Standard(id) => *id,
        }
    }
}

impl From<WordId> for Word {
    fn from(id: WordId) -> Self {
        Word::Standard(id)
    }
}

/// A sentence as a sequence of words (actions).
pub type Sentence = Vec<Word>;

/// The tree-building move a word stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Begin a new sub-tree headed by this word.
    Push(WordId),
    /// Finish the left children of the current node.
    CloseLeft,
    /// Finish the current node and return to its parent.
    CloseRight,
}

/// Resolved ids of `</LEFT>` and `</RIGHT>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlTokens {
    /// Id of `</LEFT>`
    pub close_left: WordId,
    /// Id of `</RIGHT>`
    pub close_right: WordId,
}

impl ControlTokens {
    /// Look both control tokens up in a vocabulary.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::MissingControlToken`] if either token is absent.
    pub fn resolve(vocab: &Vocab) -> Result<Self, NlpError> {
        let close_left = vocab
            .lookup(CLOSE_LEFT_TOKEN)
            .ok_or(NlpError::MissingControlToken {
                token: CLOSE_LEFT_TOKEN,
            })?;
        let close_right = vocab
            .lookup(CLOSE_RIGHT_TOKEN)
            .ok_or(NlpError::MissingControlToken {
                token: CLOSE_RIGHT_TOKEN,
            })?;
        Ok(Self {
            close_left,
            close_right,
        })
    }

    /// Interpret a word id as an action.
    pub fn classify(&self, id: WordId) -> Action {
        if id == self.close_right {
            Action::CloseRight
        } else if id == self.close_left {
            Action::CloseLeft
        } else {
            Action::Push(id)
        }
    }

    /// Whether `id` is one of the control tokens.
    pub fn is_control(&self, id: WordId) -> bool {
        id == self.close_left || id == self.close_right
    }
}
