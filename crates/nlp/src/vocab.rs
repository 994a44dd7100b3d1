//! String ⇄ id vocabulary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::word::{WordId, CLOSE_LEFT_TOKEN, CLOSE_RIGHT_TOKEN};
use crate::NlpError;

/// A growable vocabulary that can be frozen once training text is read.
///
/// While unfrozen, [`Vocab::convert`] assigns the next free id to unseen
/// words. Once frozen, unseen words map to the UNK entry if one is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredVocab", into = "StoredVocab")]
pub struct Vocab {
    words: Vec<String>,
    ids: HashMap<String, WordId>,
    frozen: bool,
    unk: Option<WordId>,
}

/// On-disk form: the reverse index is rebuilt on load.
#[derive(Serialize, Deserialize)]
struct StoredVocab {
    words: Vec<String>,
    frozen: bool,
    unk: Option<WordId>,
}

impl From<StoredVocab> for Vocab {
    fn from(stored: StoredVocab) -> Self {
        let ids = stored
            .words
            .iter()
            .enumerate()
            .map(|(id, w)| (w.clone(), id))
            .collect();
        Self {
            words: stored.words,
            ids,
            frozen: stored.frozen,
            unk: stored.unk,
        }
    }
}

impl From<Vocab> for StoredVocab {
    fn from(vocab: Vocab) -> Self {
        Self {
            words: vocab.words,
            frozen: vocab.frozen,
            unk: vocab.unk,
        }
    }
}

impl Vocab {
    /// Create an empty, unfrozen vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a vocabulary whose first two ids are `</LEFT>` and `</RIGHT>`.
    pub fn with_control_tokens() -> Self {
        let mut vocab = Self::new();
        vocab.insert(CLOSE_LEFT_TOKEN);
        vocab.insert(CLOSE_RIGHT_TOKEN);
        vocab
    }

    fn insert(&mut self, word: &str) -> WordId {
        let id = self.words.len();
        self.words.push(word.to_string());
        self.ids.insert(word.to_string(), id);
        id
    }

    /// Map a word to its id, adding it if the vocabulary is not frozen.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::UnknownWord`] for an unseen word in a frozen
    /// vocabulary without UNK.
    pub fn convert(&mut self, word: &str) -> Result<WordId, NlpError> {
        if let Some(&id) = self.ids.get(word) {
            return Ok(id);
        }
        if !self.frozen {
            return Ok(self.insert(word));
        }
        self.unk.ok_or_else(|| NlpError::UnknownWord {
            word: word.to_string(),
        })
    }

    /// Look a word up without inserting it.
    pub fn lookup(&self, word: &str) -> Option<WordId> {
        self.ids.get(word).copied()
    }

    /// Surface form of an id.
    pub fn word(&self, id: WordId) -> Result<&str, NlpError> {
        self.words
            .get(id)
            .map(String::as_str)
            .ok_or(NlpError::UnknownId {
                id,
                size: self.words.len(),
            })
    }

    /// Stop adding new words.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Whether the vocabulary is frozen.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Route unseen words to `word`, adding it if needed.
    pub fn set_unk(&mut self, word: &str) -> WordId {
        let id = match self.lookup(word) {
            Some(id) => id,
            None => self.insert(word),
        };
        self.unk = Some(id);
        id
    }

    /// Id of the UNK entry, if any.
    pub fn unk(&self) -> Option<WordId> {
        self.unk
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the vocabulary has no entries.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Join ids back into text.
    pub fn render(&self, ids: impl IntoIterator<Item = WordId>) -> Result<String, NlpError> {
        let words = ids
            .into_iter()
            .map(|id| self.word(id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(words.join(" "))
    }
}
