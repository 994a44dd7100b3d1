//! Shape validation for action sequences.
//!
//! A sentence is a left-to-right walk over a binary dependency tree:
//!
//! ```text
//!   dog </LEFT> barks </LEFT> </RIGHT> </RIGHT> </RIGHT>
//!   ─┬─          ──┬──
//!    │             └── right child of "dog", no children of its own
//!    └── top-level head; the final </RIGHT> closes the whole sentence
//! ```
//!
//! [`TreeChecker`] applies the same rules the decoder enforces, so corpus
//! files with mismatched `</LEFT>`/`</RIGHT>` nesting are rejected while
//! reading instead of failing half way through decoding.

use crate::word::Action;
use crate::NlpError;

/// Incremental validator for one sentence.
#[derive(Debug, Clone)]
pub struct TreeChecker {
    /// Left-done flags of the open ancestors, innermost last.
    open: Vec<bool>,
    left_done: bool,
    top_level_started: bool,
    done: bool,
    position: usize,
}

impl TreeChecker {
    /// Start at the root of an empty sentence.
    pub fn new() -> Self {
        Self {
            open: Vec::new(),
            left_done: true,
            top_level_started: false,
            done: false,
            position: 0,
        }
    }

    /// Number of currently open sub-trees.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Whether the top-level tree has been closed.
    pub fn is_complete(&self) -> bool {
        self.done
    }

    fn malformed(&self, reason: &str) -> NlpError {
        NlpError::MalformedTree {
            position: self.position,
            reason: reason.to_string(),
        }
    }

    /// Apply one action.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::MalformedTree`] if the action is illegal here.
    pub fn apply(&mut self, action: Action) -> Result<(), NlpError> {
        if self.done {
            return Err(self.malformed("action after the sentence was closed"));
        }
        match action {
            Action::Push(_) => {
                self.open.push(self.left_done);
                self.left_done = false;
            }
            Action::CloseLeft => {
                if self.left_done {
                    return Err(self.malformed("left children already closed"));
                }
                self.left_done = true;
            }
            Action::CloseRight => {
                if !self.left_done {
                    return Err(self.malformed("right close before left close"));
                }
                match self.open.pop() {
                    Some(parent_left_done) => {
                        self.left_done = parent_left_done;
                        if self.open.is_empty() {
                            self.top_level_started = true;
                        }
                    }
                    None if self.top_level_started => self.done = true,
                    None => return Err(self.malformed("nothing to close")),
                }
            }
        }
        self.position += 1;
        Ok(())
    }

    /// Validate a whole sentence, which must end with the final close.
    pub fn check(actions: impl IntoIterator<Item = Action>) -> Result<(), NlpError> {
        let mut checker = Self::new();
        for action in actions {
            checker.apply(action)?;
        }
        if !checker.is_complete() {
            return Err(checker.malformed("sentence ends with open sub-trees"));
        }
        Ok(())
    }
}

impl Default for TreeChecker {
    fn default() -> Self {
        Self::new()
    }
}
