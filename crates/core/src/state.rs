//! # Decoder State Arena
//!
//! Every transition appends one immutable [`DecoderState`] and two links:
//!
//! ```text
//!  index   state (stack, comp, depth, left_done)   stack[i]   head[i]
//!  ─────   ─────────────────────────────────────   ────────   ───────
//!    0     (ROOT, ROOT,  0, true)    ROOT           -          -
//!    1     (#0,   #0,    1, false)   "dog"          0          0
//!    2     (#0,   #1,    1, true)    </LEFT>        0          1
//!    3     (ROOT, #3,    0, true)    </RIGHT>       -          2
//! ```
//!
//! `stack[i]` is the state a later `</RIGHT>` returns to, `head[i]` the
//! state `i` was produced from. A link only ever names an earlier index, so
//! the arena is a forward-only DAG and any pointer can be branched from
//! again without copying.

use std::fmt;

use deplm_nn::EncoderPointer;

use crate::error::DecoderError;

/// Depth of a state whose top-level tree has been closed.
pub const TERMINAL_DEPTH: i32 = -1;

/// Handle to one decoder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatePointer(pub usize);

impl StatePointer {
    /// The unique initial state of every graph.
    pub const ROOT: StatePointer = StatePointer(0);

    /// Arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StatePointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One immutable decoder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderState {
    /// Position on the stack encoder (open sub-trees).
    pub stack: EncoderPointer,
    /// Position on the composition encoder (current sibling sequence).
    pub comp: EncoderPointer,
    /// Number of open sub-trees, [`TERMINAL_DEPTH`] once finished.
    pub depth: i32,
    /// Whether the current node's left children are finished.
    pub left_done: bool,
}

impl DecoderState {
    /// The state every graph starts from.
    pub fn root() -> Self {
        Self {
            stack: EncoderPointer::ROOT,
            comp: EncoderPointer::ROOT,
            depth: 0,
            left_done: true,
        }
    }

    /// Whether the top-level tree has been closed.
    pub fn is_terminal(&self) -> bool {
        self.depth == TERMINAL_DEPTH
    }
}

/// Append-only storage for states and their links.
#[derive(Debug, Clone, Default)]
pub struct StateArena {
    states: Vec<DecoderState>,
    pop_targets: Vec<Option<StatePointer>>,
    heads: Vec<Option<StatePointer>>,
}

impl StateArena {
    /// An empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every state and seed the ROOT.
    pub fn reset(&mut self) {
        self.states.clear();
        self.pop_targets.clear();
        self.heads.clear();
        self.push(DecoderState::root(), None, None);
    }

    /// Append a state; returns its pointer.
    pub fn push(
        &mut self,
        state: DecoderState,
        pop_target: Option<StatePointer>,
        head: Option<StatePointer>,
    ) -> StatePointer {
        self.states.push(state);
        self.pop_targets.push(pop_target);
        self.heads.push(head);
        StatePointer(self.states.len() - 1)
    }

    fn check(&self, p: StatePointer) -> Result<usize, DecoderError> {
        if p.0 < self.states.len() {
            Ok(p.0)
        } else {
            Err(DecoderError::PointerOutOfRange {
                pointer: p,
                len: self.states.len(),
            })
        }
    }

    /// The state at `p`.
    pub fn get(&self, p: StatePointer) -> Result<&DecoderState, DecoderError> {
        let i = self.check(p)?;
        Ok(&self.states[i])
    }

    /// Where a `</RIGHT>` at `p` returns to; `None` is the root sentinel.
    pub fn pop_target(&self, p: StatePointer) -> Result<Option<StatePointer>, DecoderError> {
        let i = self.check(p)?;
        Ok(self.pop_targets[i])
    }

    /// The state `p` was produced from.
    pub fn head(&self, p: StatePointer) -> Result<Option<StatePointer>, DecoderError> {
        let i = self.check(p)?;
        Ok(self.heads[i])
    }

    /// Pointer to the most recently appended state.
    pub fn frontier(&self) -> Option<StatePointer> {
        self.states.len().checked_sub(1).map(StatePointer)
    }

    /// All states, oldest first.
    pub fn states(&self) -> &[DecoderState] {
        &self.states
    }

    /// All pop targets, parallel to [`StateArena::states`].
    pub fn pop_targets(&self) -> &[Option<StatePointer>] {
        &self.pop_targets
    }

    /// All heads, parallel to [`StateArena::states`].
    pub fn heads(&self) -> &[Option<StatePointer>] {
        &self.heads
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether no graph has been started.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Overwrite a pop target. Only for exercising the consistency checks.
    #[cfg(test)]
    pub(crate) fn corrupt_pop_target(&mut self, p: StatePointer, target: Option<StatePointer>) {
        self.pop_targets[p.0] = target;
    }

    /// Overwrite a stored depth. Only for exercising the consistency checks.
    #[cfg(test)]
    pub(crate) fn corrupt_depth(&mut self, p: StatePointer, depth: i32) {
        self.states[p.0].depth = depth;
    }
}
