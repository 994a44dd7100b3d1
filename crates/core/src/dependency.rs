//! # Dependency Output Model
//!
//! The decoder reads one action per step and keeps two recurrent encoders
//! in step with the tree being built:
//!
//! ```text
//!   stack encoder   one entry per open sub-tree, grown by PUSH,
//!                   popped (via head_of) by </RIGHT>
//!   comp encoder    the children read so far at the current node;
//!                   PUSH starts a fresh sequence from ROOT,
//!                   </LEFT> appends the boundary marker,
//!                   </RIGHT> summarises the node and appends that
//!                   summary to the parent's sequence
//! ```
//!
//! A state's vector is `[stack hidden ; comp hidden]`. The scorer maps it to
//! one score per vocabulary entry.
//!
//! ## Legality
//!
//! | action | legal when |
//! |--------|-----------|
//! | PUSH | always |
//! | `</LEFT>` | left children still open and fewer than [`MAX_OPEN_DEPTH`] open sub-trees |
//! | `</RIGHT>` | not terminal, left children closed, and something to close |
//!
//! "Something to close" fails only at a state that sits at the top level with
//! an empty composition sequence, i.e. ROOT itself. [`OutputModel::add_input_at`]
//! rejects an illegal `</LEFT>`/`</RIGHT>`; the depth limit is applied only
//! when generating.

use std::sync::Arc;

use deplm_nlp::{Action, ControlTokens, Word};
use deplm_nn::{Embedder, EncoderPointer, GruSequence, RTensor, Scorer, SequenceEncoder};
use log::trace;
use rand::RngCore;

use crate::dist::ActionDist;
use crate::error::DecoderError;
use crate::kbest::KBestList;
use crate::model::OutputModel;
use crate::params::DependencyParams;
use crate::state::{DecoderState, StateArena, StatePointer};

/// Most sub-trees that may be open when `</LEFT>` is generated.
pub const MAX_OPEN_DEPTH: i32 = 100;

/// Decoder over binary dependency trees.
///
/// Stateful and single-threaded: one instance decodes one graph at a time.
/// Independent instances may share one `Arc<DependencyParams>`.
#[derive(Debug, Clone)]
pub struct DependencyOutputModel {
    params: Arc<DependencyParams>,
    stack_encoder: GruSequence,
    comp_encoder: GruSequence,
    arena: StateArena,
}

impl DependencyOutputModel {
    /// Create a decoder positioned at ROOT of a fresh graph.
    pub fn new(params: Arc<DependencyParams>) -> Result<Self, DecoderError> {
        let stack_encoder = GruSequence::new(Arc::clone(params.stack_encoder()), params.stack_init())?;
        let comp_encoder = GruSequence::new(Arc::clone(params.comp_encoder()), params.comp_init())?;
        let mut model = Self {
            params,
            stack_encoder,
            comp_encoder,
            arena: StateArena::new(),
        };
        model.new_graph();
        Ok(model)
    }

    /// The shared parameters.
    pub fn params(&self) -> &Arc<DependencyParams> {
        &self.params
    }

    /// The states appended since the last [`OutputModel::new_graph`].
    pub fn arena(&self) -> &StateArena {
        &self.arena
    }

    /// Resolved control token ids.
    pub fn controls(&self) -> ControlTokens {
        self.params.controls()
    }

    fn check_word(&self, word: Word) -> Result<usize, DecoderError> {
        let id = word.id();
        let size = self.params.vocab_size();
        if id < size {
            Ok(id)
        } else {
            Err(DecoderError::WordOutOfRange { id, size })
        }
    }

    /// Embed a word and project it to encoder width.
    fn project(&self, word: Word) -> Result<RTensor, DecoderError> {
        let id = self.check_word(word)?;
        let embedded = self.params.embedder().embed(id)?;
        Ok(self.params.projection().forward(&embedded)?)
    }

    /// Whether `</LEFT>` may be generated at `state`.
    pub fn can_close_left(state: &DecoderState) -> bool {
        !state.left_done && state.depth < MAX_OPEN_DEPTH
    }

    /// Whether `</RIGHT>` may be read or generated at `p`.
    pub fn can_close_right(&self, p: StatePointer) -> Result<bool, DecoderError> {
        let state = self.arena.get(p)?;
        let at_top_level = self.arena.pop_target(p)?.is_none();
        Ok(!state.is_terminal() && state.left_done && !(at_top_level && state.comp.is_root()))
    }

    fn illegal(p: StatePointer, action: Action, reason: &'static str) -> DecoderError {
        DecoderError::IllegalAction {
            pointer: p,
            action,
            reason,
        }
    }

    fn push(&mut self, state: &DecoderState, x: &RTensor) -> Result<DecoderState, DecoderError> {
        let (stack, _) = self.stack_encoder.step(state.stack, x)?;
        let (comp, _) = self.comp_encoder.step(EncoderPointer::ROOT, x)?;
        Ok(DecoderState {
            stack,
            comp,
            depth: state.depth + 1,
            left_done: false,
        })
    }

    fn close_left(
        &mut self,
        p: StatePointer,
        state: &DecoderState,
        x: &RTensor,
    ) -> Result<DecoderState, DecoderError> {
        if state.left_done {
            return Err(Self::illegal(p, Action::CloseLeft, "left children already closed"));
        }
        let (comp, _) = self.comp_encoder.step(state.comp, x)?;
        Ok(DecoderState {
            comp,
            left_done: true,
            ..*state
        })
    }

    /// Close the current node and fold its summary into the parent.
    ///
    /// Returns the new state and its pop target.
    fn close_right(
        &mut self,
        p: StatePointer,
        state: &DecoderState,
        x: &RTensor,
    ) -> Result<(DecoderState, Option<StatePointer>), DecoderError> {
        if state.is_terminal() {
            return Err(Self::illegal(p, Action::CloseRight, "sentence already closed"));
        }
        if !state.left_done {
            return Err(Self::illegal(p, Action::CloseRight, "left children still open"));
        }

        match self.arena.pop_target(p)? {
            None => {
                if state.comp.is_root() {
                    return Err(Self::illegal(p, Action::CloseRight, "nothing to close"));
                }
                let (_, node) = self.comp_encoder.step(state.comp, x)?;
                let (comp, _) = self.comp_encoder.step(EncoderPointer::ROOT, &node)?;
                let next = DecoderState {
                    stack: EncoderPointer::ROOT,
                    comp,
                    depth: state.depth - 1,
                    left_done: true,
                };
                Ok((next, None))
            }
            Some(q) => {
                let pop_to = *self.arena.get(q)?;
                let stack = self.stack_encoder.head_of(state.stack)?;
                if stack != pop_to.stack {
                    return Err(DecoderError::InconsistentPop {
                        pointer: p,
                        field: "stack pointer",
                        expected: pop_to.stack.to_string(),
                        got: stack.to_string(),
                    });
                }
                let depth = state.depth - 1;
                if depth != pop_to.depth {
                    return Err(DecoderError::InconsistentPop {
                        pointer: p,
                        field: "depth",
                        expected: pop_to.depth.to_string(),
                        got: depth.to_string(),
                    });
                }
                let (_, node) = self.comp_encoder.step(state.comp, x)?;
                let (comp, _) = self.comp_encoder.step(pop_to.comp, &node)?;
                let next = DecoderState {
                    stack,
                    comp,
                    depth,
                    left_done: pop_to.left_done,
                };
                Ok((next, self.arena.pop_target(q)?))
            }
        }
    }
}

impl OutputModel for DependencyOutputModel {
    fn new_graph(&mut self) {
        self.stack_encoder.reset();
        self.comp_encoder.reset();
        self.arena.reset();
    }

    fn state_pointer(&self) -> StatePointer {
        self.arena.frontier().unwrap_or(StatePointer::ROOT)
    }

    fn state_at(&self, p: StatePointer) -> Result<RTensor, DecoderError> {
        let state = self.arena.get(p)?;
        let stack = self.stack_encoder.hidden(state.stack)?;
        let comp = self.comp_encoder.hidden(state.comp)?;
        Ok(RTensor::concat(&[&stack, &comp]))
    }

    fn add_input_at(&mut self, word: Word, p: StatePointer) -> Result<RTensor, DecoderError> {
        let state = *self.arena.get(p)?;
        let x = self.project(word)?;
        let action = self.controls().classify(word.id());

        let (next, pop_target) = match action {
            Action::Push(_) => (self.push(&state, &x)?, Some(p)),
            Action::CloseLeft => (self.close_left(p, &state, &x)?, self.arena.pop_target(p)?),
            Action::CloseRight => self.close_right(p, &state, &x)?,
        };
        let q = self.arena.push(next, pop_target, Some(p));
        trace!(
            "state {} <- {} via {:?}: depth {}, left_done {}, pop target {:?}",
            q,
            p,
            action,
            next.depth,
            next.left_done,
            pop_target.map(StatePointer::index)
        );
        self.state_at(q)
    }

    fn predict_log_distribution_at(&self, p: StatePointer) -> Result<RTensor, DecoderError> {
        let state = self.state_at(p)?;
        Ok(self.params.scorer().score(&state)?.log_softmax())
    }

    fn legal_mask_at(&self, p: StatePointer) -> Result<Vec<bool>, DecoderError> {
        let close_left = Self::can_close_left(self.arena.get(p)?);
        let close_right = self.can_close_right(p)?;
        let controls = self.controls();
        let mask = (0..self.params.vocab_size())
            .map(|w| match controls.classify(w) {
                Action::Push(_) => true,
                Action::CloseLeft => close_left,
                Action::CloseRight => close_right,
            })
            .collect();
        Ok(mask)
    }

    fn predict_kbest_at(&self, p: StatePointer, k: usize) -> Result<KBestList<Word>, DecoderError> {
        let log_probs = self.predict_log_distribution_at(p)?;
        let mask = self.legal_mask_at(p)?;
        let mut best = KBestList::new(k);
        for (w, &score) in log_probs.data.iter().enumerate() {
            if mask[w] {
                best.add(f64::from(score), Word::from(w));
            }
        }
        Ok(best)
    }

    fn sample_at(
        &self,
        p: StatePointer,
        rng: &mut dyn RngCore,
    ) -> Result<(Word, f64), DecoderError> {
        let state = self.state_at(p)?;
        let probs = self.params.scorer().score(&state)?.softmax();
        let mask = self.legal_mask_at(p)?;
        let dist = ActionDist::masked(&probs.data, |w| mask[w])
            .ok_or(DecoderError::DegenerateDistribution { pointer: p })?;
        let w = dist.sample(rng);
        Ok((Word::from(w), f64::from(dist.prob(w)).ln()))
    }

    fn loss_at(&self, p: StatePointer, reference: Word) -> Result<f64, DecoderError> {
        let id = self.check_word(reference)?;
        let log_probs = self.predict_log_distribution_at(p)?;
        Ok(-f64::from(log_probs.data[id]))
    }

    fn is_done_at(&self, p: StatePointer) -> Result<bool, DecoderError> {
        Ok(self.arena.get(p)?.is_terminal())
    }
}
