//! # The Output Model Capability
//!
//! Drivers (beam search, sampling, loss computation) talk to a decoder only
//! through [`OutputModel`]. Every query is addressed by a [`StatePointer`],
//! so a driver can branch many hypotheses from one historical state; the
//! pointer-less methods act on the most recently appended state.

use deplm_nlp::Word;
use deplm_nn::RTensor;
use rand::RngCore;

use crate::error::DecoderError;
use crate::kbest::KBestList;
use crate::state::StatePointer;

/// An autoregressive model over output actions.
pub trait OutputModel {
    /// Discard all states and start again from ROOT.
    fn new_graph(&mut self);

    /// The most recently appended state.
    fn state_pointer(&self) -> StatePointer;

    /// Vector representation of state `p`.
    fn state_at(&self, p: StatePointer) -> Result<RTensor, DecoderError>;

    /// Read `word` at state `p`, appending a new state.
    ///
    /// Returns the new state's representation; its pointer is
    /// [`OutputModel::state_pointer`] afterwards.
    fn add_input_at(&mut self, word: Word, p: StatePointer) -> Result<RTensor, DecoderError>;

    /// Log-probabilities of every vocabulary entry at `p`, legal or not.
    fn predict_log_distribution_at(&self, p: StatePointer) -> Result<RTensor, DecoderError>;

    /// Which vocabulary entries may follow state `p`.
    fn legal_mask_at(&self, p: StatePointer) -> Result<Vec<bool>, DecoderError>;

    /// The `k` most probable legal words at `p`, scored by log-probability.
    fn predict_kbest_at(&self, p: StatePointer, k: usize) -> Result<KBestList<Word>, DecoderError>;

    /// Draw a legal word at `p`; returns it with its log-probability after
    /// illegal actions are removed.
    fn sample_at(
        &self,
        p: StatePointer,
        rng: &mut dyn RngCore,
    ) -> Result<(Word, f64), DecoderError>;

    /// Negative log-probability of `reference` at `p`.
    fn loss_at(&self, p: StatePointer, reference: Word) -> Result<f64, DecoderError>;

    /// Whether state `p` has closed the whole sentence.
    fn is_done_at(&self, p: StatePointer) -> Result<bool, DecoderError>;

    fn state(&self) -> Result<RTensor, DecoderError> {
        self.state_at(self.state_pointer())
    }

    fn add_input(&mut self, word: Word) -> Result<RTensor, DecoderError> {
        let p = self.state_pointer();
        self.add_input_at(word, p)
    }

    fn predict_log_distribution(&self) -> Result<RTensor, DecoderError> {
        self.predict_log_distribution_at(self.state_pointer())
    }

    fn legal_mask(&self) -> Result<Vec<bool>, DecoderError> {
        self.legal_mask_at(self.state_pointer())
    }

    fn predict_kbest(&self, k: usize) -> Result<KBestList<Word>, DecoderError> {
        self.predict_kbest_at(self.state_pointer(), k)
    }

    fn sample(&self, rng: &mut dyn RngCore) -> Result<(Word, f64), DecoderError> {
        self.sample_at(self.state_pointer(), rng)
    }

    fn loss(&self, reference: Word) -> Result<f64, DecoderError> {
        self.loss_at(self.state_pointer(), reference)
    }

    fn is_done(&self) -> Result<bool, DecoderError> {
        self.is_done_at(self.state_pointer())
    }

    /// Summed loss of an observed sentence, read from the current state.
    ///
    /// At each position the loss of the observed word is added before the
    /// word is read, so the frontier ends just after the last word.
    fn build_graph(&mut self, sentence: &[Word]) -> Result<f64, DecoderError> {
        let mut total = 0.0;
        for &word in sentence {
            total += self.loss(word)?;
            self.add_input(word)?;
        }
        Ok(total)
    }
}
