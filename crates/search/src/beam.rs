//! Beam search over whole sentences.
//!
//! ```text
//!   layer 0        layer 1            layer 2
//!   ROOT ──┬──▶ [dog]      ──┬──▶ [dog </LEFT>]   ...
//!          │                 └──▶ [dog dog]
//!          └──▶ [cat]      ────▶ [cat </LEFT>]
//!
//!   each layer keeps the `beam_size` best open prefixes; prefixes that
//!   close the sentence move to the `kbest_size` complete list
//! ```
//!
//! Every hypothesis is a [`StatePointer`] into one shared decoder graph, so
//! extending a prefix never replays it.

use deplm_core::{DecoderError, KBestList, OutputModel, StatePointer};
use deplm_nlp::{Sentence, Word};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Beam search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamConfig {
    /// Number of complete sentences to return.
    pub kbest_size: usize,
    /// Open prefixes kept per layer.
    pub beam_size: usize,
    /// Layers to run before giving up on closing a sentence.
    pub max_length: usize,
    /// Added to a prefix's score for every word that does not end it.
    pub length_bonus: f64,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            kbest_size: 1,
            beam_size: 10,
            max_length: 100,
            length_bonus: 0.0,
        }
    }
}

impl BeamConfig {
    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// [`SearchError::InvalidConfig`] if `kbest_size` is zero or larger
    /// than `beam_size`.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.kbest_size == 0 {
            return Err(SearchError::InvalidConfig {
                reason: "kbest_size must be positive".to_string(),
            });
        }
        if self.beam_size < self.kbest_size {
            return Err(SearchError::InvalidConfig {
                reason: format!(
                    "beam_size ({}) must be at least kbest_size ({})",
                    self.beam_size, self.kbest_size
                ),
            });
        }
        Ok(())
    }
}

/// Find the best-scoring sentences under `model`.
///
/// Starts a new graph. Within a layer, prefixes are expanded best first and
/// the layer stops at the first prefix that can no longer beat the worst
/// retained complete sentence, or the worst retained next-layer prefix,
/// even with `length_bonus` added. Prefixes still open after `max_length`
/// layers are returned alongside the complete ones.
///
/// A decoder fault while extending a prefix drops only that hypothesis.
pub fn beam_search<M: OutputModel + ?Sized>(
    model: &mut M,
    config: &BeamConfig,
) -> Result<KBestList<Sentence>, SearchError> {
    config.validate()?;
    model.new_graph();

    let k = config.kbest_size;
    let bonus = config.length_bonus;
    let mut complete: KBestList<Sentence> = KBestList::new(k);
    let mut open: KBestList<(Sentence, StatePointer)> = KBestList::new(config.beam_size);
    open.add(0.0, (Sentence::new(), model.state_pointer()));

    for length in 0..config.max_length {
        if open.is_empty() {
            break;
        }
        let mut next = KBestList::new(config.beam_size);

        for (score, (prefix, p)) in open.entries() {
            let score = *score;
            let beaten = |list_len: usize, worst: Option<f64>| {
                list_len >= k && worst.map_or(false, |w| score < w - bonus)
            };
            if beaten(complete.len(), complete.worst()) || beaten(next.len(), next.worst()) {
                debug!("layer {}: stopping at prefix score {:.4}", length, score);
                break;
            }

            let words = match model.predict_kbest_at(*p, config.beam_size) {
                Ok(words) => words,
                Err(e) => {
                    warn!("layer {}: dropping prefix at state {}: {}", length, p, e);
                    continue;
                }
            };
            for &(word_score, word) in words.entries() {
                let (q, done) = match extend(model, word, *p) {
                    Ok(extended) => extended,
                    Err(e) => {
                        warn!("layer {}: dropping word {} after state {}: {}", length, word.id(), p, e);
                        continue;
                    }
                };
                let mut extended = prefix.clone();
                extended.push(word);

                let extended_score = score + word_score;
                if done {
                    complete.add(extended_score, extended);
                } else {
                    next.add(extended_score + bonus, (extended, q));
                }
            }
        }

        debug!(
            "layer {}: {} open, {} complete",
            length,
            next.len(),
            complete.len()
        );
        open = next;
    }

    for (score, (prefix, _)) in open.into_entries() {
        complete.add(score, prefix);
    }
    Ok(complete)
}

/// Read `word` at `p`; returns the new state and whether it closes the sentence.
fn extend<M: OutputModel + ?Sized>(
    model: &mut M,
    word: Word,
    p: StatePointer,
) -> Result<(StatePointer, bool), DecoderError> {
    model.add_input_at(word, p)?;
    let q = model.state_pointer();
    Ok((q, model.is_done_at(q)?))
}
