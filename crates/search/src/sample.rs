//! Single-path decoding: ancestral sampling and greedy search.

use deplm_core::{DecoderError, OutputModel};
use deplm_nlp::Sentence;
use rand::RngCore;

use crate::error::SearchError;

/// A decoded sentence and its total log-probability.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSentence {
    pub words: Sentence,
    pub score: f64,
}

/// Draw one sentence, stopping once it closes or after `max_length` words.
///
/// The score sums each word's log-probability after illegal actions were
/// masked out.
pub fn sample_sentence<M: OutputModel + ?Sized>(
    model: &mut M,
    max_length: usize,
    rng: &mut dyn RngCore,
) -> Result<ScoredSentence, SearchError> {
    model.new_graph();
    let mut words = Sentence::new();
    let mut score = 0.0;
    for _ in 0..max_length {
        let (word, log_prob) = model.sample(rng)?;
        model.add_input(word)?;
        words.push(word);
        score += log_prob;
        if model.is_done()? {
            break;
        }
    }
    Ok(ScoredSentence { words, score })
}

/// Repeatedly take the most probable legal word.
pub fn greedy_decode<M: OutputModel + ?Sized>(
    model: &mut M,
    max_length: usize,
) -> Result<ScoredSentence, SearchError> {
    model.new_graph();
    let mut words = Sentence::new();
    let mut score = 0.0;
    for _ in 0..max_length {
        let p = model.state_pointer();
        let best = model.predict_kbest_at(p, 1)?;
        let &(log_prob, word) = best
            .entries()
            .first()
            .ok_or(DecoderError::DegenerateDistribution { pointer: p })?;
        model.add_input_at(word, p)?;
        words.push(word);
        score += log_prob;
        if model.is_done()? {
            break;
        }
    }
    Ok(ScoredSentence { words, score })
}
