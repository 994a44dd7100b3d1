//! Scoring observed sentences.

use deplm_core::OutputModel;
use deplm_nlp::Word;

use crate::error::SearchError;

/// Negative log-likelihood of an observed sentence, from a fresh graph.
pub fn sentence_loss<M: OutputModel + ?Sized>(
    model: &mut M,
    sentence: &[Word],
) -> Result<f64, SearchError> {
    model.new_graph();
    Ok(model.build_graph(sentence)?)
}

/// How the model saw one observed word.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenDiagnostic {
    /// Position in the sentence.
    pub position: usize,
    /// The observed word.
    pub word: Word,
    /// Its log-probability before masking.
    pub log_prob: f64,
    /// Whether the legality masks allowed it.
    pub legal: bool,
    /// 1-based rank among legal words; ties share the better rank.
    pub rank: usize,
    /// The most probable legal word and its log-probability.
    pub best: Option<(Word, f64)>,
    /// Whether the sentence was closed after this word.
    pub done: bool,
}

/// Walk a sentence and report, per word, how it ranked at its position.
pub fn diagnose<M: OutputModel + ?Sized>(
    model: &mut M,
    sentence: &[Word],
) -> Result<Vec<TokenDiagnostic>, SearchError> {
    model.new_graph();
    let mut report = Vec::with_capacity(sentence.len());

    for (position, &word) in sentence.iter().enumerate() {
        let log_probs = model.predict_log_distribution()?;
        let mask = model.legal_mask()?;
        let best = model.predict_kbest(1)?.entries().first().map(|&(s, w)| (w, s));
        let log_prob = f64::from(log_probs.data.get(word.id()).copied().unwrap_or(f32::NEG_INFINITY));
        let rank = 1 + log_probs
            .data
            .iter()
            .zip(&mask)
            .filter(|&(&lp, &legal)| legal && f64::from(lp) > log_prob)
            .count();

        model.add_input(word)?;
        report.push(TokenDiagnostic {
            position,
            word,
            log_prob,
            legal: mask.get(word.id()).copied().unwrap_or(false),
            rank,
            best,
            done: model.is_done()?,
        });
    }
    Ok(report)
}
