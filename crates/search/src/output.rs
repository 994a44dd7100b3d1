//! Text output formats.
//!
//! | producer | line |
//! |----------|------|
//! | k-best list | `<sentence index> ||| <tokens> ||| <score>` |
//! | sample | `<score> ||| <tokens>` |
//! | loss | `<sentence index> ||| <loss>` |
//! | diagnostic | `<position>\t<word>\t<log prob>\t<rank>\t<best>` |

use deplm_core::KBestList;
use deplm_nlp::{Sentence, Vocab, Word};

use crate::error::SearchError;
use crate::sample::ScoredSentence;
use crate::score::TokenDiagnostic;

fn render(vocab: &Vocab, words: &[Word]) -> Result<String, SearchError> {
    Ok(vocab.render(words.iter().map(Word::id))?)
}

/// One line per hypothesis, best first.
pub fn format_kbest(
    index: usize,
    kbest: &KBestList<Sentence>,
    vocab: &Vocab,
) -> Result<Vec<String>, SearchError> {
    kbest
        .entries()
        .iter()
        .map(|(score, sentence)| -> Result<String, SearchError> {
            Ok(format!("{} ||| {} ||| {}", index, render(vocab, sentence)?, score))
        })
        .collect()
}

pub fn format_sample(sample: &ScoredSentence, vocab: &Vocab) -> Result<String, SearchError> {
    Ok(format!("{} ||| {}", sample.score, render(vocab, &sample.words)?))
}

pub fn format_loss(index: usize, loss: f64) -> String {
    format!("{} ||| {}", index, loss)
}

/// One tab-separated line; illegal words are flagged with `!`.
pub fn format_diagnostic(token: &TokenDiagnostic, vocab: &Vocab) -> Result<String, SearchError> {
    let word = vocab.word(token.word.id())?;
    let flag = if token.legal { "" } else { "!" };
    let best = match token.best {
        Some((w, score)) => format!("{} ({:.4})", vocab.word(w.id())?, score),
        None => "-".to_string(),
    };
    let done = if token.done { "\tdone" } else { "" };
    Ok(format!(
        "{}\t{}{}\t{:.4}\t{}\t{}{}",
        token.position, flag, word, token.log_prob, token.rank, best, done
    ))
}
