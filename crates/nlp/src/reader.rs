//! Corpus reading.
//!
//! One sentence per line, tokens separated by whitespace, control tokens
//! written inline. Blank lines are skipped. Every line is shape-checked with
//! [`TreeChecker`] before any of its words enter the vocabulary, so a
//! rejected line never grows an unfrozen vocabulary.

use std::fs;
use std::path::Path;

use crate::tree::TreeChecker;
use crate::vocab::Vocab;
use crate::word::{Action, Sentence, Word, CLOSE_LEFT_TOKEN, CLOSE_RIGHT_TOKEN};
use crate::NlpError;

fn action_of(token: &str) -> Action {
    match token {
        CLOSE_LEFT_TOKEN => Action::CloseLeft,
        CLOSE_RIGHT_TOKEN => Action::CloseRight,
        // Ordinary words all behave alike for shape checking.
        _ => Action::Push(0),
    }
}

/// Parse and validate one line.
///
/// # Errors
///
/// [`NlpError::EmptySentence`] for a line without tokens,
/// [`NlpError::MalformedTree`] for a bad `</LEFT>`/`</RIGHT>` nesting, or
/// [`NlpError::UnknownWord`] from a frozen vocabulary.
pub fn parse_sentence(line: &str, vocab: &mut Vocab) -> Result<Sentence, NlpError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(NlpError::EmptySentence);
    }
    TreeChecker::check(tokens.iter().map(|t| action_of(t)))?;
    tokens
        .into_iter()
        .map(|t| vocab.convert(t).map(Word::from))
        .collect()
}

/// Parse every non-blank line of `text`.
///
/// Each entry is either a sentence or a [`NlpError::BadLine`] naming the
/// 1-based line it came from; one bad line does not stop the rest.
pub fn parse_text(text: &str, vocab: &mut Vocab) -> Vec<Result<Sentence, NlpError>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            parse_sentence(line, vocab).map_err(|e| NlpError::BadLine {
                line: i + 1,
                source: Box::new(e),
            })
        })
        .collect()
}

/// Read a corpus file; see [`parse_text`].
///
/// # Errors
///
/// Returns [`NlpError::Io`] if the file cannot be read.
pub fn read_text(
    path: impl AsRef<Path>,
    vocab: &mut Vocab,
) -> Result<Vec<Result<Sentence, NlpError>>, NlpError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| NlpError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(parse_text(&text, vocab))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sentence() {
        let mut vocab = Vocab::with_control_tokens();
        let sentence = parse_sentence("dog </LEFT> </RIGHT> </RIGHT>", &mut vocab).unwrap();
        let ids: Vec<_> = sentence.iter().map(Word::id).collect();
        assert_eq!(ids, vec![2, 0, 1, 1]);
    }

    #[test]
    fn test_malformed_line_leaves_vocab_alone() {
        let mut vocab = Vocab::with_control_tokens();
        let result = parse_sentence("dog </RIGHT>", &mut vocab);
        assert!(matches!(result, Err(NlpError::MalformedTree { position: 1, .. })));
        assert_eq!(vocab.len(), 2);
    }

    #[test]
    fn test_empty_sentence() {
        let mut vocab = Vocab::new();
        assert_eq!(parse_sentence("   ", &mut vocab), Err(NlpError::EmptySentence));
    }

    #[test]
    fn test_parse_text_reports_line_numbers() {
        let mut vocab = Vocab::with_control_tokens();
        let text = "a </LEFT> </RIGHT> </RIGHT>\n\nb </LEFT> </LEFT>\nc </LEFT> </RIGHT> </RIGHT>\n";
        let parsed = parse_text(text, &mut vocab);

        assert_eq!(parsed.len(), 3);
        assert!(parsed[0].is_ok());
        match &parsed[1] {
            Err(NlpError::BadLine { line, source }) => {
                assert_eq!(*line, 3);
                assert!(matches!(**source, NlpError::MalformedTree { .. }));
            }
            other => panic!("expected BadLine, got {:?}", other),
        }
        assert!(parsed[2].is_ok());
        assert_eq!(vocab.lookup("b"), None);
    }

    #[test]
    fn test_frozen_vocab_unknown_word() {
        let mut vocab = Vocab::with_control_tokens();
        vocab.freeze();
        let result = parse_sentence("cat </LEFT> </RIGHT> </RIGHT>", &mut vocab);
        assert!(matches!(result, Err(NlpError::UnknownWord { .. })));
    }

    #[test]
    fn test_read_missing_file() {
        let mut vocab = Vocab::new();
        let result = read_text("/nonexistent/corpus.txt", &mut vocab);
        assert!(matches!(result, Err(NlpError::Io { .. })));
    }
}
