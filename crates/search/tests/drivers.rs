//! Whole-sentence drivers against decoders with fixed output scores.

use std::sync::Arc;

use deplm_core::{
    DecoderError, DependencyOutputModel, DependencyParams, KBestList, ModelConfig, OutputModel,
    StatePointer,
};
use deplm_nlp::{Action, TreeChecker, Vocab, Word};
use deplm_nn::{Linear, Mlp, RTensor};
use deplm_search::{
    beam_search, diagnose, format_kbest, greedy_decode, sample_sentence, sentence_loss,
    BeamConfig, SearchError,
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

// ============================================================================
// Fixtures
// ============================================================================

const STATE_DIM: usize = 4;
const HIDDEN_DIM: usize = 3;

const LEFT: Word = Word::Standard(0);
const RIGHT: Word = Word::Standard(1);
const W1: Word = Word::Standard(2);
const W2: Word = Word::Standard(3);

/// {</LEFT>=0, </RIGHT>=1, w1=2, w2=3}
fn vocab() -> Vocab {
    let mut vocab = Vocab::with_control_tokens();
    vocab.convert("w1").unwrap();
    vocab.convert("w2").unwrap();
    vocab
}

fn config() -> ModelConfig {
    ModelConfig {
        embedding_dim: 3,
        state_dim: STATE_DIM,
        hidden_dim: HIDDEN_DIM,
        layers: 1,
        seed: 21,
    }
}

/// Every state scores the vocabulary as `bias`.
fn biased_model(bias: Vec<f32>) -> DependencyOutputModel {
    let vocab_size = bias.len();
    let hidden = Linear::from_parts(
        RTensor::zeros(vec![HIDDEN_DIM, STATE_DIM]),
        RTensor::zeros(vec![HIDDEN_DIM]),
    )
    .unwrap();
    let output = Linear::from_parts(
        RTensor::zeros(vec![vocab_size, HIDDEN_DIM]),
        RTensor::vector(bias),
    )
    .unwrap();
    let params = DependencyParams::new(config(), &vocab())
        .unwrap()
        .with_scorer(Mlp::from_layers(hidden, output).unwrap())
        .unwrap();
    DependencyOutputModel::new(Arc::new(params)).unwrap()
}

/// `</RIGHT>` > `</LEFT>` > w1 > w2.
fn ordered_model() -> DependencyOutputModel {
    biased_model(vec![2.0, 3.0, 1.0, 0.0])
}

fn random_model(seed: u64) -> DependencyOutputModel {
    let params = DependencyParams::new(ModelConfig { seed, ..config() }, &vocab()).unwrap();
    DependencyOutputModel::new(Arc::new(params)).unwrap()
}

/// A decoder that refuses to read one word and to predict at one state.
struct Unreliable {
    inner: DependencyOutputModel,
    refused: Option<Word>,
    broken: Option<StatePointer>,
}

impl OutputModel for Unreliable {
    fn new_graph(&mut self) {
        self.inner.new_graph();
    }

    fn state_pointer(&self) -> StatePointer {
        self.inner.state_pointer()
    }

    fn state_at(&self, p: StatePointer) -> Result<RTensor, DecoderError> {
        self.inner.state_at(p)
    }

    fn add_input_at(&mut self, word: Word, p: StatePointer) -> Result<RTensor, DecoderError> {
        if Some(word) == self.refused {
            return Err(DecoderError::WordOutOfRange {
                id: word.id(),
                size: 0,
            });
        }
        self.inner.add_input_at(word, p)
    }

    fn predict_log_distribution_at(&self, p: StatePointer) -> Result<RTensor, DecoderError> {
        self.inner.predict_log_distribution_at(p)
    }

    fn legal_mask_at(&self, p: StatePointer) -> Result<Vec<bool>, DecoderError> {
        self.inner.legal_mask_at(p)
    }

    fn predict_kbest_at(&self, p: StatePointer, k: usize) -> Result<KBestList<Word>, DecoderError> {
        if Some(p) == self.broken {
            return Err(DecoderError::DegenerateDistribution { pointer: p });
        }
        self.inner.predict_kbest_at(p, k)
    }

    fn sample_at(
        &self,
        p: StatePointer,
        rng: &mut dyn RngCore,
    ) -> Result<(Word, f64), DecoderError> {
        self.inner.sample_at(p, rng)
    }

    fn loss_at(&self, p: StatePointer, reference: Word) -> Result<f64, DecoderError> {
        self.inner.loss_at(p, reference)
    }

    fn is_done_at(&self, p: StatePointer) -> Result<bool, DecoderError> {
        self.inner.is_done_at(p)
    }
}

fn log_prob(bias: &[f32], id: usize) -> f64 {
    let lse = bias.iter().map(|&b| f64::from(b).exp()).sum::<f64>().ln();
    f64::from(bias[id]) - lse
}

fn is_closed_tree(words: &[Word]) -> bool {
    let actions = words.iter().map(|w| match w.id() {
        0 => Action::CloseLeft,
        1 => Action::CloseRight,
        id => Action::Push(id),
    });
    TreeChecker::check(actions).is_ok()
}

// ============================================================================
// Beam search
// ============================================================================

#[test_log::test]
fn test_narrow_beam_matches_greedy() {
    let mut model = ordered_model();
    let beam = BeamConfig {
        kbest_size: 1,
        beam_size: 1,
        ..BeamConfig::default()
    };
    let kbest = beam_search(&mut model, &beam).unwrap();
    let greedy = greedy_decode(&mut model, 100).unwrap();

    let expected = vec![W1, LEFT, RIGHT, RIGHT];
    assert_eq!(kbest.len(), 1);
    assert_eq!(kbest.entries()[0].1, expected);
    assert_eq!(greedy.words, expected);
    assert!((kbest.entries()[0].0 - greedy.score).abs() < 1e-12);

    let bias = [2.0, 3.0, 1.0, 0.0];
    let score = log_prob(&bias, 2) + log_prob(&bias, 0) + 2.0 * log_prob(&bias, 1);
    assert!((greedy.score - score).abs() < 1e-4);
}

#[test]
fn test_wide_beam_keeps_best_first() {
    let mut model = ordered_model();
    let beam = BeamConfig {
        kbest_size: 3,
        beam_size: 5,
        max_length: 20,
        length_bonus: 0.0,
    };
    let kbest = beam_search(&mut model, &beam).unwrap();
    let greedy = greedy_decode(&mut model, 20).unwrap();

    assert_eq!(kbest.len(), 3);
    assert_eq!(kbest.entries()[0].1, greedy.words);
    let scores: Vec<f64> = kbest.entries().iter().map(|(s, _)| *s).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    for (_, sentence) in kbest.entries() {
        assert!(is_closed_tree(sentence));
    }
}

#[test]
fn test_length_bonus_added_per_open_step() {
    let mut model = ordered_model();
    let plain = BeamConfig {
        kbest_size: 1,
        beam_size: 1,
        ..BeamConfig::default()
    };
    let boosted = BeamConfig {
        length_bonus: 0.5,
        ..plain.clone()
    };
    let a = beam_search(&mut model, &plain).unwrap();
    let b = beam_search(&mut model, &boosted).unwrap();

    // three of the four words leave the sentence open
    assert_eq!(a.entries()[0].1, b.entries()[0].1);
    assert!((b.entries()[0].0 - a.entries()[0].0 - 1.5).abs() < 1e-9);
}

#[test]
fn test_unfinished_prefixes_returned_at_max_length() {
    let mut model = ordered_model();
    let beam = BeamConfig {
        kbest_size: 1,
        beam_size: 1,
        max_length: 2,
        length_bonus: 0.0,
    };
    let kbest = beam_search(&mut model, &beam).unwrap();
    assert_eq!(kbest.entries()[0].1, vec![W1, LEFT]);
}

#[test_log::test]
fn test_layer_stops_once_complete_list_cannot_be_beaten() {
    // [w1 </LEFT> </RIGHT> </RIGHT>] completes in layer 3; every prefix left
    // scores below it, so layers 3 and 4 stop at their first beaten prefix.
    let mut model = ordered_model();
    let beam = BeamConfig {
        kbest_size: 1,
        beam_size: 2,
        max_length: 20,
        length_bonus: 0.0,
    };
    let kbest = beam_search(&mut model, &beam).unwrap();

    assert_eq!(kbest.len(), 1);
    assert_eq!(kbest.entries()[0].1, vec![W1, LEFT, RIGHT, RIGHT]);
    // ROOT plus two words for each of the six expanded prefixes. Running
    // every layer to max_length would leave 79 states.
    assert_eq!(model.arena().len(), 13);
}

#[test_log::test]
fn test_layer_stops_once_next_list_cannot_be_beaten() {
    // w1 dominates, so after [w1] fills the next layer, [w2] is below its
    // worst entry and is never expanded.
    let bias = [0.0, 1.0, 2.0, -3.0];
    let mut model = biased_model(bias.to_vec());
    let beam = BeamConfig {
        kbest_size: 1,
        beam_size: 2,
        max_length: 8,
        length_bonus: 0.0,
    };
    let kbest = beam_search(&mut model, &beam).unwrap();

    assert_eq!(kbest.len(), 1);
    assert_eq!(kbest.entries()[0].1, vec![W1; 8]);
    assert!((kbest.entries()[0].0 - 8.0 * log_prob(&bias, 2)).abs() < 1e-4);
    // ROOT plus two words for each of 14 expanded prefixes; expanding [w2]
    // would add two more.
    assert_eq!(model.arena().len(), 29);
}

#[test_log::test]
fn test_fault_drops_only_that_hypothesis() {
    let mut model = Unreliable {
        inner: ordered_model(),
        refused: Some(W2),
        broken: None,
    };
    let beam = BeamConfig {
        kbest_size: 3,
        beam_size: 5,
        max_length: 20,
        length_bonus: 0.0,
    };
    let kbest = beam_search(&mut model, &beam).unwrap();

    assert_eq!(kbest.len(), 3);
    assert_eq!(kbest.entries()[0].1, vec![W1, LEFT, RIGHT, RIGHT]);
    for (_, sentence) in kbest.entries() {
        assert!(!sentence.contains(&W2));
        assert!(is_closed_tree(sentence));
    }
}

#[test]
fn test_fault_at_root_leaves_nothing_to_return() {
    let mut model = Unreliable {
        inner: ordered_model(),
        refused: None,
        broken: Some(StatePointer::ROOT),
    };
    let kbest = beam_search(&mut model, &BeamConfig::default()).unwrap();
    assert!(kbest.is_empty());
}

#[test]
fn test_beam_rejects_bad_config() {
    let mut model = ordered_model();
    let beam = BeamConfig {
        kbest_size: 4,
        beam_size: 2,
        ..BeamConfig::default()
    };
    assert!(matches!(
        beam_search(&mut model, &beam),
        Err(SearchError::InvalidConfig { .. })
    ));
}

#[test]
fn test_kbest_output_lines() {
    let mut model = ordered_model();
    let kbest = beam_search(&mut model, &BeamConfig::default()).unwrap();
    let lines = format_kbest(0, &kbest, &vocab()).unwrap();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("0 ||| w1 </LEFT> </RIGHT> </RIGHT> ||| -"));
}

// ============================================================================
// Sampling
// ============================================================================

#[test]
fn test_sampling_with_a_dominant_action_follows_greedy() {
    // Each legal set has one action that takes all the mass in f32.
    let mut model = biased_model(vec![60.0, 90.0, 30.0, -90.0]);
    let greedy = greedy_decode(&mut model, 50).unwrap();
    let mut rng = StdRng::seed_from_u64(4);
    let sampled = sample_sentence(&mut model, 50, &mut rng).unwrap();

    assert_eq!(sampled.words, vec![W1, LEFT, RIGHT, RIGHT]);
    assert_eq!(sampled.words, greedy.words);
    assert!(sampled.score.abs() < 1e-6);
}

#[test]
fn test_sampling_is_reproducible() {
    let mut model = random_model(5);
    let mut draw = |seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        sample_sentence(&mut model, 30, &mut rng).unwrap()
    };
    let first = draw(17);
    let second = draw(17);
    assert_eq!(first, second);
    assert!(first.score <= 0.0);
    assert!(!first.words.is_empty() && first.words.len() <= 30);
}

#[test]
fn test_samples_are_well_formed_prefixes() {
    let mut model = random_model(6);
    let mut rng = StdRng::seed_from_u64(8);
    for _ in 0..10 {
        let sample = sample_sentence(&mut model, 40, &mut rng).unwrap();
        let mut checker = TreeChecker::new();
        for word in &sample.words {
            let action = match word.id() {
                0 => Action::CloseLeft,
                1 => Action::CloseRight,
                id => Action::Push(id),
            };
            checker.apply(action).unwrap();
        }
        if sample.words.len() < 40 {
            assert!(checker.is_complete());
        }
    }
}

// ============================================================================
// Scoring
// ============================================================================

#[test]
fn test_sentence_loss() {
    let bias = [2.0, 3.0, 1.0, 0.0];
    let mut model = ordered_model();
    let loss = sentence_loss(&mut model, &[W1, LEFT, RIGHT, RIGHT]).unwrap();
    let expected = -(log_prob(&bias, 2) + log_prob(&bias, 0) + 2.0 * log_prob(&bias, 1));
    assert!((loss - expected).abs() < 1e-4);

    // a second call starts from a fresh graph
    let again = sentence_loss(&mut model, &[W1, LEFT, RIGHT, RIGHT]).unwrap();
    assert!((loss - again).abs() < 1e-12);
}

#[test]
fn test_sentence_loss_rejects_malformed() {
    let mut model = ordered_model();
    let result = sentence_loss(&mut model, &[RIGHT]);
    assert!(matches!(
        result,
        Err(SearchError::Decoder(DecoderError::IllegalAction { .. }))
    ));
}

#[test]
fn test_diagnose_reports_each_token() {
    let mut model = ordered_model();
    let report = diagnose(&mut model, &[W1, LEFT, RIGHT, RIGHT]).unwrap();

    assert_eq!(report.len(), 4);
    for (i, token) in report.iter().enumerate() {
        assert_eq!(token.position, i);
        assert!(token.legal);
        assert_eq!(token.rank, 1);
        assert_eq!(token.best.map(|(w, _)| w), Some(token.word));
        assert_eq!(token.done, i == 3);
    }
}

#[test]
fn test_diagnose_ranks_worse_choices() {
    let mut model = ordered_model();
    let report = diagnose(&mut model, &[W2, LEFT, RIGHT, RIGHT]).unwrap();
    assert_eq!(report[0].rank, 2);
    assert_eq!(report[0].best.map(|(w, _)| w), Some(W1));
}
