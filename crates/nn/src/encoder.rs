//! # Pointer-Addressed Sequence Encoders
//!
//! A sequence encoder keeps an append-only tape of hidden states. Every state
//! is named by an [`EncoderPointer`] and remembers the pointer it was grown
//! from, so the tape is a tree rooted at the learned initial state:
//!
//! ```text
//!            ROOT
//!           /    \
//!         #0      #2        step(ROOT, a) = #0, step(#0, b) = #1,
//!          |                step(ROOT, c) = #2
//!         #1
//! ```
//!
//! Any existing pointer can be extended again, which is what lets many
//! decoding hypotheses share one history without copying it.

use std::fmt;
use std::sync::Arc;

use crate::error::NnError;
use crate::gru::GruEncoder;
use crate::tensor::RTensor;

/// Handle to one state on a sequence tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncoderPointer(Option<usize>);

impl EncoderPointer {
    /// The initial state (no parent).
    pub const ROOT: EncoderPointer = EncoderPointer(None);

    /// Pointer to tape node `index`.
    pub fn node(index: usize) -> Self {
        Self(Some(index))
    }

    /// Whether this is the initial state.
    pub fn is_root(&self) -> bool {
        self.0.is_none()
    }

    /// Tape index, `None` for the root.
    pub fn index(&self) -> Option<usize> {
        self.0
    }
}

impl fmt::Display for EncoderPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(i) => write!(f, "#{}", i),
            None => write!(f, "ROOT"),
        }
    }
}

/// A recurrent state tracker whose states are addressed by pointer.
pub trait SequenceEncoder {
    /// Pointer to the initial state.
    fn root(&self) -> EncoderPointer {
        EncoderPointer::ROOT
    }

    /// Grow a new state from `from` by reading `input`.
    ///
    /// Returns the new pointer and the last layer's hidden output.
    fn step(
        &mut self,
        from: EncoderPointer,
        input: &RTensor,
    ) -> Result<(EncoderPointer, RTensor), NnError>;

    /// The pointer `p` was grown from.
    fn head_of(&self, p: EncoderPointer) -> Result<EncoderPointer, NnError>;

    /// Last layer's hidden output at `p`.
    fn hidden(&self, p: EncoderPointer) -> Result<RTensor, NnError>;

    /// Drop every non-root state.
    fn reset(&mut self);

    /// Number of non-root states on the tape.
    fn len(&self) -> usize;

    /// Whether only the root state exists.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct TapeNode {
    parent: EncoderPointer,
    layers: Vec<RTensor>,
}

/// A [`SequenceEncoder`] over a shared multi-layer GRU.
///
/// The GRU weights are read-only and shared through an `Arc`; the tape is
/// private to one decoding run.
#[derive(Debug, Clone)]
pub struct GruSequence {
    encoder: Arc<GruEncoder>,
    initial: Vec<RTensor>,
    nodes: Vec<TapeNode>,
}

impl GruSequence {
    /// Start an empty tape.
    ///
    /// `initial` holds one learned chunk per layer; the root hidden state of
    /// each layer is its `tanh`.
    pub fn new(encoder: Arc<GruEncoder>, initial: &RTensor) -> Result<Self, NnError> {
        let layers = encoder.layer_count();
        let expected = layers * encoder.hidden_dim();
        if initial.size() != expected {
            return Err(NnError::DimensionMismatch {
                context: "gru initial state",
                expected,
                got: initial.size(),
            });
        }
        let initial = (0..layers).map(|i| initial.chunk(layers, i).tanh()).collect();
        Ok(Self {
            encoder,
            initial,
            nodes: Vec::new(),
        })
    }

    fn layers_at(&self, p: EncoderPointer) -> Result<&[RTensor], NnError> {
        match p.index() {
            None => Ok(&self.initial),
            Some(i) => self
                .nodes
                .get(i)
                .map(|node| node.layers.as_slice())
                .ok_or(NnError::InvalidPointer {
                    index: i,
                    len: self.nodes.len(),
                }),
        }
    }
}

impl SequenceEncoder for GruSequence {
    fn step(
        &mut self,
        from: EncoderPointer,
        input: &RTensor,
    ) -> Result<(EncoderPointer, RTensor), NnError> {
        let layers = self.encoder.step(self.layers_at(from)?, input)?;
        let output = layers[layers.len() - 1].clone();
        self.nodes.push(TapeNode {
            parent: from,
            layers,
        });
        Ok((EncoderPointer::node(self.nodes.len() - 1), output))
    }

    fn head_of(&self, p: EncoderPointer) -> Result<EncoderPointer, NnError> {
        let i = p.index().ok_or(NnError::RootHasNoHead)?;
        self.nodes
            .get(i)
            .map(|node| node.parent)
            .ok_or(NnError::InvalidPointer {
                index: i,
                len: self.nodes.len(),
            })
    }

    fn hidden(&self, p: EncoderPointer) -> Result<RTensor, NnError> {
        let layers = self.layers_at(p)?;
        Ok(layers[layers.len() - 1].clone())
    }

    fn reset(&mut self) {
        self.nodes.clear();
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tape() -> GruSequence {
        let mut rng = StdRng::seed_from_u64(11);
        let encoder = Arc::new(GruEncoder::new(2, 3, 3, &mut rng).unwrap());
        let init = RTensor::randn(vec![6], 0.1, &mut rng);
        GruSequence::new(encoder, &init).unwrap()
    }

    #[test]
    fn test_step_links_parent() {
        let mut seq = tape();
        let x = RTensor::vector(vec![0.1, 0.2, 0.3]);
        let (a, _) = seq.step(EncoderPointer::ROOT, &x).unwrap();
        let (b, out) = seq.step(a, &x).unwrap();

        assert_eq!(seq.len(), 2);
        assert_eq!(seq.head_of(b).unwrap(), a);
        assert_eq!(seq.head_of(a).unwrap(), EncoderPointer::ROOT);
        assert_eq!(seq.hidden(b).unwrap(), out);
    }

    #[test]
    fn test_branching_from_same_pointer() {
        let mut seq = tape();
        let x = RTensor::vector(vec![0.1, 0.2, 0.3]);
        let y = RTensor::vector(vec![-0.3, 0.0, 0.9]);
        let (a, _) = seq.step(EncoderPointer::ROOT, &x).unwrap();
        let (b, hb) = seq.step(a, &x).unwrap();
        let (c, hc) = seq.step(a, &y).unwrap();

        assert_ne!(b, c);
        assert_eq!(seq.head_of(b).unwrap(), seq.head_of(c).unwrap());
        assert_ne!(hb, hc);
    }

    #[test]
    fn test_root_has_no_head() {
        let seq = tape();
        assert_eq!(seq.head_of(EncoderPointer::ROOT), Err(NnError::RootHasNoHead));
        assert_eq!(seq.hidden(EncoderPointer::ROOT).unwrap().size(), 3);
    }

    #[test]
    fn test_invalid_pointer() {
        let seq = tape();
        assert!(matches!(
            seq.hidden(EncoderPointer::node(4)),
            Err(NnError::InvalidPointer { index: 4, len: 0 })
        ));
    }

    #[test]
    fn test_reset_clears_tape() {
        let mut seq = tape();
        let x = RTensor::vector(vec![0.1, 0.2, 0.3]);
        seq.step(EncoderPointer::ROOT, &x).unwrap();
        seq.reset();
        assert!(seq.is_empty());
    }

    #[test]
    fn test_initial_state_width_checked() {
        let mut rng = StdRng::seed_from_u64(2);
        let encoder = Arc::new(GruEncoder::new(2, 3, 3, &mut rng).unwrap());
        let result = GruSequence::new(encoder, &RTensor::zeros(vec![5]));
        assert!(matches!(result, Err(NnError::DimensionMismatch { .. })));
    }
}
