//! # NN - Forward Numerics for the Dependency Decoder
//!
//! The learned collaborators the decoder drives, each behind a small
//! capability trait so the decoder never depends on a concrete layer:
//!
//! - [`tensor`]: dense runtime tensors ([`RTensor`]) and the vector ops the
//!   decoder needs (`matvec`, `concat`, `softmax`, `log_softmax`)
//! - [`linear`]: [`Linear`] layers and the [`Mlp`] [`Scorer`]
//! - [`embed`]: the [`Embedder`] capability and a lookup table
//! - [`gru`]: multi-layer GRU cells
//! - [`encoder`]: the [`SequenceEncoder`] capability: an append-only tape of
//!   recurrent states addressed by [`EncoderPointer`]
//!
//! Everything here is forward-only. Parameters derive `serde` so a trained
//! model can be stored and reloaded by the caller.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rand::{rngs::StdRng, SeedableRng};
//! use deplm_nn::{EncoderPointer, GruEncoder, GruSequence, RTensor, SequenceEncoder};
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let gru = Arc::new(GruEncoder::new(1, 2, 2, &mut rng).unwrap());
//! let mut tape = GruSequence::new(gru, &RTensor::zeros(vec![2])).unwrap();
//!
//! let (p, h) = tape.step(EncoderPointer::ROOT, &RTensor::vector(vec![1.0, 0.0])).unwrap();
//! assert_eq!(h.size(), 2);
//! assert_eq!(tape.head_of(p).unwrap(), EncoderPointer::ROOT);
//! ```

pub mod embed;
pub mod encoder;
mod error;
pub mod gru;
pub mod linear;
pub mod tensor;

pub use embed::{Embedder, StandardEmbedder};
pub use encoder::{EncoderPointer, GruSequence, SequenceEncoder};
pub use error::NnError;
pub use gru::{GruCell, GruEncoder};
pub use linear::{Linear, Mlp, Scorer};
pub use tensor::RTensor;
