//! Word embeddings.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::NnError;
use crate::tensor::RTensor;

/// Produces a dense vector for a word id.
pub trait Embedder {
    /// Width of produced vectors.
    fn dim(&self) -> usize;

    /// Embed one word id.
    fn embed(&self, id: usize) -> Result<RTensor, NnError>;
}

/// A lookup table with one learned row per vocabulary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredEmbedder")]
pub struct StandardEmbedder {
    /// (vocab_size, dim)
    table: RTensor,
}

#[derive(Deserialize)]
struct StoredEmbedder {
    table: RTensor,
}

impl TryFrom<StoredEmbedder> for StandardEmbedder {
    type Error = NnError;

    fn try_from(stored: StoredEmbedder) -> Result<Self, NnError> {
        StandardEmbedder::from_table(stored.table)
    }
}

impl StandardEmbedder {
    /// Create a randomly initialised table.
    pub fn new<R: Rng + ?Sized>(vocab_size: usize, dim: usize, rng: &mut R) -> Self {
        Self {
            table: RTensor::randn(vec![vocab_size, dim], 1.0 / (dim as f32).sqrt(), rng),
        }
    }

    /// Wrap an explicit `(vocab_size, dim)` table.
    pub fn from_table(table: RTensor) -> Result<Self, NnError> {
        if table.shape.len() != 2 {
            return Err(NnError::InvalidConfig {
                reason: format!("embedding table must be 2D, got shape {:?}", table.shape),
            });
        }
        Ok(Self { table })
    }

    /// Number of rows in the table.
    pub fn vocab_size(&self) -> usize {
        self.table.rows()
    }

    /// Number of scalar parameters.
    pub fn parameter_count(&self) -> usize {
        self.table.size()
    }
}

impl Embedder for StandardEmbedder {
    fn dim(&self) -> usize {
        self.table.cols()
    }

    fn embed(&self, id: usize) -> Result<RTensor, NnError> {
        if id >= self.vocab_size() {
            return Err(NnError::IndexOutOfRange {
                index: id,
                size: self.vocab_size(),
            });
        }
        Ok(self.table.row(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_embed_returns_row() {
        let table = RTensor::matrix(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let embedder = StandardEmbedder::from_table(table).unwrap();
        assert_eq!(embedder.dim(), 2);
        assert_eq!(embedder.embed(1).unwrap().data, vec![3.0, 4.0]);
    }

    #[test]
    fn test_deserialize_rejects_flat_table() {
        let err = serde_json::from_str::<StandardEmbedder>(r#"{"table":{"shape":[4],"data":[0.0,0.0,0.0,0.0]}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("embedding table must be 2D"));
    }

    #[test]
    fn test_embed_out_of_range() {
        let embedder = StandardEmbedder::new(4, 3, &mut StdRng::seed_from_u64(0));
        assert_eq!(
            embedder.embed(4),
            Err(NnError::IndexOutOfRange { index: 4, size: 4 })
        );
    }
}
