//! # Runtime Tensors
//!
//! A small dense tensor used by every layer in this crate. Shapes are dynamic
//! (`Vec<usize>`) and data is stored flat in row-major order.
//!
//! Only forward evaluation is supported. The decoder reads the values of each
//! expression immediately, so there is no graph to record.
//!
//! | Op | Meaning |
//! |----|---------|
//! | `matvec` | `W @ x` for a `[m, n]` matrix and an `[n]` vector |
//! | `concat` | `[a; b]` for vectors |
//! | `chunk` | the `i`-th equal slice of a vector |
//! | `softmax` / `log_softmax` | normalised (log-)distribution over a vector |

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::NnError;

/// A runtime tensor with dynamic dimensions.
///
/// Deserialisation goes through [`RTensor::from_data`], so a stored tensor
/// whose data does not fill its shape is rejected.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredTensor")]
pub struct RTensor {
    /// Shape of the tensor
    pub shape: Vec<usize>,
    /// Flattened data in row-major order
    pub data: Vec<f32>,
}

#[derive(Deserialize)]
struct StoredTensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl TryFrom<StoredTensor> for RTensor {
    type Error = NnError;

    fn try_from(stored: StoredTensor) -> Result<Self, NnError> {
        RTensor::from_data(stored.shape, stored.data)
    }
}

impl RTensor {
    /// Create a tensor filled with zeros.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let size: usize = shape.iter().product();
        Self {
            shape,
            data: vec![0.0; size],
        }
    }

    /// Create a tensor from data with given shape.
    ///
    /// # Errors
    ///
    /// [`NnError::DimensionMismatch`] unless `data` has exactly one value per
    /// element of `shape`.
    pub fn from_data(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, NnError> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(NnError::DimensionMismatch {
                context: "tensor data",
                expected,
                got: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Create a 1D vector tensor.
    pub fn vector(data: Vec<f32>) -> Self {
        let len = data.len();
        Self {
            shape: vec![len],
            data,
        }
    }

    /// Create a 2D matrix tensor.
    pub fn matrix(rows: usize, cols: usize, data: Vec<f32>) -> Self {
        assert_eq!(data.len(), rows * cols);
        Self {
            shape: vec![rows, cols],
            data,
        }
    }

    /// Create a tensor with values drawn from N(0, scale²).
    ///
    /// Box-Muller over the caller's generator, so a seeded `StdRng` gives
    /// reproducible parameters.
    pub fn randn<R: Rng + ?Sized>(shape: Vec<usize>, scale: f32, rng: &mut R) -> Self {
        let size: usize = shape.iter().product();
        let mut data = Vec::with_capacity(size);
        for _ in 0..size {
            // Avoid log(0)
            let u1: f32 = rng.gen::<f32>().max(1e-10);
            let u2: f32 = rng.gen();
            let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
            data.push(z * scale);
        }
        Self { shape, data }
    }

    /// Total number of elements.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Number of rows of a 2D tensor (length of a vector).
    pub fn rows(&self) -> usize {
        self.shape.first().copied().unwrap_or(1)
    }

    /// Number of columns of a 2D tensor (1 for vectors).
    pub fn cols(&self) -> usize {
        self.shape.get(1).copied().unwrap_or(1)
    }

    /// Element-wise addition.
    pub fn add(&self, other: &RTensor) -> RTensor {
        assert_eq!(self.shape, other.shape, "Shape mismatch for add");
        self.zip_with(other, |a, b| a + b)
    }

    /// Element-wise multiplication.
    pub fn mul(&self, other: &RTensor) -> RTensor {
        assert_eq!(self.shape, other.shape, "Shape mismatch for mul");
        self.zip_with(other, |a, b| a * b)
    }

    fn zip_with(&self, other: &RTensor, f: impl Fn(f32, f32) -> f32) -> RTensor {
        let data: Vec<f32> = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        RTensor {
            shape: self.shape.clone(),
            data,
        }
    }

    /// Apply a function to each element.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> RTensor {
        let data: Vec<f32> = self.data.iter().map(|&x| f(x)).collect();
        RTensor {
            shape: self.shape.clone(),
            data,
        }
    }

    /// Element-wise hyperbolic tangent.
    pub fn tanh(&self) -> RTensor {
        self.map(f32::tanh)
    }

    /// Element-wise logistic sigmoid.
    pub fn sigmoid(&self) -> RTensor {
        self.map(|x| 1.0 / (1.0 + (-x).exp()))
    }

    /// Matrix-vector product: `[m, n] @ [n] -> [m]`.
    pub fn matvec(&self, x: &RTensor) -> RTensor {
        assert_eq!(self.shape.len(), 2, "matvec requires 2D matrix");
        let m = self.shape[0];
        let n = self.shape[1];
        assert_eq!(x.size(), n, "Inner dimensions must match: {} vs {}", n, x.size());

        let data: Vec<f32> = (0..m)
            .map(|i| {
                self.data[i * n..(i + 1) * n]
                    .iter()
                    .zip(x.data.iter())
                    .map(|(w, v)| w * v)
                    .sum()
            })
            .collect();
        RTensor::vector(data)
    }

    /// Row `i` of a 2D tensor as a vector.
    pub fn row(&self, i: usize) -> RTensor {
        assert_eq!(self.shape.len(), 2, "row requires 2D tensor");
        let n = self.shape[1];
        RTensor::vector(self.data[i * n..(i + 1) * n].to_vec())
    }

    /// Concatenate vectors end to end.
    pub fn concat(parts: &[&RTensor]) -> RTensor {
        let data: Vec<f32> = parts.iter().flat_map(|t| t.data.iter().copied()).collect();
        RTensor::vector(data)
    }

    /// The `index`-th of `count` equal slices of a vector.
    pub fn chunk(&self, count: usize, index: usize) -> RTensor {
        assert!(count > 0 && self.size() % count == 0, "Cannot split {} into {}", self.size(), count);
        let width = self.size() / count;
        RTensor::vector(self.data[index * width..(index + 1) * width].to_vec())
    }

    /// Numerically stable `log(sum(exp(x)))`.
    pub fn logsumexp(&self) -> f32 {
        let max = self.max();
        if max == f32::NEG_INFINITY {
            return max;
        }
        let sum: f32 = self.data.iter().map(|&x| (x - max).exp()).sum();
        max + sum.ln()
    }

    /// Log-normalise a score vector.
    pub fn log_softmax(&self) -> RTensor {
        let lse = self.logsumexp();
        self.map(|x| x - lse)
    }

    /// Normalise a score vector into probabilities.
    pub fn softmax(&self) -> RTensor {
        let max = self.max();
        let exps = self.map(|x| (x - max).exp());
        let sum: f32 = exps.data.iter().sum();
        exps.map(|x| x / sum)
    }

    /// Largest element (`-inf` for an empty tensor).
    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Check that all values are finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }
}

impl fmt::Debug for RTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shape.len() == 1 {
            write!(f, "RTensor(vec[{}]={:?})", self.shape[0], self.data)
        } else {
            write!(f, "RTensor(shape={:?}, data={:?})", self.shape, self.data)
        }
    }
}
