//! Masked action distributions.
//!
//! The decoder samples from the scorer's softmax after removing every action
//! the tree shape forbids:
//!
//! ```text
//! p(w)  = softmax(scores)[w]                       model distribution
//! p'(w) = p(w) · legal(w) / Σ_v p(v) · legal(v)    renormalised over legal actions
//! ```

use rand::Rng;

/// A probability vector over the vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDist {
    /// Probabilities (sum to 1).
    pub p: Vec<f32>,
}

impl ActionDist {
    /// Normalise non-negative weights.
    ///
    /// Returns `None` if there is no positive mass to normalise.
    pub fn from_weights(weights: Vec<f32>) -> Option<Self> {
        let sum: f32 = weights.iter().sum();
        if !sum.is_finite() || sum <= 0.0 {
            return None;
        }
        Some(Self {
            p: weights.into_iter().map(|w| w / sum).collect(),
        })
    }

    /// Zero the mass of actions where `legal` is false, then renormalise.
    pub fn masked(probs: &[f32], legal: impl Fn(usize) -> bool) -> Option<Self> {
        let weights = probs
            .iter()
            .enumerate()
            .map(|(w, &p)| if legal(w) { p } else { 0.0 })
            .collect();
        Self::from_weights(weights)
    }

    /// Probability of outcome `i`.
    pub fn prob(&self, i: usize) -> f32 {
        self.p.get(i).copied().unwrap_or(0.0)
    }

    /// Number of outcomes.
    pub fn len(&self) -> usize {
        self.p.len()
    }

    /// Whether there are no outcomes.
    pub fn is_empty(&self) -> bool {
        self.p.is_empty()
    }

    /// Inverse transform sampling with a uniform value in [0, 1).
    ///
    /// Rounding can leave the cumulative sum just below `u`; the last
    /// outcome with positive mass is returned then.
    pub fn sample_with(&self, u: f32) -> usize {
        let mut cumsum = 0.0;
        for (i, &p) in self.p.iter().enumerate() {
            cumsum += p;
            if p > 0.0 && u < cumsum {
                return i;
            }
        }
        self.p.iter().rposition(|&p| p > 0.0).unwrap_or(0)
    }

    /// Draw one outcome.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.sample_with(rng.gen::<f32>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_from_weights_normalises() {
        let d = ActionDist::from_weights(vec![1.0, 2.0, 1.0]).unwrap();
        assert!((d.prob(1) - 0.5).abs() < 1e-6);
        assert!((d.p.iter().sum::<f32>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_mass_is_none() {
        assert_eq!(ActionDist::from_weights(vec![0.0, 0.0]), None);
        assert_eq!(ActionDist::masked(&[0.5, 0.5], |_| false), None);
    }

    #[test]
    fn test_masked_renormalises() {
        let d = ActionDist::masked(&[0.2, 0.3, 0.5], |w| w != 2).unwrap();
        assert!((d.prob(0) - 0.4).abs() < 1e-6);
        assert!((d.prob(1) - 0.6).abs() < 1e-6);
        assert_eq!(d.prob(2), 0.0);
    }

    #[test]
    fn test_sample_with_inverse_transform() {
        let d = ActionDist::from_weights(vec![0.25, 0.0, 0.75]).unwrap();
        assert_eq!(d.sample_with(0.0), 0);
        assert_eq!(d.sample_with(0.24), 0);
        assert_eq!(d.sample_with(0.25), 2);
        assert_eq!(d.sample_with(1.0), 2);
    }

    #[test]
    fn test_sample_never_picks_masked() {
        let d = ActionDist::masked(&[0.3, 0.4, 0.3], |w| w == 1).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            assert_eq!(d.sample(&mut rng), 1);
        }
    }
}
