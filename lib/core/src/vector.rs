use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A dense embedding vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self {
            data: vec![0.0; dim],
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }

    /// True when every component is exactly zero
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|x| *x == 0.0)
    }

    #[inline]
    pub fn dot(&self, other: &Vector) -> f32 {
        dot_product(&self.data, &other.data)
    }

    /// Euclidean length
    #[inline]
    pub fn norm(&self) -> f32 {
        dot_product(&self.data, &self.data).sqrt()
    }

    /// Compute cosine similarity with another vector.
    ///
    /// Returns 0.0 when either vector has zero length or the dimensions
    /// differ: no evidence of similarity rather than an error.
    #[inline]
    pub fn cosine_similarity(&self, other: &Vector) -> f32 {
        if self.dim() != other.dim() {
            return 0.0;
        }

        let dot = dot_product(&self.data, &other.data);
        let norm_a = self.norm();
        let norm_b = other.norm();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot / (norm_a * norm_b)
    }

    /// Normalize the vector to unit length
    #[inline]
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > f32::EPSILON {
            let inv_norm = 1.0 / norm;
            for x in &mut self.data {
                *x *= inv_norm;
            }
        }
    }

    /// Element-wise mean of a non-empty set of equally sized vectors.
    ///
    /// Duplicates are kept: a vector passed twice weighs twice.
    pub fn mean(vectors: &[Vector]) -> Result<Vector> {
        let first = vectors
            .first()
            .ok_or_else(|| Error::InvalidInput("cannot average zero vectors".to_string()))?;
        let dim = first.dim();

        let mut sum = vec![0.0f32; dim];
        for v in vectors {
            if v.dim() != dim {
                return Err(Error::InvalidDimension {
                    expected: dim,
                    actual: v.dim(),
                });
            }
            for (acc, x) in sum.iter_mut().zip(v.data.iter()) {
                *acc += x;
            }
        }

        let count = vectors.len() as f32;
        for x in &mut sum {
            *x /= count;
        }
        Ok(Vector::new(sum))
    }
}

/// Scalar dot product with two accumulators for better pipelining.
/// Mismatched lengths yield 0.0.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot0 = 0.0f32;
    let mut dot1 = 0.0f32;
    let pairs = a.len() / 2;

    for i in 0..pairs {
        let j = i * 2;
        dot0 += a[j] * b[j];
        dot1 += a[j + 1] * b[j + 1];
    }
    if a.len() % 2 == 1 {
        let last = a.len() - 1;
        dot0 += a[last] * b[last];
    }

    dot0 + dot1
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn components(max_dim: usize) -> impl Strategy<Value = Vec<f32>> {
        proptest::collection::vec(-1000.0f32..1000.0, 1..max_dim)
    }

    #[test]
    fn test_cosine_similarity() {
        let v1 = Vector::new(vec![1.0, 0.0]);
        let v2 = Vector::new(vec![1.0, 0.0]);
        assert!((v1.cosine_similarity(&v2) - 1.0).abs() < 1e-6);

        let v3 = Vector::new(vec![1.0, 0.0]);
        let v4 = Vector::new(vec![0.0, 1.0]);
        assert!((v3.cosine_similarity(&v4) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_ignores_magnitude() {
        let a = Vector::new(vec![1.0, 2.0, 3.0]);
        let b = Vector::new(a.as_slice().iter().map(|x| x * 40.0).collect());
        assert!((a.cosine_similarity(&b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let zero = Vector::zeros(3);
        let v = Vector::new(vec![0.3, -0.2, 0.9]);
        assert_eq!(zero.cosine_similarity(&v), 0.0);
        assert_eq!(v.cosine_similarity(&zero), 0.0);
        assert_eq!(zero.cosine_similarity(&zero), 0.0);
    }

    #[test]
    fn test_dimension_mismatch_scores_zero() {
        let a = Vector::new(vec![1.0, 0.0]);
        let b = Vector::new(vec![1.0, 0.0, 0.0]);
        assert_eq!(a.cosine_similarity(&b), 0.0);
    }

    #[test]
    fn test_dot_product_odd_length() {
        assert_eq!(dot_product(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
    }

    #[test]
    fn test_mean_keeps_duplicates() {
        let a = Vector::new(vec![1.0, 0.0, 0.0]);
        let b = Vector::new(vec![0.0, 1.0, 0.0]);

        let m = Vector::mean(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(m.as_slice(), &[0.5, 0.5, 0.0]);

        let weighted = Vector::mean(&[a.clone(), a, b]).unwrap();
        assert!((weighted.as_slice()[0] - 2.0 / 3.0).abs() < 1e-6);
        assert!((weighted.as_slice()[1] - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_mean_rejects_empty_and_mixed() {
        assert!(Vector::mean(&[]).is_err());
        let err = Vector::mean(&[Vector::zeros(2), Vector::zeros(3)]).unwrap_err();
        assert!(matches!(err, Error::InvalidDimension { expected: 2, actual: 3 }));
    }

    #[test]
    fn test_normalize() {
        let mut v = Vector::new(vec![3.0, 4.0]);
        v.normalize();
        assert!((v.norm() - 1.0).abs() < 1e-6);

        let mut zero = Vector::zeros(2);
        zero.normalize();
        assert!(zero.is_zero());
    }

    proptest! {
        #[test]
        fn prop_cosine_is_bounded(
            (a, b) in (1usize..64).prop_flat_map(|dim| (
                proptest::collection::vec(-1000.0f32..1000.0, dim),
                proptest::collection::vec(-1000.0f32..1000.0, dim),
            ))
        ) {
            let score = Vector::new(a).cosine_similarity(&Vector::new(b));
            prop_assert!(score.is_finite());
            prop_assert!((-1.0 - 1e-6..=1.0 + 1e-6).contains(&score), "score {}", score);
        }

        #[test]
        fn prop_zero_side_scores_zero(v in components(64)) {
            let zero = Vector::zeros(v.len());
            let v = Vector::new(v);
            prop_assert_eq!(zero.cosine_similarity(&v), 0.0);
            prop_assert_eq!(v.cosine_similarity(&zero), 0.0);
        }

        #[test]
        fn prop_self_similarity_is_one(v in components(64)) {
            let v = Vector::new(v);
            prop_assume!(!v.is_zero());
            prop_assert!((v.cosine_similarity(&v) - 1.0).abs() < 1e-4);
        }
    }
}
