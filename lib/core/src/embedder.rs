//! Embedding providers
//!
//! The embedding model is an external collaborator: text in, fixed-size
//! vector out. [`HashEmbedder`] is a deterministic local provider that needs
//! no model files, which keeps the server usable out of the box and tests
//! reproducible.

use crate::{Error, Result, Vector};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Default dimension, matching common sentence-transformer models
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Maps text to a vector of exactly [`EmbeddingProvider::dim`] components.
///
/// Failures are reported as [`Error::EmbeddingUnavailable`]; callers do not
/// retry.
pub trait EmbeddingProvider: Send + Sync {
    fn dim(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vector>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

/// Feature-hashing embedder over character trigrams and whole words.
///
/// Hashes are FNV-1a so vectors are stable across builds and can be
/// persisted. Each feature lands in one bucket with a sign taken from a
/// second hash bit; the result is L2-normalized. Text with no features
/// embeds to the zero vector.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a(feature.as_bytes());
        let pos = (hash % self.dim as u64) as usize;
        let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        vector[pos] += sign * weight;
    }
}

impl EmbeddingProvider for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vector> {
        let normalized = text.to_lowercase();
        let mut data = vec![0.0f32; self.dim];

        for word in normalized.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            // Words contribute more than their trigrams
            self.add_feature(&mut data, word, 2.0);

            let padded: Vec<char> = format!(" {} ", word).chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.add_feature(&mut data, &trigram, 1.0);
            }
        }

        let mut vector = Vector::new(data);
        vector.normalize();
        Ok(vector)
    }
}

/// Fixed text-to-vector table, for fixtures and tests.
///
/// Unknown text fails like an unreachable provider would.
#[derive(Debug, Default)]
pub struct StaticEmbedder {
    dim: usize,
    table: RwLock<HashMap<String, Vector>>,
}

impl StaticEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            table: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert(&self, text: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dim {
            return Err(Error::InvalidDimension {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        self.table.write().insert(text.into(), Vector::new(vector));
        Ok(())
    }

    #[must_use]
    pub fn with(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.table.write().insert(text.into(), Vector::new(vector));
        self
    }
}

impl EmbeddingProvider for StaticEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vector> {
        self.table
            .read()
            .get(text)
            .cloned()
            .ok_or_else(|| Error::EmbeddingUnavailable(format!("no embedding for {:?}", text)))
    }
}
