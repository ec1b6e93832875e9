//! Deterministic offline embedding provider
//!
//! Hashes each token into one of `dimensions` buckets and L2-normalizes
//! the bucket counts. Texts sharing vocabulary get similar vectors, so
//! semantic search stays meaningful enough for tests and demos without
//! any model or network.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

pub struct SimulatedEmbedding {
    dimensions: usize,
}

impl SimulatedEmbedding {
    pub fn new(dimensions: usize) -> anyhow::Result<Self> {
        if dimensions == 0 {
            anyhow::bail!("Simulated embeddings need at least one dimension");
        }
        Ok(Self { dimensions })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn embed(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        texts.iter().map(|text| self.embed_one(text)).collect()
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            // FxHasher is seed-free, so vectors are stable across runs.
            let mut hasher = FxHasher::default();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % self.dimensions;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}
