//! Deterministic Test Embedder
//!
//! Token-hash bag-of-words embedding: fast, dependency-free, and stable
//! across runs, so retrieval assertions do not depend on a downloaded
//! model. Texts sharing tokens get correlated vectors, which is enough for
//! the ranking scenarios exercised here.

use mnemos_core::embeddings::{normalize, Result, TextEmbedder};

/// Deterministic token-hash embedder
pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    /// Create an embedder with the given output dimension
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

impl TextEmbedder for HashEmbedder {
    fn model_name(&self) -> &str {
        "hash-embedder"
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dims];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            // FNV-1a keeps the token-to-slot mapping stable across runs
            let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
            for byte in token.bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
            }
            vector[(hash % self.dims as u64) as usize] += 1.0;
        }
        normalize(&mut vector);
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let embedder = HashEmbedder::default();
        assert_eq!(
            embedder.embed("broker deploy").unwrap(),
            embedder.embed("broker deploy").unwrap()
        );
    }

    #[test]
    fn test_shared_tokens_correlate() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("deploy the broker").unwrap();
        let b = embedder.embed("broker deploy runbook").unwrap();
        let c = embedder.embed("tomatoes and basil").unwrap();
        let sim = |x: &[f32], y: &[f32]| mnemos_core::cosine_similarity(x, y);
        assert!(sim(&a, &b) > sim(&a, &c));
    }
}
