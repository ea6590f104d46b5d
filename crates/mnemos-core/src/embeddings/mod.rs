//! Embeddings Module
//!
//! The engine treats text embedding as a pure `(string) -> vector` function
//! behind the [`TextEmbedder`] trait. The default realization is a local
//! feature-extraction model ([`LocalEmbedder`], `embeddings` feature);
//! tests substitute deterministic embedders.
//!
//! Scalar signals (recency, vitality, authority) are lifted into
//! cosine-comparable vectors by the piecewise-linear encoding in
//! [`encode`].

pub mod encode;

#[cfg(feature = "embeddings")]
mod local;

#[cfg(feature = "embeddings")]
pub use local::{LocalEmbedder, DEFAULT_EMBEDDING_MODEL};

pub use encode::{community_projection, piecewise_encode, scalar_similarity, type_one_hot};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Embedding error type
#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum EmbeddingError {
    /// Failed to initialize the embedding model
    #[error("model initialization failed: {0}")]
    ModelInit(String),
    /// Failed to generate an embedding
    #[error("embedding generation failed: {0}")]
    EmbeddingFailed(String),
    /// Invalid input (empty text, unknown model name)
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Embedding result type
pub type Result<T> = std::result::Result<T, EmbeddingError>;

// ============================================================================
// EMBEDDER TRAIT
// ============================================================================

/// A pure text-to-vector function of fixed dimension
///
/// Implementations must be deterministic for a given input within one
/// process lifetime; the index relies on that to stay comparable across
/// incremental builds.
pub trait TextEmbedder: Send + Sync {
    /// Model name, used as the process-wide cache key
    fn model_name(&self) -> &str;

    /// Output dimension
    fn dimensions(&self) -> usize;

    /// Embed one text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many texts; the default loops, backends may batch
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

// ============================================================================
// SIMILARITY
// ============================================================================

/// Compute cosine similarity between two vectors
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot_product = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (x, y) in a.iter().zip(b.iter()) {
        dot_product += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }

    let denominator = (norm_a * norm_b).sqrt();
    if denominator > 0.0 {
        dot_product / denominator
    } else {
        0.0
    }
}

/// L2-normalize a vector in place; zero vectors are left unchanged
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector {
            *x /= norm;
        }
    }
}

// ============================================================================
// TEST SUPPORT
// ============================================================================

/// Deterministic embedders for in-crate tests
#[cfg(test)]
pub(crate) mod testing {
    use super::{normalize, Result, TextEmbedder};

    /// Token-hash bag-of-words embedder: deterministic, shared tokens give
    /// correlated vectors
    pub struct BagEmbedder {
        dims: usize,
    }

    impl BagEmbedder {
        pub fn new(dims: usize) -> Self {
            Self { dims }
        }
    }

    impl TextEmbedder for BagEmbedder {
        fn model_name(&self) -> &str {
            "bag-embedder"
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
                // FNV-1a keeps the mapping stable across runs
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
}

// ============================================================================
// TESTS
// ============================================================================
