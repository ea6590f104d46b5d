//! Scalar Encodings
//!
//! Lifts scalar signals and categorical attributes into vectors the
//! composite scorer can compare with cosine similarity:
//!
//! - piecewise-linear bin encoding for scalars in [0,1]
//! - one-hot encoding for note types
//! - a deterministic low-dimensional projection for community identifiers

use super::cosine_similarity;
use crate::vault::{NoteType, NOTE_TYPE_COUNT};

/// Fixed table of small primes driving the community projection
const PROJECTION_PRIMES: [f64; 16] = [
    2.0, 3.0, 5.0, 7.0, 11.0, 13.0, 17.0, 19.0, 23.0, 29.0, 31.0, 37.0, 41.0, 43.0, 47.0, 53.0,
];

// ============================================================================
// PIECEWISE-LINEAR ENCODING
// ============================================================================

/// Encode a scalar in [0,1] into `bins` monotone bins
///
/// Bins strictly below `floor(v*B)` are 1, the bin containing `v*B` holds
/// the fractional part, higher bins are 0; `v = 1` saturates every bin.
/// Cosine against `encode(1.0)` is then monotone in `v`, which makes scalar
/// signals behave like any other similarity space.
pub fn piecewise_encode(value: f64, bins: usize) -> Vec<f32> {
    let value = value.clamp(0.0, 1.0);
    let scaled = value * bins as f64;
    let whole = scaled.floor() as usize;

    let mut encoded = vec![0.0f32; bins];
    for (i, bin) in encoded.iter_mut().enumerate() {
        if i < whole {
            *bin = 1.0;
        } else if i == whole {
            *bin = (scaled - whole as f64) as f32;
        }
    }
    encoded
}

/// Cosine similarity of two scalars under the piecewise encoding
pub fn scalar_similarity(value: f64, target: f64, bins: usize) -> f64 {
    cosine_similarity(&piecewise_encode(value, bins), &piecewise_encode(target, bins))
}

// ============================================================================
// TYPE ONE-HOT
// ============================================================================

/// One-hot vector over the six note type labels
pub fn type_one_hot(note_type: NoteType) -> Vec<f32> {
    let mut encoded = vec![0.0f32; NOTE_TYPE_COUNT];
    encoded[note_type.slot()] = 1.0;
    encoded
}

// ============================================================================
// COMMUNITY PROJECTION
// ============================================================================

/// Deterministic projection of a community identifier
///
/// Alternating sine/cosine of `community_id * prime_d / total_communities`
/// over the fixed prime table. Nearby identifiers land on nearby angles,
/// which is all the community space requires.
pub fn community_projection(community_id: usize, total_communities: usize, dims: usize) -> Vec<f32> {
    let total = total_communities.max(1) as f64;
    (0..dims)
        .map(|d| {
            let angle = community_id as f64 * PROJECTION_PRIMES[d % PROJECTION_PRIMES.len()] / total;
            let value = if d % 2 == 0 { angle.sin() } else { angle.cos() };
            value as f32
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
