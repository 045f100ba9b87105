use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use siphasher::sip::SipHasher13;

use super::{EmbeddingError, EmbeddingProvider};

/// Fixed seeds keep vectors stable across Rust versions and restarts.
/// Changing them invalidates every stored candidate embedding.
const HASH_SEED_K0: u64 = 0x0123_4567_89ab_cdef;
const HASH_SEED_K1: u64 = 0xfedc_ba98_7654_3210;

/// Deterministic bag-of-words embedder using signed feature hashing.
///
/// - no model download, no network
/// - lowercase word unigrams plus adjacent bigrams
/// - L2-normalized output; empty text maps to the zero vector
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn hash_token(&self, token: &str) -> u64 {
        let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
        token.hash(&mut hasher);
        hasher.finish()
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();

        let mut vector = vec![0.0f32; self.dimension];
        let bigrams = words.windows(2).map(|pair| format!("{} {}", pair[0], pair[1]));

        for (token, weight) in words
            .iter()
            .cloned()
            .map(|w| (w, 1.0f32))
            .chain(bigrams.map(|b| (b, 0.5f32)))
        {
            let h = self.hash_token(&token);
            let idx = (h % self.dimension as u64) as usize;
            // Top bit picks the sign so collisions tend to cancel.
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            vector[idx] += sign * weight;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn name(&self) -> &str {
        "hash"
    }

    async fn embed_normalized(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.vectorize(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine_similarity;

    #[test]
    fn test_vectors_are_unit_length() {
        let v = HashEmbedder::new(256).vectorize("Senior Python backend engineer");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm was {norm}");
    }

    #[test]
    fn test_same_text_same_vector() {
        let embedder = HashEmbedder::new(128);
        assert_eq!(embedder.vectorize("Rust, Tokio"), embedder.vectorize("rust tokio"));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let v = HashEmbedder::new(32).vectorize("");
        assert_eq!(v.len(), 32);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_overlapping_text_scores_higher() {
        let embedder = HashEmbedder::new(512);
        let jd = embedder.vectorize("Senior Python backend engineer");
        let backend = embedder.vectorize("Python backend engineer, 5 years");
        let designer = embedder.vectorize("Graphic designer, Photoshop expert");

        let backend_sim = cosine_similarity(&jd, &backend).unwrap();
        let designer_sim = cosine_similarity(&jd, &designer).unwrap();
        assert!(
            backend_sim > designer_sim,
            "backend {backend_sim} should beat designer {designer_sim}"
        );
        assert!(backend_sim > 0.3, "backend similarity was {backend_sim}");
    }
}
