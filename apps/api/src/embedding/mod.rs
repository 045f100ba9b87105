//! Embedding Provider: maps normalized text to dense vectors and compares them.
//!
//! Backends implement `EmbeddingProvider`. `AppState` carries one
//! `Arc<dyn EmbeddingProvider>` built by `init_provider` at startup; the model
//! behind it is loaded once for the process lifetime and shared read-only.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::config::{Config, EmbeddingBackend};

pub mod hash;
pub mod http;
pub mod normalize;

pub use hash::HashEmbedder;
pub use http::HttpEmbedder;
pub use normalize::normalize_text;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed embedding response: {0}")]
    Malformed(String),

    #[error("Dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

/// A text embedding backend. Implementations must be deterministic for a
/// given model and safe to call concurrently.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short backend label for logs.
    fn name(&self) -> &str;

    /// Embeds text that has already been passed through `normalize_text`.
    async fn embed_normalized(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embeds several normalized texts. Backends with a batch endpoint override this.
    async fn embed_normalized_batch(
        &self,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed_normalized(text).await?);
        }
        Ok(vectors)
    }

    /// Normalizes then embeds.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_normalized(&normalize_text(text)).await
    }

    /// Normalizes then embeds each text, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let cleaned: Vec<String> = texts.iter().map(|t| normalize_text(t)).collect();
        let vectors = self.embed_normalized_batch(&cleaned).await?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::Malformed(format!(
                "expected {} vectors, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

/// Builds the configured backend and checks it once. A backend that cannot
/// embed a sample string is a fatal configuration error.
pub async fn init_provider(config: &Config) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.embedding_backend {
        EmbeddingBackend::Http => Arc::new(
            HttpEmbedder::new(
                config.embedding_api_url.clone(),
                config.embedding_model.clone(),
                config.embedding_api_key.clone(),
            )
            .context("Failed to build embedding HTTP client")?,
        ),
        EmbeddingBackend::Hash => Arc::new(HashEmbedder::new(config.embedding_dimension)),
    };

    check_readiness(provider.as_ref(), config.embedding_dimension, &config.embedding_model).await?;
    Ok(provider)
}

/// Embeds a sample string and checks the vector width against `EMBEDDING_DIMENSION`.
async fn check_readiness(
    provider: &dyn EmbeddingProvider,
    expected_dimension: usize,
    model: &str,
) -> anyhow::Result<()> {
    let sample = provider.embed("embedding backend readiness check").await.with_context(|| {
        format!(
            "Embedding backend '{}' (model {model}) is unreachable or misconfigured",
            provider.name()
        )
    })?;
    if sample.is_empty() {
        anyhow::bail!("Embedding backend '{}' returned an empty vector", provider.name());
    }
    if sample.len() != expected_dimension {
        anyhow::bail!(
            "Embedding backend '{}' (model {model}) returned {}-dimensional vectors, \
             EMBEDDING_DIMENSION is {expected_dimension}",
            provider.name(),
            sample.len()
        );
    }

    info!(
        backend = provider.name(),
        dimension = sample.len(),
        "Embedding provider initialized"
    );
    Ok(())
}

/// Cosine similarity of two vectors, in [-1, 1].
/// A zero-norm vector has similarity 0.0 with everything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, EmbeddingError> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Pairwise cosine similarity between two batches: `out[i][j] = cos(rows_a[i], rows_b[j])`.
/// A single vector is a batch of one, so `cosine_similarity_matrix(&[a], &[b])[0][0]`
/// equals `cosine_similarity(a, b)`.
pub fn cosine_similarity_matrix<A, B>(
    rows_a: &[A],
    rows_b: &[B],
) -> Result<Vec<Vec<f32>>, EmbeddingError>
where
    A: AsRef<[f32]>,
    B: AsRef<[f32]>,
{
    rows_a
        .iter()
        .map(|a| {
            rows_b
                .iter()
                .map(|b| cosine_similarity(a.as_ref(), b.as_ref()))
                .collect::<Result<Vec<f32>, _>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedWidth(usize);

    #[async_trait]
    impl EmbeddingProvider for FixedWidth {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn embed_normalized(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![0.1; self.0])
        }
    }

    #[tokio::test]
    async fn test_readiness_check_rejects_wrong_dimension() {
        let err = check_readiness(&FixedWidth(384), 768, "all-mpnet-base-v2")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("384-dimensional"));
    }

    #[tokio::test]
    async fn test_readiness_check_rejects_empty_vector() {
        assert!(check_readiness(&FixedWidth(0), 768, "m").await.is_err());
    }

    #[tokio::test]
    async fn test_readiness_check_accepts_matching_dimension() {
        assert!(check_readiness(&FixedWidth(768), 768, "m").await.is_ok());
    }

    #[tokio::test]
    async fn test_init_hash_backend_passes_readiness_check() {
        let mut config = Config::for_tests();
        config.embedding_backend = EmbeddingBackend::Hash;
        let provider = init_provider(&config).await.unwrap();
        assert_eq!(provider.name(), "hash");
    }

    #[test]
    fn test_identical_vectors_score_one() {
        let sim = cosine_similarity(&[0.3, 0.4, 0.5], &[0.3, 0.4, 0.5]).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_opposite_vectors_score_minus_one() {
        let sim = cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap();
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_vectors_score_zero() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).unwrap();
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let err = cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch { left: 3, right: 2 }
        ));
    }

    #[test]
    fn test_matrix_matches_pairwise() {
        let a: Vec<Vec<f32>> = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let b: Vec<Vec<f32>> = vec![vec![1.0, 1.0]];
        let m = cosine_similarity_matrix(&a, &b).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m[0].len(), 1);
        let expected = std::f32::consts::FRAC_1_SQRT_2;
        assert!((m[0][0] - expected).abs() < 1e-6);
        assert!((m[1][0] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_single_pair_through_matrix() {
        let a = [0.2_f32, 0.9, -0.1];
        let b = [0.5_f32, 0.1, 0.7];
        let single = cosine_similarity(&a, &b).unwrap();
        let matrix = cosine_similarity_matrix(&[a], &[b]).unwrap();
        assert!((single - matrix[0][0]).abs() < 1e-7);
    }

    #[tokio::test]
    async fn test_embed_normalizes_before_embedding() {
        let embedder = HashEmbedder::new(64);
        let marked_up = embedder.embed("<b>Rust</b>   engineer!").await.unwrap();
        let plain = embedder.embed_normalized("Rust engineer!").await.unwrap();
        assert_eq!(marked_up, plain);
    }

    #[tokio::test]
    async fn test_embed_batch_preserves_order() {
        let embedder = HashEmbedder::new(64);
        let texts = vec!["python".to_string(), "photoshop".to_string()];
        let batch = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(batch[0], embedder.embed("python").await.unwrap());
        assert_eq!(batch[1], embedder.embed("photoshop").await.unwrap());
    }
}
