//! Remote sentence-embedding backend speaking the OpenAI-compatible
//! `POST /v1/embeddings` protocol (text-embeddings-inference, vLLM, OpenAI).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EmbeddingError, EmbeddingProvider};

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Clone)]
pub struct HttpEmbedder {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbedder {
    pub fn new(url: String, model: String, api_key: Option<String>) -> Result<Self, EmbeddingError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(60)).build()?,
            url,
            model,
            api_key,
        })
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut builder = self.client.post(&self.url).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Malformed(e.to_string()))?;
        debug!(count = parsed.data.len(), model = %self.model, "Embedding batch received");

        order_vectors(parsed.data, texts.len())
    }
}

/// Places each datum at its `index`, rejecting gaps, duplicates and empty vectors.
fn order_vectors(data: Vec<EmbeddingDatum>, expected: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if data.len() != expected {
        return Err(EmbeddingError::Malformed(format!(
            "expected {expected} embeddings, got {}",
            data.len()
        )));
    }

    if expected == 0 {
        return Ok(Vec::new());
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for datum in data {
        if datum.embedding.is_empty() {
            return Err(EmbeddingError::Malformed("empty embedding vector".to_string()));
        }
        let slot = slots.get_mut(datum.index).ok_or_else(|| {
            EmbeddingError::Malformed(format!("embedding index {} out of range", datum.index))
        })?;
        if slot.is_some() {
            return Err(EmbeddingError::Malformed(format!(
                "duplicate embedding index {}",
                datum.index
            )));
        }
        *slot = Some(datum.embedding);
    }

    let vectors: Vec<Vec<f32>> = slots.into_iter().flatten().collect();
    let dimension = vectors[0].len();
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
        return Err(EmbeddingError::DimensionMismatch {
            left: dimension,
            right: bad.len(),
        });
    }
    Ok(vectors)
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedder {
    fn name(&self) -> &str {
        "http"
    }

    async fn embed_normalized(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.request(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::Malformed("no embedding returned".to_string()))
    }

    async fn embed_normalized_batch(
        &self,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datum(index: usize, embedding: Vec<f32>) -> EmbeddingDatum {
        EmbeddingDatum { embedding, index }
    }

    #[test]
    fn test_order_vectors_sorts_by_index() {
        let ordered = order_vectors(
            vec![datum(1, vec![0.0, 1.0]), datum(0, vec![1.0, 0.0])],
            2,
        )
        .unwrap();
        assert_eq!(ordered, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_order_vectors_rejects_count_mismatch() {
        let err = order_vectors(vec![datum(0, vec![1.0])], 2).unwrap_err();
        assert!(matches!(err, EmbeddingError::Malformed(_)));
    }

    #[test]
    fn test_order_vectors_rejects_duplicate_index() {
        let err = order_vectors(vec![datum(0, vec![1.0]), datum(0, vec![2.0])], 2).unwrap_err();
        assert!(matches!(err, EmbeddingError::Malformed(_)));
    }

    #[test]
    fn test_order_vectors_rejects_mixed_dimensions() {
        let err =
            order_vectors(vec![datum(0, vec![1.0, 0.0]), datum(1, vec![1.0])], 2).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch { left: 2, right: 1 }
        ));
    }

    #[test]
    fn test_response_without_index_defaults_to_zero() {
        let parsed: EmbeddingResponse =
            serde_json::from_str(r#"{"data": [{"embedding": [0.1, 0.2]}]}"#).unwrap();
        let ordered = order_vectors(parsed.data, 1).unwrap();
        assert_eq!(ordered[0], vec![0.1, 0.2]);
    }
}
