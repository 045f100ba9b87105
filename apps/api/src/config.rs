use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::ranking::{AnchorTruncation, NormalizationPolicy, ThresholdMode};

/// Which embedding backend the process talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// OpenAI-compatible `/v1/embeddings` server hosting a sentence-embedding model.
    Http,
    /// Deterministic feature hashing, no network. Intended for local runs.
    Hash,
}

impl FromStr for EmbeddingBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "hash" => Ok(Self::Hash),
            other => bail!("EMBEDDING_BACKEND must be 'http' or 'hash', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup aborts if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,

    pub embedding_backend: EmbeddingBackend,
    pub embedding_api_url: String,
    pub embedding_api_key: Option<String>,
    pub embedding_model: String,
    pub embedding_dimension: usize,

    /// Empty means every matching request is denied.
    pub invitation_codes: Vec<String>,

    pub default_top_k: usize,
    pub default_min_similarity: f32,
    pub enforce_min_similarity: bool,
    pub summary_concurrency: usize,
    pub llm_timeout_secs: u64,
    pub llm_max_retries: u32,
    pub rank_deadline_secs: u64,
    pub score_denominator_floor: f32,
    pub score_normalization: String,
    pub anchor_max_chars: Option<usize>,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let config = Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),

            embedding_backend: parse_env("EMBEDDING_BACKEND", EmbeddingBackend::Http)?,
            embedding_api_url: std::env::var("EMBEDDING_API_URL")
                .unwrap_or_else(|_| "http://localhost:8081/v1/embeddings".to_string()),
            embedding_api_key: std::env::var("EMBEDDING_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "all-mpnet-base-v2".to_string()),
            embedding_dimension: parse_env("EMBEDDING_DIMENSION", 768)?,

            invitation_codes: parse_codes(&std::env::var("INVITATION_CODES").unwrap_or_default()),

            default_top_k: parse_env("DEFAULT_TOP_K", 5)?,
            default_min_similarity: parse_env("DEFAULT_MIN_SIMILARITY", 0.1)?,
            enforce_min_similarity: parse_env("ENFORCE_MIN_SIMILARITY", false)?,
            summary_concurrency: parse_env("SUMMARY_CONCURRENCY", 4)?,
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 60)?,
            llm_max_retries: parse_env("LLM_MAX_RETRIES", 3)?,
            rank_deadline_secs: parse_env("RANK_DEADLINE_SECS", 300)?,
            score_denominator_floor: parse_env("SCORE_DENOMINATOR_FLOOR", 0.001)?,
            score_normalization: std::env::var("SCORE_NORMALIZATION")
                .unwrap_or_else(|_| "clamp".to_string()),
            anchor_max_chars: match std::env::var("ANCHOR_MAX_CHARS") {
                Ok(v) => Some(
                    v.parse::<usize>()
                        .context("ANCHOR_MAX_CHARS must be a positive integer")?,
                ),
                Err(_) => None,
            },
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 16 * 1024 * 1024)?,
        };

        // Validate derived settings eagerly so a typo fails at startup, not per request.
        config.normalization_policy()?;
        if config.summary_concurrency == 0 {
            bail!("SUMMARY_CONCURRENCY must be at least 1");
        }

        Ok(config)
    }

    /// Defaults matching `from_env` with an empty environment, for handler tests.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            anthropic_api_key: "test-key".to_string(),
            port: 8080,
            rust_log: "info".to_string(),
            embedding_backend: EmbeddingBackend::Hash,
            embedding_api_url: "http://localhost:8081/v1/embeddings".to_string(),
            embedding_api_key: None,
            embedding_model: "all-mpnet-base-v2".to_string(),
            embedding_dimension: 256,
            invitation_codes: vec!["let-me-in".to_string()],
            default_top_k: 5,
            default_min_similarity: 0.1,
            enforce_min_similarity: false,
            summary_concurrency: 4,
            llm_timeout_secs: 60,
            llm_max_retries: 3,
            rank_deadline_secs: 300,
            score_denominator_floor: 0.001,
            score_normalization: "clamp".to_string(),
            anchor_max_chars: None,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }

    pub fn threshold_mode(&self) -> ThresholdMode {
        if self.enforce_min_similarity {
            ThresholdMode::Enforced
        } else {
            ThresholdMode::Disabled
        }
    }

    pub fn normalization_policy(&self) -> Result<NormalizationPolicy> {
        match self.score_normalization.trim().to_ascii_lowercase().as_str() {
            "clamp" => Ok(NormalizationPolicy::ClampDenominator {
                floor: self.score_denominator_floor.abs(),
            }),
            "raw" => Ok(NormalizationPolicy::RawFallback {
                floor: self.score_denominator_floor.abs(),
            }),
            other => bail!("SCORE_NORMALIZATION must be 'clamp' or 'raw', got '{other}'"),
        }
    }

    pub fn anchor_truncation(&self) -> AnchorTruncation {
        match self.anchor_max_chars {
            Some(n) => AnchorTruncation::Fixed(n),
            None => AnchorTruncation::LongestResume,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => Ok(default),
    }
}

/// Splits a comma-separated code list, dropping blanks.
fn parse_codes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect()
}
