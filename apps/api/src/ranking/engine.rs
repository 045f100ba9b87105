//! Ranking Engine: orchestrates the full matching pipeline.
//!
//! Flow: embed JD → generate + embed anchor → anchor similarity →
//!       score candidates → (optional threshold) → stable sort → top-k →
//!       bounded-concurrency summaries → response.
//!
//! Stateless per call: the caller hands in a point-in-time candidate slice.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::embedding::{cosine_similarity, cosine_similarity_matrix, EmbeddingProvider};
use crate::errors::AppError;
use crate::llm_client::TextGenerator;
use crate::models::Candidate;
use crate::ranking::anchor::{anchor_char_limit, generate_anchor, truncate_anchor};
use crate::ranking::summary::summarize_all;
use crate::ranking::{AnchorTruncation, NormalizationPolicy, ThresholdMode};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// One ranked candidate. Produced per request, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub id: String,
    pub name: String,
    /// Raw cosine similarity divided by the anchor similarity. Not bounded to [0, 1].
    pub similarity_score: f32,
    pub raw_similarity: f32,
    /// Empty when the summary call failed; see `summary_error`.
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_error: Option<String>,
    pub resume_text: String,
}

/// Ranking output plus the bookkeeping callers report back.
#[derive(Debug, Clone, Default)]
pub struct RankOutcome {
    pub recommendations: Vec<MatchResult>,
    /// Candidates that received a score.
    pub scored: usize,
    /// Candidates excluded because they had no usable embedding.
    pub skipped: usize,
    pub anchor_similarity: f32,
}

/// Tunables fixed at startup.
#[derive(Debug, Clone)]
pub struct RankingSettings {
    pub threshold_mode: ThresholdMode,
    pub normalization: NormalizationPolicy,
    pub anchor_truncation: AnchorTruncation,
    pub summary_concurrency: usize,
    /// Budget for a whole `rank` call; in-flight LLM calls are dropped when it expires.
    pub deadline: Duration,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            threshold_mode: ThresholdMode::Disabled,
            normalization: NormalizationPolicy::default(),
            anchor_truncation: AnchorTruncation::LongestResume,
            summary_concurrency: 4,
            deadline: Duration::from_secs(300),
        }
    }
}

impl RankingSettings {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            threshold_mode: config.threshold_mode(),
            normalization: config.normalization_policy()?,
            anchor_truncation: config.anchor_truncation(),
            summary_concurrency: config.summary_concurrency,
            deadline: Duration::from_secs(config.rank_deadline_secs),
        })
    }
}

struct Scored<'a> {
    candidate: &'a Candidate,
    raw: f32,
    normalized: f32,
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

/// Built once at startup and shared through `AppState`.
#[derive(Clone)]
pub struct RankingEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn TextGenerator>,
    settings: RankingSettings,
}

impl RankingEngine {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn TextGenerator>,
        settings: RankingSettings,
    ) -> Self {
        Self {
            embedder,
            llm,
            settings,
        }
    }

    pub fn settings(&self) -> &RankingSettings {
        &self.settings
    }

    /// Ranks `candidates` against `job_description` and returns at most `top_k`
    /// results, best first. Ties keep their input order.
    ///
    /// Anchor and embedding failures abort the call. Summary failures are
    /// recorded per result. Exceeding the configured deadline cancels every
    /// outstanding call and returns `AppError::Timeout`.
    pub async fn rank(
        &self,
        job_description: &str,
        candidates: &[Candidate],
        top_k: usize,
        min_similarity: f32,
    ) -> Result<RankOutcome, AppError> {
        if candidates.is_empty() {
            return Ok(RankOutcome::default());
        }

        let deadline = self.settings.deadline;
        tokio::time::timeout(
            deadline,
            self.rank_inner(job_description, candidates, top_k, min_similarity),
        )
        .await
        .map_err(|_| AppError::Timeout(format!("ranking exceeded {}s", deadline.as_secs())))?
    }

    async fn rank_inner(
        &self,
        job_description: &str,
        candidates: &[Candidate],
        top_k: usize,
        min_similarity: f32,
    ) -> Result<RankOutcome, AppError> {
        let started = Instant::now();

        // Step 1: job description embedding
        let job_embedding = self.embedder.embed(job_description).await?;

        // Step 2: anchor text, bounded by the configured truncation
        let anchor = generate_anchor(job_description, self.llm.as_ref())
            .await
            .map_err(|e| AppError::Llm(format!("Ideal-candidate generation failed: {e}")))?;
        let limit = anchor_char_limit(self.settings.anchor_truncation, candidates);
        let anchor_embedding = self.embedder.embed(truncate_anchor(&anchor, limit)).await?;

        // Step 3: calibration denominator
        let anchor_similarity = cosine_similarity(&job_embedding, &anchor_embedding)?;
        info!(anchor_similarity, "Anchor similarity computed");

        // Step 4: score candidates carrying an embedding of the right width
        let mut skipped = 0;
        let mut scorable: Vec<(&Candidate, &[f32])> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match candidate.embedding.as_deref() {
                Some(embedding) if embedding.len() == job_embedding.len() => {
                    scorable.push((candidate, embedding));
                }
                Some(embedding) => {
                    warn!(
                        candidate_id = %candidate.id,
                        expected = job_embedding.len(),
                        actual = embedding.len(),
                        "Skipping candidate with stale embedding"
                    );
                    skipped += 1;
                }
                None => skipped += 1,
            }
        }

        let vectors: Vec<&[f32]> = scorable.iter().map(|(_, embedding)| *embedding).collect();
        let raw_scores = cosine_similarity_matrix(&[job_embedding.as_slice()], &vectors)?
            .into_iter()
            .next()
            .unwrap_or_default();
        let scored: Vec<Scored<'_>> = scorable
            .into_iter()
            .zip(raw_scores)
            .map(|((candidate, _), raw)| Scored {
                candidate,
                raw,
                normalized: self.settings.normalization.normalize(raw, anchor_similarity),
            })
            .collect();
        let scored_count = scored.len();

        // Step 5: threshold, sort, truncate
        let shortlist = select_top(scored, top_k, min_similarity, self.settings.threshold_mode);

        // Step 6: summaries for the shortlist only; ordering does not depend on them
        let resume_texts: Vec<&str> = shortlist
            .iter()
            .map(|s| s.candidate.resume_text.as_str())
            .collect();
        let summaries = summarize_all(
            self.llm.as_ref(),
            job_description,
            &resume_texts,
            self.settings.summary_concurrency,
        )
        .await;

        let recommendations: Vec<MatchResult> = shortlist
            .into_iter()
            .zip(summaries)
            .map(|(s, summary)| {
                let (summary, summary_error) = match summary {
                    Ok(text) => (text, None),
                    Err(e) => (String::new(), Some(e.to_string())),
                };
                MatchResult {
                    id: s.candidate.id.clone(),
                    name: s.candidate.name.clone(),
                    similarity_score: s.normalized,
                    raw_similarity: s.raw,
                    summary,
                    summary_error,
                    resume_text: s.candidate.resume_text.clone(),
                }
            })
            .collect();

        info!(
            scored = scored_count,
            skipped,
            returned = recommendations.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ranking complete"
        );

        Ok(RankOutcome {
            recommendations,
            scored: scored_count,
            skipped,
            anchor_similarity,
        })
    }
}

/// Applies the optional threshold, sorts by normalized score descending
/// (stable, so ties keep input order) and keeps the first `top_k`.
fn select_top(
    mut scored: Vec<Scored<'_>>,
    top_k: usize,
    min_similarity: f32,
    threshold_mode: ThresholdMode,
) -> Vec<Scored<'_>> {
    if threshold_mode == ThresholdMode::Enforced {
        scored.retain(|s| s.normalized >= min_similarity);
    }
    scored.sort_by(|a, b| b.normalized.total_cmp(&a.normalized));
    scored.truncate(top_k);
    scored
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
