//! Axum route handlers for the Matching API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::access::verify_invitation;
use crate::candidates::{embed_candidates, prepare_json, CandidateInput};
use crate::errors::{ApiJson, AppError};
use crate::ranking::MatchResult;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VerifyInvitationRequest {
    pub invitation_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerifyInvitationResponse {
    pub valid: bool,
}

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    #[serde(default)]
    pub job_description: String,
    /// Inline candidates, ingested for this request only.
    pub candidates: Option<Vec<CandidateInput>>,
    pub invitation_code: Option<String>,
    pub top_k: Option<usize>,
    pub min_similarity: Option<f32>,
    /// Rank the stored candidates when no inline candidates are given.
    #[serde(default)]
    pub use_stored: bool,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub job_description: String,
    pub total_candidates: usize,
    pub recommendations_count: usize,
    pub skipped_candidates: usize,
    pub recommendations: Vec<MatchResult>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/verify-invitation
pub async fn handle_verify_invitation(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyInvitationRequest>,
) -> Result<Json<VerifyInvitationResponse>, AppError> {
    verify_invitation(
        &state.config.invitation_codes,
        request.invitation_code.as_deref(),
    )?;
    Ok(Json(VerifyInvitationResponse { valid: true }))
}

/// POST /api/match
///
/// Invitation gate first, then validation, then ranking. Inline candidates
/// are embedded but never stored; `use_stored` ranks a snapshot of the store.
pub async fn handle_match(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<MatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    verify_invitation(
        &state.config.invitation_codes,
        request.invitation_code.as_deref(),
    )?;

    let job_description = request.job_description.trim().to_string();
    if job_description.is_empty() {
        return Err(AppError::Validation("Job description is required".to_string()));
    }

    let inline = request.candidates.unwrap_or_default();
    let candidates = if !inline.is_empty() {
        let prepared = inline.into_iter().map(prepare_json).collect();
        embed_candidates(prepared, state.embedder.as_ref()).await?
    } else if request.use_stored {
        let stored = state.store.snapshot();
        if stored.is_empty() {
            return Err(AppError::Validation(
                "No candidates available for matching. Please add candidates first.".to_string(),
            ));
        }
        stored
    } else {
        return Err(AppError::Validation("Candidates data is required".to_string()));
    };

    let top_k = request.top_k.unwrap_or(state.config.default_top_k);
    let min_similarity = request
        .min_similarity
        .unwrap_or(state.config.default_min_similarity);
    info!(
        candidates = candidates.len(),
        top_k,
        min_similarity,
        "Match request accepted"
    );

    let outcome = state
        .engine
        .rank(&job_description, &candidates, top_k, min_similarity)
        .await?;
    info!(
        scored = outcome.scored,
        skipped = outcome.skipped,
        anchor_similarity = outcome.anchor_similarity,
        "Match request completed"
    );

    Ok(Json(MatchResponse {
        job_description,
        total_candidates: candidates.len(),
        recommendations_count: outcome.recommendations.len(),
        skipped_candidates: outcome.skipped,
        recommendations: outcome.recommendations,
    }))
}
