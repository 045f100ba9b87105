//! Axum route handlers for the Candidate API.

use axum::{
    extract::{multipart::{MultipartError, MultipartRejection}, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::candidates::extract::extract_upload;
use crate::candidates::ingest::{embed_candidates, prepare_json, prepare_upload, CandidateInput};
use crate::errors::{ApiJson, AppError};
use crate::models::{Candidate, CandidateInfo};
use crate::state::AppState;

const UPLOAD_FIELD: &str = "files";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AddCandidatesRequest {
    #[serde(default)]
    pub candidates: Vec<CandidateInput>,
}

#[derive(Debug, Serialize)]
pub struct AddCandidatesResponse {
    pub message: String,
    pub added_count: usize,
    pub total_candidates: usize,
}

#[derive(Debug, Serialize)]
pub struct UploadCandidatesResponse {
    pub message: String,
    pub uploaded_count: usize,
    pub total_candidates: usize,
}

#[derive(Debug, Serialize)]
pub struct ListCandidatesResponse {
    pub total_candidates: usize,
    pub candidates: Vec<CandidateInfo>,
}

#[derive(Debug, Serialize)]
pub struct DeletedCandidate {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteCandidateResponse {
    pub message: String,
    pub deleted_candidate: DeletedCandidate,
}

#[derive(Debug, Serialize)]
pub struct ClearCandidatesResponse {
    pub message: String,
    pub total_candidates: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/candidates
///
/// Ingests JSON candidates: text extraction, then one batch embedding call.
pub async fn handle_add_candidates(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AddCandidatesRequest>,
) -> Result<(StatusCode, Json<AddCandidatesResponse>), AppError> {
    if request.candidates.is_empty() {
        return Err(AppError::Validation("No candidates provided".to_string()));
    }

    let prepared = request.candidates.into_iter().map(prepare_json).collect();
    let candidates = embed_candidates(prepared, state.embedder.as_ref()).await?;
    let added_count = state.store.add_many(candidates);

    Ok((
        StatusCode::CREATED,
        Json(AddCandidatesResponse {
            message: format!("Successfully added {added_count} candidates"),
            added_count,
            total_candidates: state.store.count(),
        }),
    ))
}

/// POST /api/candidates/upload
///
/// Multipart upload under the `files` field. Unsupported or empty files are
/// skipped; if nothing usable remains the request is rejected.
pub async fn handle_upload_candidates(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadCandidatesResponse>), AppError> {
    let mut multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;
    let mut prepared = Vec::new();
    let mut seen_files = 0usize;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data: Bytes = field.bytes().await.map_err(multipart_error)?;
        if filename.is_empty() {
            continue;
        }
        seen_files += 1;

        match extract_upload(&filename, &data) {
            Ok(text) if !text.trim().is_empty() => prepared.push(prepare_upload(&filename, text)),
            Ok(_) => warn!(filename = %filename, "Skipping upload with no extractable text"),
            Err(e) => warn!(filename = %filename, "Skipping upload: {e}"),
        }
    }

    if seen_files == 0 {
        return Err(AppError::Validation("No files provided".to_string()));
    }
    if prepared.is_empty() {
        return Err(AppError::Validation(
            "No valid candidates found in uploaded files".to_string(),
        ));
    }

    let candidates = embed_candidates(prepared, state.embedder.as_ref()).await?;
    let uploaded_count = state.store.add_many(candidates);
    info!(uploaded_count, seen_files, "Upload processed");

    Ok((
        StatusCode::CREATED,
        Json(UploadCandidatesResponse {
            message: format!("Successfully uploaded {uploaded_count} candidates"),
            uploaded_count,
            total_candidates: state.store.count(),
        }),
    ))
}

/// GET /api/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
) -> Result<Json<ListCandidatesResponse>, AppError> {
    let candidates = state.store.list_info();
    Ok(Json(ListCandidatesResponse {
        total_candidates: candidates.len(),
        candidates,
    }))
}

/// GET /api/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Candidate>, AppError> {
    state
        .store
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))
}

/// DELETE /api/candidates/:id
///
/// Unknown ids are a 404 and leave the store untouched.
pub async fn handle_delete_candidate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteCandidateResponse>, AppError> {
    let deleted = state
        .store
        .delete(&id)
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))?;

    Ok(Json(DeleteCandidateResponse {
        message: format!("Successfully deleted candidate: {}", deleted.name),
        deleted_candidate: DeletedCandidate {
            id: deleted.id,
            name: deleted.name,
        },
    }))
}

/// DELETE /api/candidates
pub async fn handle_clear_candidates(
    State(state): State<AppState>,
) -> Result<Json<ClearCandidatesResponse>, AppError> {
    let count = state.store.clear();
    Ok(Json(ClearCandidatesResponse {
        message: format!("Successfully cleared {count} candidates"),
        total_candidates: 0,
    }))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(e.body_text())
    }
}
