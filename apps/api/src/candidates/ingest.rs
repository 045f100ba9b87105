//! Ingestion: normalizes JSON submissions and file uploads into `Candidate`
//! records, embedding each one exactly once.

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::candidates::extract::extract_text_from_base64;
use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::models::Candidate;

const SUMMARY_KEYWORDS: [&str; 6] = ["experience", "skills", "education", "project", "work", "job"];
const SUMMARY_MIN_LINE_CHARS: usize = 10;
const SUMMARY_MAX_LINES: usize = 3;

/// A candidate as submitted in JSON. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub info: Option<String>,
    /// Base64-encoded résumé document (PDF or UTF-8 text).
    pub resume: Option<String>,
}

/// A candidate whose text is resolved but not yet embedded.
#[derive(Debug, Clone)]
pub struct PreparedCandidate {
    pub id: String,
    pub name: String,
    pub info: String,
    pub resume: String,
    pub document_text: String,
}

impl PreparedCandidate {
    /// `info` and the document text, newline-separated. This is what gets embedded.
    pub fn resume_text(&self) -> String {
        format!("{}\n{}", self.info, self.document_text)
    }
}

/// Resolves ids, default names and document text for a JSON submission.
pub fn prepare_json(input: CandidateInput) -> PreparedCandidate {
    let id = non_blank(input.id).unwrap_or_else(|| Uuid::new_v4().to_string());
    let name = non_blank(input.name).unwrap_or_else(|| default_name(&id));
    let resume = input.resume.unwrap_or_default();
    let document_text = if resume.is_empty() {
        String::new()
    } else {
        extract_text_from_base64(&resume).trim().to_string()
    };

    PreparedCandidate {
        id,
        name,
        info: input.info.unwrap_or_default(),
        resume,
        document_text,
    }
}

/// Builds a candidate from an uploaded file; the file stem becomes the name.
pub fn prepare_upload(filename: &str, text: String) -> PreparedCandidate {
    let id = Uuid::new_v4().to_string();
    let stem = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .map(|base| base.rsplit_once('.').map_or(base, |(stem, _)| stem))
        .unwrap_or_default()
        .trim()
        .to_string();
    let name = if stem.is_empty() { default_name(&id) } else { stem };

    PreparedCandidate {
        id,
        name,
        info: String::new(),
        resume: text.clone(),
        document_text: text,
    }
}

/// Embeds prepared candidates in one batch and assembles the final records.
/// An embedding failure rejects the whole batch; nothing is half-ingested.
pub async fn embed_candidates(
    prepared: Vec<PreparedCandidate>,
    embedder: &dyn EmbeddingProvider,
) -> Result<Vec<Candidate>, EmbeddingError> {
    if prepared.is_empty() {
        return Ok(Vec::new());
    }

    let texts: Vec<String> = prepared.iter().map(PreparedCandidate::resume_text).collect();
    let embeddings = embedder.embed_batch(&texts).await?;
    debug!(count = embeddings.len(), "Candidate embeddings computed");

    let created_at = Utc::now();
    let candidates: Vec<Candidate> = prepared
        .into_iter()
        .zip(texts)
        .zip(embeddings)
        .map(|((p, resume_text), embedding)| Candidate {
            summary: heuristic_summary(&p.name, &p.document_text),
            id: p.id,
            name: p.name,
            info: p.info,
            resume: p.resume,
            resume_text,
            embedding: Some(embedding),
            created_at,
        })
        .collect();

    info!("Ingested {} candidates", candidates.len());
    Ok(candidates)
}

/// Quick keyword-based blurb shown in candidate listings before any LLM summary exists.
pub fn heuristic_summary(name: &str, document_text: &str) -> String {
    let key_lines: Vec<&str> = document_text
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            SUMMARY_KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
        .map(str::trim)
        .filter(|line| line.chars().count() > SUMMARY_MIN_LINE_CHARS)
        .take(SUMMARY_MAX_LINES)
        .collect();

    if key_lines.is_empty() {
        format!("{name} is a qualified candidate with relevant background.")
    } else {
        format!("{name} has relevant experience in: {}", key_lines.join("; "))
    }
}

fn default_name(id: &str) -> String {
    let short: String = id.chars().take(8).collect();
    format!("Candidate_{short}")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
