use chrono::{DateTime, Utc};
use serde::Serialize;

const PREVIEW_CHARS: usize = 200;

/// A candidate held in memory for the session.
///
/// `embedding` is computed once at ingestion from `resume_text` and never
/// recomputed unless the résumé changes. Candidates without one are skipped
/// by the ranking engine.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    /// Free-form text supplied alongside the document.
    pub info: String,
    /// Raw résumé payload as submitted (base64 document or plain text).
    #[serde(skip_serializing)]
    pub resume: String,
    /// `info` followed by the extracted document text.
    pub resume_text: String,
    #[serde(skip_serializing)]
    pub embedding: Option<Vec<f32>>,
    /// Ingestion-time heuristic summary.
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

/// Listing view returned by `GET /api/candidates`.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateInfo {
    pub id: String,
    pub name: String,
    pub summary: String,
    pub resume_preview: String,
}

impl Candidate {
    pub fn info(&self) -> CandidateInfo {
        CandidateInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            summary: self.summary.clone(),
            resume_preview: preview(&self.resume_text),
        }
    }
}

/// First 200 characters, with an ellipsis when the text was cut.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_preview_is_unchanged() {
        assert_eq!(preview("Python engineer"), "Python engineer");
    }

    #[test]
    fn test_exactly_200_chars_has_no_ellipsis() {
        let text = "a".repeat(200);
        assert_eq!(preview(&text), text);
    }

    #[test]
    fn test_long_text_preview_is_truncated() {
        let text = "é".repeat(250);
        let p = preview(&text);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), 203);
    }
}
