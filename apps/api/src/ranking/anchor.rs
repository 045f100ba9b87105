//! Ideal-candidate anchor: a synthesized "perfect" résumé used to calibrate
//! similarity scores to the job description's own scale.

use tracing::{debug, info};

use crate::llm_client::prompts::{fill_template, PLAIN_TEXT_SYSTEM};
use crate::llm_client::{LlmError, TextGenerator};
use crate::models::Candidate;
use crate::ranking::prompts::IDEAL_CANDIDATE_PROMPT_TEMPLATE;
use crate::ranking::AnchorTruncation;

/// Asks the LLM for the ideal candidate's résumé. Errors propagate: the
/// anchor has no fallback, so a failure here aborts the ranking request
/// (after the client's own retries).
pub async fn generate_anchor(
    job_description: &str,
    llm: &dyn TextGenerator,
) -> Result<String, LlmError> {
    let prompt = fill_template(
        IDEAL_CANDIDATE_PROMPT_TEMPLATE,
        &[("job_description", job_description)],
    );
    let anchor = llm.complete(&prompt, PLAIN_TEXT_SYSTEM).await?;
    info!("Ideal-candidate anchor generated ({} chars)", anchor.chars().count());
    Ok(anchor)
}

/// Character budget for the anchor given the current batch.
pub fn anchor_char_limit(truncation: AnchorTruncation, candidates: &[Candidate]) -> usize {
    match truncation {
        AnchorTruncation::Fixed(limit) => limit,
        AnchorTruncation::LongestResume => candidates
            .iter()
            .map(|c| c.resume_text.chars().count())
            .max()
            .unwrap_or(0),
    }
}

/// Cuts `anchor` to at most `limit` characters on a char boundary.
pub fn truncate_anchor(anchor: &str, limit: usize) -> &str {
    match anchor.char_indices().nth(limit) {
        Some((byte_idx, _)) => {
            debug!(limit, "Anchor truncated");
            &anchor[..byte_idx]
        }
        None => anchor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;

    struct EchoPrompt {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for EchoPrompt {
        async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
            self.seen.lock().push(prompt.to_string());
            Ok("Ideal: 10 years of Rust".to_string())
        }
    }

    struct Failing;

    #[async_trait]
    impl TextGenerator for Failing {
        async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            Err(LlmError::Api {
                status: 400,
                message: "bad request".to_string(),
            })
        }
    }

    fn candidate(resume_text: &str) -> Candidate {
        Candidate {
            id: "id".to_string(),
            name: "name".to_string(),
            info: String::new(),
            resume: String::new(),
            resume_text: resume_text.to_string(),
            embedding: None,
            summary: String::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_prompt_contains_job_description() {
        let llm = EchoPrompt {
            seen: Mutex::new(Vec::new()),
        };
        let anchor = generate_anchor("Staff Rust engineer", &llm).await.unwrap();
        assert_eq!(anchor, "Ideal: 10 years of Rust");
        let seen = llm.seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("Staff Rust engineer"));
        assert!(!seen[0].contains("{job_description}"));
    }

    #[tokio::test]
    async fn test_llm_failure_propagates() {
        let err = generate_anchor("anything", &Failing).await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 400, .. }));
    }

    #[test]
    fn test_limit_is_longest_resume_in_chars() {
        let batch = vec![candidate("short"), candidate("ééééééé"), candidate("mid size")];
        assert_eq!(anchor_char_limit(AnchorTruncation::LongestResume, &batch), 8);
    }

    #[test]
    fn test_fixed_limit_ignores_batch() {
        let batch = vec![candidate("short")];
        assert_eq!(anchor_char_limit(AnchorTruncation::Fixed(1000), &batch), 1000);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_anchor("héllo wörld", 4), "héll");
        assert_eq!(truncate_anchor("short", 100), "short");
        assert_eq!(truncate_anchor("anything", 0), "");
    }
}
