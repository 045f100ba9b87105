//! Per-candidate qualification summaries, fanned out with a concurrency cap.
//!
//! Each call's outcome is captured separately: one failed summary never
//! affects the others or the ranking itself.

use futures::stream::{self, StreamExt};
use tracing::warn;

use crate::llm_client::prompts::{fill_template, PLAIN_TEXT_SYSTEM};
use crate::llm_client::{LlmError, TextGenerator};
use crate::ranking::prompts::CANDIDATE_SUMMARY_PROMPT_TEMPLATE;

pub fn build_summary_prompt(job_description: &str, resume_text: &str) -> String {
    fill_template(
        CANDIDATE_SUMMARY_PROMPT_TEMPLATE,
        &[("resume_text", resume_text), ("job_description", job_description)],
    )
}

/// Summarizes every résumé against the job description with at most
/// `concurrency` calls in flight. Output order matches `resume_texts`.
pub async fn summarize_all(
    llm: &dyn TextGenerator,
    job_description: &str,
    resume_texts: &[&str],
    concurrency: usize,
) -> Vec<Result<String, LlmError>> {
    // Built eagerly: a closure-mapped stream borrowing `llm` is not `Send`.
    let calls: Vec<_> = resume_texts
        .iter()
        .map(|resume_text| {
            let prompt = build_summary_prompt(job_description, resume_text);
            async move {
                let outcome = llm.complete(&prompt, PLAIN_TEXT_SYSTEM).await;
                if let Err(e) = &outcome {
                    warn!("Candidate summary failed: {e}");
                }
                outcome
            }
        })
        .collect();

    stream::iter(calls)
        .buffered(concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Records peak concurrency; fails any résumé containing "FAIL".
    struct SlowLlm {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl SlowLlm {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for SlowLlm {
        async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if prompt.contains("FAIL") {
                Err(LlmError::EmptyContent)
            } else {
                let resume = prompt.rsplit("CANDIDATE RÉSUMÉ:\n").next().unwrap_or_default();
                Ok(format!("summary of {resume}"))
            }
        }
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn test_fan_out_future_is_send() {
        let llm = SlowLlm::new();
        let resumes = ["a", "b"];
        let fut = summarize_all(&llm, "jd", &resumes, 2);
        assert_send(&fut);
    }

    #[test]
    fn test_prompt_includes_both_inputs() {
        let prompt = build_summary_prompt("Senior Python engineer", "Django, 5 years");
        assert!(prompt.contains("Senior Python engineer"));
        assert!(prompt.contains("Django, 5 years"));
    }

    #[test]
    fn test_braces_in_resume_are_kept_verbatim() {
        let prompt = build_summary_prompt("Rust engineer", "Wrote {job_description} parser");
        assert!(prompt.contains("Wrote {job_description} parser"));
        assert_eq!(prompt.matches("Rust engineer").count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_is_bounded() {
        let llm = SlowLlm::new();
        let resumes: Vec<String> = (0..10).map(|i| format!("resume {i}")).collect();
        let refs: Vec<&str> = resumes.iter().map(String::as_str).collect();

        let results = summarize_all(&llm, "jd", &refs, 3).await;

        assert_eq!(results.len(), 10);
        assert_eq!(llm.peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_keep_input_order() {
        let llm = SlowLlm::new();
        let results = summarize_all(&llm, "jd", &["first", "second", "third"], 2).await;
        let texts: Vec<String> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(
            texts,
            vec!["summary of first", "summary of second", "summary of third"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_failure_is_isolated() {
        let llm = SlowLlm::new();
        let results = summarize_all(&llm, "jd", &["ok one", "FAIL", "ok two"], 4).await;
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(LlmError::EmptyContent)));
        assert!(results[2].is_ok());
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_progresses() {
        let llm = SlowLlm::new();
        let results = summarize_all(&llm, "jd", &["only"], 0).await;
        assert_eq!(results.len(), 1);
    }
}
