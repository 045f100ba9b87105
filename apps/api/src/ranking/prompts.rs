// All LLM prompt constants for the ranking pipeline.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Ideal-candidate prompt. Replace `{job_description}` before sending.
pub const IDEAL_CANDIDATE_PROMPT_TEMPLATE: &str = r#"Several candidates are being evaluated for the job position below. To calibrate their scores, imagine the ideal candidate who satisfies every requirement of the job perfectly; this candidate is the upper bound of the evaluation.

Write a résumé-style description of that ideal candidate in plain prose: professional summary, experience, skills and education. Do not mention that the candidate is hypothetical.

JOB DESCRIPTION:
{job_description}"#;

/// Per-candidate summary prompt. Replace `{job_description}` and `{resume_text}`.
pub const CANDIDATE_SUMMARY_PROMPT_TEMPLATE: &str = r#"Given the job description and the candidate résumé below, write one paragraph of plain text summarizing the candidate's qualifications and stating whether and where they match or miss the job requirements.

JOB DESCRIPTION:
{job_description}

CANDIDATE RÉSUMÉ:
{resume_text}"#;
