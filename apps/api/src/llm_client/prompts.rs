// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("valid placeholder regex"));

/// Sampling temperature for every completion issued through `TextGenerator`.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// System prompt fragment that enforces plain prose output.
pub const PLAIN_TEXT_SYSTEM: &str = "You are a precise recruiting assistant. \
    Respond in plain text only. \
    Do NOT use markdown, bullet symbols, headings, LaTeX or code fences. \
    Do NOT include preambles, explanations or apologies.";

/// Substitutes `{key}` placeholders in a prompt template in a single pass.
/// Substituted values are never rescanned, so user text containing
/// `{placeholder}` is inserted verbatim.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| {
            values
                .iter()
                .find(|(key, _)| *key == &caps[1])
                .map_or_else(|| caps[0].to_string(), |(_, value)| value.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template_replaces_every_occurrence() {
        let filled = fill_template("{a} and {b} and {a}", &[("a", "x"), ("b", "y")]);
        assert_eq!(filled, "x and y and x");
    }

    #[test]
    fn test_fill_template_leaves_unknown_placeholders() {
        assert_eq!(fill_template("{missing}", &[("a", "x")]), "{missing}");
    }

    #[test]
    fn test_fill_template_does_not_rescan_values() {
        let filled = fill_template(
            "JD: {job_description} / CV: {resume_text}",
            &[
                ("resume_text", "see {job_description}"),
                ("job_description", "Rust engineer"),
            ],
        );
        assert_eq!(filled, "JD: Rust engineer / CV: see {job_description}");
    }
}
