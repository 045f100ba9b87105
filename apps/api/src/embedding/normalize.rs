//! Text cleanup applied to every string before it reaches an embedding model.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

// Keeps word characters, whitespace and `. , ! ? ; : - ( )`.
static DISALLOWED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s.,!?;:\-()]").expect("valid punctuation regex"));

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Strips markup tags and non-semantic characters, collapses whitespace runs
/// to single spaces and trims. Never fails; empty input yields empty output.
pub fn normalize_text(text: &str) -> String {
    let without_tags = TAG_RE.replace_all(text, "");
    let allowed = DISALLOWED_RE.replace_all(&without_tags, "");
    WHITESPACE_RE.replace_all(&allowed, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_html_tags() {
        assert_eq!(
            normalize_text("<p>Senior <b>Rust</b> engineer</p>"),
            "Senior Rust engineer"
        );
    }

    #[test]
    fn test_removes_characters_outside_allow_list() {
        assert_eq!(
            normalize_text("C++ & Go @ scale: 99% uptime (SRE) - remote!"),
            "C Go scale: 99 uptime (SRE) - remote!"
        );
    }

    #[test]
    fn test_keeps_allowed_punctuation() {
        let text = "Skills: Python, SQL; Docker (basic). Available? Yes!";
        assert_eq!(normalize_text(text), text);
    }

    #[test]
    fn test_collapses_whitespace_and_trims() {
        assert_eq!(normalize_text("  a\n\n\tb   c  "), "a b c");
    }

    #[test]
    fn test_keeps_unicode_letters() {
        assert_eq!(normalize_text("Zoë Müller — 数据工程师"), "Zoë Müller 数据工程师");
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("<br/> <hr>"), "");
    }
}
