// Candidate ranking pipeline.
// Implements: ideal-candidate anchor, anchor-normalized similarity scoring,
// bounded-concurrency LLM summaries, stable top-k selection.
// All LLM calls go through llm_client::TextGenerator.

pub mod anchor;
pub mod engine;
pub mod handlers;
pub mod prompts;
pub mod summary;

pub use engine::{MatchResult, RankingEngine, RankingSettings};

/// Whether `min_similarity` removes low-scoring candidates.
///
/// `Disabled` keeps every scored candidate regardless of threshold, which is
/// the behavior existing callers rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdMode {
    #[default]
    Disabled,
    Enforced,
}

/// How raw cosine similarity is divided by the anchor similarity when the
/// anchor similarity is close to zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizationPolicy {
    /// Divide by the anchor similarity, pushed away from zero to at least `floor`
    /// in magnitude (sign preserved, zero counts as positive).
    ClampDenominator { floor: f32 },
    /// Divide by the anchor similarity unless its magnitude is below `floor`,
    /// in which case the raw cosine similarity is reported unchanged.
    RawFallback { floor: f32 },
}

impl Default for NormalizationPolicy {
    fn default() -> Self {
        Self::ClampDenominator { floor: 1e-3 }
    }
}

impl NormalizationPolicy {
    pub fn normalize(&self, raw: f32, anchor_similarity: f32) -> f32 {
        match *self {
            NormalizationPolicy::ClampDenominator { floor } => {
                let floor = floor.abs().max(f32::EPSILON);
                let denominator = if anchor_similarity.abs() >= floor {
                    anchor_similarity
                } else if anchor_similarity < 0.0 {
                    -floor
                } else {
                    floor
                };
                raw / denominator
            }
            NormalizationPolicy::RawFallback { floor } => {
                let floor = floor.abs().max(f32::EPSILON);
                if anchor_similarity.abs() < floor {
                    raw
                } else {
                    raw / anchor_similarity
                }
            }
        }
    }
}

/// Upper bound on the anchor text length before it is embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorTruncation {
    /// Longest `resume_text` in the batch, in characters.
    #[default]
    LongestResume,
    Fixed(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_divides_normally_above_floor() {
        let policy = NormalizationPolicy::ClampDenominator { floor: 0.01 };
        assert!((policy.normalize(0.4, 0.8) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_guards_zero_denominator() {
        let policy = NormalizationPolicy::ClampDenominator { floor: 0.01 };
        let score = policy.normalize(0.5, 0.0);
        assert!(score.is_finite());
        assert!((score - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_clamp_preserves_negative_sign() {
        let policy = NormalizationPolicy::ClampDenominator { floor: 0.01 };
        assert!((policy.normalize(0.5, -0.001) + 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_clamp_with_zero_floor_stays_finite() {
        let policy = NormalizationPolicy::ClampDenominator { floor: 0.0 };
        assert!(policy.normalize(0.5, 0.0).is_finite());
    }

    #[test]
    fn test_raw_fallback_below_floor() {
        let policy = NormalizationPolicy::RawFallback { floor: 0.01 };
        assert_eq!(policy.normalize(0.37, 0.0001), 0.37);
        assert!((policy.normalize(0.4, 0.8) - 0.5).abs() < 1e-6);
    }
}
