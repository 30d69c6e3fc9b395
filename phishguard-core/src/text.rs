//! Text Threat Detector
//!
//! Rule-based psychological-manipulation detection over a message body.
//! Six indicator categories are scanned in catalog order; each fires at
//! most once and contributes its fixed weight. An optional statistical
//! classifier can add a tightly gated secondary boost - rule evidence is
//! authoritative, the probabilistic signal only compensates for messages
//! the catalog missed and never overrides a rule-derived score.

use crate::bridge::TextClassifier;
use crate::policy::DetectionPolicy;
use crate::verdict::{ChannelResult, EvidenceItem};
use std::sync::Arc;

// ============================================================================
// BOOST GATE (fixed - the ordering of rules over ML is an invariant)
// ============================================================================

/// Classifier probability required before the boost applies
pub const ML_CONFIDENCE_MIN: f32 = 0.70;

/// Boost only applies when the rule score is below this
pub const ML_PRIMARY_CEILING: f32 = 40.0;

/// Maximum boost the classifier can add
pub const ML_BOOST_CAP: f32 = 30.0;

/// Above this probability an unused signal is still worth an advisory note
pub const ML_ADVISORY_MIN: f32 = 0.5;

/// Evidence-snippet window: characters kept around the match
const SNIPPET_BEFORE: usize = 10;
const SNIPPET_AFTER: usize = 30;

/// Reason strings truncate the snippet at this many characters
const REASON_SNIPPET_MAX: usize = 60;

// ============================================================================
// DETECTOR
// ============================================================================

pub struct TextThreatDetector {
    policy: Arc<DetectionPolicy>,
    classifier: Option<Arc<dyn TextClassifier>>,
}

impl TextThreatDetector {
    pub fn new(
        policy: Arc<DetectionPolicy>,
        classifier: Option<Arc<dyn TextClassifier>>,
    ) -> Self {
        Self { policy, classifier }
    }

    /// Score one text body. Total: always returns a valid result,
    /// classifier failure degrades silently to primary-only scoring.
    pub fn analyze(&self, text: &str) -> ChannelResult {
        if text.is_empty() {
            return ChannelResult::default();
        }

        // Match on a lowered copy, slice evidence from the original
        let lower = text.to_lowercase();
        let mut primary = 0.0f32;
        let mut evidence: Vec<EvidenceItem> = Vec::new();

        for category in &self.policy.text_categories {
            if let Some((start, end)) = first_match(&lower, &category.triggers) {
                primary += category.weight;
                evidence.push(EvidenceItem {
                    indicator: category.label.clone(),
                    snippet: extract_snippet(text, start, end),
                    rationale: category.rationale.clone(),
                    weight: category.weight,
                });
            }
        }

        let (boost, advisory) = self.ml_boost(text, primary, &mut evidence);
        let score = (primary + boost).clamp(0.0, 100.0);

        let mut reasons: Vec<String> = evidence
            .iter()
            .map(|item| {
                format!(
                    "{} (+{:.0} risk): {}",
                    item.indicator,
                    item.weight,
                    truncate_chars(&item.snippet, REASON_SNIPPET_MAX)
                )
            })
            .collect();
        if let Some(note) = advisory {
            reasons.push(note);
        }

        log::debug!(
            "text analysis: primary={:.1} boost={:.1} score={:.1}",
            primary,
            boost,
            score
        );

        ChannelResult {
            score,
            reasons,
            evidence,
        }
    }

    /// Gated secondary boost from the statistical classifier.
    ///
    /// Applies only when the classifier is confident (> 0.70) AND the
    /// rule score is low (< 40). Returns the boost and an optional
    /// advisory note for a present-but-unused signal.
    fn ml_boost(
        &self,
        text: &str,
        primary: f32,
        evidence: &mut Vec<EvidenceItem>,
    ) -> (f32, Option<String>) {
        let classifier = match &self.classifier {
            Some(c) => c,
            None => return (0.0, None),
        };

        let p = match classifier.malicious_probability(text) {
            Ok(p) => p.clamp(0.0, 1.0),
            Err(e) => {
                log::debug!("text classifier unavailable, primary-only scoring: {}", e);
                return (0.0, None);
            }
        };

        if p > ML_CONFIDENCE_MIN && primary < ML_PRIMARY_CEILING {
            let boost = (p * ML_BOOST_CAP).min(ML_BOOST_CAP);
            evidence.push(EvidenceItem {
                indicator: "ML Pattern Recognition".to_string(),
                snippet: format!("model confidence: {}%", percent(p)),
                rationale: "Statistical model detected linguistic patterns consistent with phishing"
                    .to_string(),
                weight: boost,
            });
            (boost, None)
        } else if p > ML_ADVISORY_MIN {
            (
                0.0,
                Some(format!(
                    "ML classifier: {}% confidence (not used - rule indicators sufficient)",
                    percent(p)
                )),
            )
        } else {
            (0.0, None)
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// First trigger that matches anywhere in the lowered text, with its
/// byte offsets. First trigger wins within a category.
fn first_match(lower: &str, triggers: &[String]) -> Option<(usize, usize)> {
    for trigger in triggers {
        let needle = trigger.to_lowercase();
        if needle.is_empty() {
            continue;
        }
        if let Some(idx) = lower.find(&needle) {
            return Some((idx, idx + needle.len()));
        }
    }
    None
}

/// Slice a context window from the original-case text around a match,
/// clamped to the text bounds and adjusted to char boundaries. Ellipses
/// mark each clamped side.
fn extract_snippet(original: &str, start: usize, end: usize) -> String {
    let mut s = start.min(original.len()).saturating_sub(SNIPPET_BEFORE);
    let mut e = (end + SNIPPET_AFTER).min(original.len());
    while s > 0 && !original.is_char_boundary(s) {
        s -= 1;
    }
    while e < original.len() && !original.is_char_boundary(e) {
        e += 1;
    }

    let mut snippet = original[s..e].trim().to_string();
    if s > 0 {
        snippet = format!("...{}", snippet);
    }
    if e < original.len() {
        snippet = format!("{}...", snippet);
    }
    snippet
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

fn percent(p: f32) -> u32 {
    (p * 100.0).round() as u32
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BridgeError;

    struct FixedClassifier(f32);
    impl TextClassifier for FixedClassifier {
        fn malicious_probability(&self, _text: &str) -> Result<f32, BridgeError> {
            Ok(self.0)
        }
    }

    struct BrokenClassifier;
    impl TextClassifier for BrokenClassifier {
        fn malicious_probability(&self, _text: &str) -> Result<f32, BridgeError> {
            Err(BridgeError::Unavailable("model not loaded".into()))
        }
    }

    fn detector(classifier: Option<Arc<dyn TextClassifier>>) -> TextThreatDetector {
        TextThreatDetector::new(Arc::new(DetectionPolicy::default()), classifier)
    }

    #[test]
    fn test_empty_text_scores_zero() {
        let result = detector(None).analyze("");
        assert_eq!(result.score, 0.0);
        assert!(result.evidence.is_empty());
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_category_fires_once_not_per_occurrence() {
        // "urgent" appears twice, still one urgency evidence item at +20
        let result = detector(None).analyze("Urgent! This is urgent business.");
        assert_eq!(result.score, 20.0);
        assert_eq!(result.evidence.len(), 1);
        assert_eq!(result.evidence[0].indicator, "Urgency / Time Pressure");
        assert_eq!(result.evidence[0].weight, 20.0);
    }

    #[test]
    fn test_categories_are_additive() {
        // urgency (+20) + fear (+25)
        let result = detector(None).analyze("URGENT: your account was suspended");
        assert_eq!(result.score, 45.0);
        assert_eq!(result.evidence.len(), 2);
    }

    #[test]
    fn test_snippet_preserves_original_case() {
        let result = detector(None).analyze("Act IMMEDIATELY or lose access");
        assert!(result.evidence[0].snippet.contains("IMMEDIATELY"));
    }

    #[test]
    fn test_snippet_clamped_window_gets_ellipses() {
        let text = format!("{} suspended {}", "a".repeat(40), "b".repeat(60));
        let result = detector(None).analyze(&text);
        let snippet = &result.evidence[0].snippet;
        assert!(snippet.starts_with("..."), "snippet: {}", snippet);
        assert!(snippet.ends_with("..."), "snippet: {}", snippet);
    }

    #[test]
    fn test_snippet_at_text_start_has_no_leading_ellipsis() {
        let result = detector(None).analyze("urgent");
        assert_eq!(result.evidence[0].snippet, "urgent");
    }

    #[test]
    fn test_reason_format() {
        let result = detector(None).analyze("urgent");
        assert_eq!(
            result.reasons[0],
            "Urgency / Time Pressure (+20 risk): urgent"
        );
    }

    #[test]
    fn test_boost_applies_when_confident_and_rules_quiet() {
        // No rule category fires; classifier at 0.9 adds 27
        let result = detector(Some(Arc::new(FixedClassifier(0.9))))
            .analyze("greetings friend, wonderful weather lately");
        assert_eq!(result.score, 27.0);
        assert!(result
            .evidence
            .iter()
            .any(|e| e.indicator == "ML Pattern Recognition"));
    }

    #[test]
    fn test_boost_suppressed_when_rules_already_fired() {
        // urgency + fear = 45 >= 40, boost must not apply
        let result = detector(Some(Arc::new(FixedClassifier(0.95))))
            .analyze("URGENT: your account was suspended");
        assert_eq!(result.score, 45.0);
        assert!(!result
            .evidence
            .iter()
            .any(|e| e.indicator == "ML Pattern Recognition"));
        // Signal was present, so the advisory note is appended
        assert!(result
            .reasons
            .iter()
            .any(|r| r.contains("not used")));
    }

    #[test]
    fn test_no_advisory_below_half_probability() {
        let result = detector(Some(Arc::new(FixedClassifier(0.3))))
            .analyze("URGENT: your account was suspended");
        assert_eq!(result.score, 45.0);
        assert!(!result.reasons.iter().any(|r| r.contains("not used")));
    }

    #[test]
    fn test_classifier_failure_degrades_silently() {
        let result =
            detector(Some(Arc::new(BrokenClassifier))).analyze("urgent meeting request");
        assert_eq!(result.score, 20.0);
    }

    #[test]
    fn test_long_snippet_truncated_in_reason_not_in_evidence() {
        // Window is 10 before + trigger + 30 after; with a long trigger and
        // both ellipses the snippet exceeds the 60-char reason limit
        let text = format!("{} verification required {}", "x".repeat(20), "y".repeat(60));
        let result = detector(None).analyze(&text);
        assert!(result.evidence[0].snippet.chars().count() > REASON_SNIPPET_MAX);
        assert!(result.reasons[0].ends_with("..."));
        let reason_snippet = result.reasons[0].split(": ").nth(1).unwrap();
        assert_eq!(reason_snippet.chars().count(), REASON_SNIPPET_MAX + 3);
    }
}
