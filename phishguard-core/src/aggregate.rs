//! Signal Aggregator
//!
//! Orchestrates the channel detectors and fuses their scores into one
//! verdict. Fusion is max-plus-escalation: the single worst channel sets
//! a floor, and correlated multi-channel activity raises it further. The
//! floor is never decreased - weighted averaging would dilute the worst
//! signal and is deliberately not used here.
//!
//! The whole pipeline is a pure function of its inputs and the immutable
//! policy; there is no cross-request state.

use crate::bridge::{ImageClassifier, TextClassifier};
use crate::policy::DetectionPolicy;
use crate::text::TextThreatDetector;
use crate::url::UrlThreatDetector;
use crate::verdict::{ChannelResult, RiskTier, UnifiedVerdict, Verdict};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

// ============================================================================
// FUSION CONSTANTS (fixed policy, see verdict.rs for tier thresholds)
// ============================================================================

/// A channel scoring above this counts as active for escalation
pub const ACTIVE_CHANNEL_FLOOR: f32 = 30.0;

/// Added when exactly two channels are active
pub const TWO_CHANNEL_ESCALATION: f32 = 15.0;

/// Added when all three channels are active
pub const THREE_CHANNEL_ESCALATION: f32 = 25.0;

/// Embedded links: scheme up to the next whitespace/quote/bracket
static EMBEDDED_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s)"'<>]+"#).unwrap());

/// Pull candidate links out of free text by lexical scanning.
pub fn extract_urls(text: &str) -> Vec<String> {
    EMBEDDED_URL
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

// ============================================================================
// AGGREGATOR
// ============================================================================

pub struct SignalAggregator {
    policy: Arc<DetectionPolicy>,
    text_detector: TextThreatDetector,
    url_detector: UrlThreatDetector,
    image_classifier: Option<Arc<dyn ImageClassifier>>,
}

impl SignalAggregator {
    /// Engine with no statistical collaborators: rule-only scoring,
    /// image channel permanently at zero.
    pub fn new(policy: DetectionPolicy) -> Self {
        Self::with_collaborators(policy, None, None)
    }

    pub fn with_collaborators(
        policy: DetectionPolicy,
        text_classifier: Option<Arc<dyn TextClassifier>>,
        image_classifier: Option<Arc<dyn ImageClassifier>>,
    ) -> Self {
        let policy = Arc::new(policy);
        Self {
            text_detector: TextThreatDetector::new(policy.clone(), text_classifier),
            url_detector: UrlThreatDetector::new(policy.clone()),
            image_classifier,
            policy,
        }
    }

    /// Analyze one message: free text, explicit URLs, encoded images.
    /// Total: always produces a verdict, per-item failures are isolated.
    pub fn analyze(&self, text: &str, urls: &[String], images_b64: &[String]) -> UnifiedVerdict {
        // 1. Consolidate URLs: explicit list unioned with links embedded
        // in the text, deduplicated by exact string
        let consolidated = consolidate_urls(text, urls);

        // 2. Score each channel
        let text_result = self.text_detector.analyze(text);

        let url_results: Vec<ChannelResult> = consolidated
            .iter()
            .map(|u| self.url_detector.analyze(u))
            .collect();
        let url_score = max_score(&url_results);

        let image_results: Vec<ChannelResult> = images_b64
            .iter()
            .map(|img| self.analyze_image(img))
            .collect();
        let image_score = max_score(&image_results);

        // 3. Fuse: worst channel sets the floor, correlation escalates
        let base = text_result.score.max(url_score).max(image_score);
        let active = [text_result.score, url_score, image_score]
            .iter()
            .filter(|&&s| s > ACTIVE_CHANNEL_FLOOR)
            .count();
        let escalation = match active {
            0 | 1 => 0.0,
            2 => TWO_CHANNEL_ESCALATION,
            _ => THREE_CHANNEL_ESCALATION,
        };
        let unified_risk = (base + escalation).clamp(0.0, 100.0);

        // 4. Classify
        let risk_tier = RiskTier::from_score(unified_risk);
        let verdict = Verdict::from_tier(risk_tier);

        // 5. Explainability
        let mut all_reasons: Vec<&String> = Vec::new();
        let mut evidence = Vec::new();
        for result in std::iter::once(&text_result)
            .chain(url_results.iter())
            .chain(image_results.iter())
        {
            all_reasons.extend(result.reasons.iter());
            evidence.extend(result.evidence.iter().cloned());
        }

        let factors = dedup_first_seen(&all_reasons);
        let warnings = self.classify_warnings(&factors);
        let summary = build_summary(
            text_result.score,
            url_score,
            image_score,
            risk_tier,
        );

        log::debug!(
            "unified verdict: base={:.1} active={} escalation={:.0} -> {:.1} ({})",
            base,
            active,
            escalation,
            unified_risk,
            risk_tier
        );

        UnifiedVerdict {
            unified_risk,
            text_score: text_result.score,
            url_score,
            image_score,
            risk_tier,
            verdict,
            factors,
            warnings,
            evidence,
            summary,
        }
    }

    /// One image through the collaborator; absence or failure is a
    /// zero-score channel for that image only.
    fn analyze_image(&self, image_b64: &str) -> ChannelResult {
        let classifier = match &self.image_classifier {
            Some(c) => c,
            None => return ChannelResult::default(),
        };
        match classifier.analyze_image(image_b64) {
            Ok(mut result) => {
                result.score = result.score.clamp(0.0, 100.0);
                result
            }
            Err(e) => {
                log::warn!("image collaborator failed, scoring image as 0: {}", e);
                ChannelResult::default()
            }
        }
    }

    /// Factors containing an alarm keyword, case-insensitive.
    fn classify_warnings(&self, factors: &[String]) -> Vec<String> {
        factors
            .iter()
            .filter(|f| {
                let lower = f.to_lowercase();
                self.policy
                    .alarm_keywords
                    .iter()
                    .any(|k| lower.contains(&k.to_lowercase()))
            })
            .cloned()
            .collect()
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Explicit URLs unioned with links extracted from the text, first-seen
/// order, exact-string dedup. A URL present in both counts once.
fn consolidate_urls(text: &str, urls: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut consolidated = Vec::new();
    for u in urls.iter().cloned().chain(extract_urls(text)) {
        if seen.insert(u.clone()) {
            consolidated.push(u);
        }
    }
    consolidated
}

/// Worst item dominates: max over per-item results, 0 when empty.
fn max_score(results: &[ChannelResult]) -> f32 {
    results.iter().map(|r| r.score).fold(0.0, f32::max)
}

fn dedup_first_seen(reasons: &[&String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for r in reasons {
        if seen.insert(r.as_str()) {
            out.push((*r).clone());
        }
    }
    out
}

/// Narrative summary: one clause per channel above the activity floor,
/// in fixed channel order, plus the overall tier.
fn build_summary(text_score: f32, url_score: f32, image_score: f32, tier: RiskTier) -> String {
    let channels = [
        ("Text", text_score),
        ("URL", url_score),
        ("Image", image_score),
    ];
    let clauses: Vec<String> = channels
        .iter()
        .filter(|(_, score)| *score > ACTIVE_CHANNEL_FLOOR)
        .map(|(name, score)| {
            format!("{} analysis flagged indicators (score: {:.0}/100)", name, score)
        })
        .collect();

    if clauses.is_empty() {
        "No significant indicators detected.".to_string()
    } else {
        format!(
            "{}. Overall risk assessed as {}.",
            clauses.join(". "),
            tier.as_str()
        )
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
