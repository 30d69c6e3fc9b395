//! End-to-end scenarios for the signal aggregator.

use phishguard_core::{
    BridgeError, ChannelResult, DetectionPolicy, EvidenceItem, ImageClassifier, RiskTier,
    SignalAggregator, TextClassifier, Verdict,
};
use std::sync::Arc;

fn engine() -> SignalAggregator {
    SignalAggregator::new(DetectionPolicy::default())
}

struct StubImageClassifier(f32);
impl ImageClassifier for StubImageClassifier {
    fn analyze_image(&self, _image_b64: &str) -> Result<ChannelResult, BridgeError> {
        Ok(ChannelResult {
            score: self.0,
            reasons: vec!["Login form detected in image".to_string()],
            evidence: vec![EvidenceItem {
                indicator: "Login Form Screenshot".to_string(),
                snippet: "image".to_string(),
                rationale: "Screenshots of login pages evade text filters".to_string(),
                weight: self.0,
            }],
        })
    }
}

struct FailingImageClassifier;
impl ImageClassifier for FailingImageClassifier {
    fn analyze_image(&self, _image_b64: &str) -> Result<ChannelResult, BridgeError> {
        Err(BridgeError::Inference("decode failed".into()))
    }
}

struct FixedTextClassifier(f32);
impl TextClassifier for FixedTextClassifier {
    fn malicious_probability(&self, _text: &str) -> Result<f32, BridgeError> {
        Ok(self.0)
    }
}

#[test]
fn scenario_a_benign_text_is_safe() {
    let verdict = engine().analyze("Hi team, meeting tomorrow at 3pm. See you there!", &[], &[]);

    assert!(verdict.text_score < 15.0, "text_score={}", verdict.text_score);
    assert_eq!(verdict.url_score, 0.0);
    assert_eq!(verdict.risk_tier, RiskTier::Safe);
    assert_eq!(verdict.verdict, Verdict::Safe);
    assert_eq!(verdict.summary, "No significant indicators detected.");
}

#[test]
fn scenario_b_urgency_fear_plus_lookalike_url_is_high_risk() {
    let text = "URGENT: your account has been suspended. Act immediately.";
    let urls = vec!["http://paypal-secure.tk/verify".to_string()];
    let verdict = engine().analyze(text, &urls, &[]);

    // urgency (+20) + fear (+25)
    assert!(verdict.text_score >= 45.0, "text_score={}", verdict.text_score);
    // risky TLD (+25) + brand (+30) + keywords (>= +5)
    assert!(verdict.url_score >= 55.0, "url_score={}", verdict.url_score);
    // two active channels escalate on top of the worst one
    let base = verdict.text_score.max(verdict.url_score);
    assert_eq!(verdict.unified_risk, (base + 15.0).min(100.0));
    assert!(verdict.unified_risk >= 70.0);
    assert_eq!(verdict.risk_tier, RiskTier::HighRisk);
    assert_eq!(verdict.verdict, Verdict::Threat);
}

#[test]
fn scenario_c_ip_login_url_fires_exactly_three_checks() {
    let urls = vec!["http://192.168.1.1/login".to_string()];
    let verdict = engine().analyze("", &urls, &[]);

    assert_eq!(verdict.url_score, 60.0);
    assert_eq!(verdict.evidence.len(), 3);
}

#[test]
fn scenario_d_at_symbol_is_distinct_evidence() {
    let urls = vec!["https://paypal.com@203.0.113.9/".to_string()];
    let verdict = engine().analyze("", &urls, &[]);

    let embedded = verdict
        .evidence
        .iter()
        .filter(|e| e.indicator == "Embedded Credentials (critical)")
        .collect::<Vec<_>>();
    assert_eq!(embedded.len(), 1);
    assert_eq!(embedded[0].weight, 50.0);
}

#[test]
fn scores_always_in_range() {
    let nasty = "URGENT suspended admin verify dear user security alert \
                 http://paypal-login.tk@192.168.1.1/verify-account-signin-update-banking";
    let verdict = engine().analyze(nasty, &[], &[]);

    for score in [
        verdict.text_score,
        verdict.url_score,
        verdict.image_score,
        verdict.unified_risk,
    ] {
        assert!((0.0..=100.0).contains(&score), "score out of range: {}", score);
    }
}

#[test]
fn unified_risk_never_below_worst_channel() {
    let cases = [
        ("hello there", vec![]),
        (
            "URGENT: account suspended, verify now",
            vec!["http://bit.ly/x".to_string()],
        ),
        ("", vec!["http://192.168.1.1/login".to_string()]),
    ];
    for (text, urls) in cases {
        let verdict = engine().analyze(text, &urls, &[]);
        let worst = verdict
            .text_score
            .max(verdict.url_score)
            .max(verdict.image_score);
        assert!(
            verdict.unified_risk >= worst,
            "unified {} < worst {}",
            verdict.unified_risk,
            worst
        );
    }
}

#[test]
fn repeated_calls_are_identical() {
    let text = "URGENT: verify your account at http://paypal-secure.tk/verify";
    let urls = vec!["http://192.168.1.1/login".to_string()];
    let engine = engine();

    let first = engine.analyze(text, &urls, &[]);
    let second = engine.analyze(text, &urls, &[]);

    assert_eq!(first.unified_risk, second.unified_risk);
    assert_eq!(first.factors, second.factors);
    assert_eq!(first.summary, second.summary);
    assert_eq!(first.evidence.len(), second.evidence.len());
}

#[test]
fn url_in_text_and_explicit_list_counts_once() {
    let url = "http://paypal-secure.tk/verify";
    let text = format!("please visit {}", url);

    let once = engine().analyze(&text, &[url.to_string()], &[]);
    let explicit_only = engine().analyze("please visit", &[url.to_string()], &[]);

    // Same consolidated set, so the same evidence volume
    assert_eq!(once.url_score, explicit_only.url_score);
    assert_eq!(once.evidence.len(), explicit_only.evidence.len());
}

#[test]
fn duplicate_factors_dedup_preserving_order() {
    // Two identical URLs produce identical reasons; factors keep one copy
    let urls = vec![
        "http://192.168.1.1/login".to_string(),
        "http://192.168.1.1/login?x=1".to_string(),
    ];
    let verdict = engine().analyze("", &urls, &[]);

    let transport_factors = verdict
        .factors
        .iter()
        .filter(|f| f.contains("Unencrypted connection"))
        .count();
    assert_eq!(transport_factors, 1);
    // Evidence is never merged: one item per fired check per URL
    let transport_evidence = verdict
        .evidence
        .iter()
        .filter(|e| e.indicator == "Insecure Protocol")
        .count();
    assert_eq!(transport_evidence, 2);
}

#[test]
fn three_active_channels_escalate_by_twenty_five() {
    let aggregator = SignalAggregator::with_collaborators(
        DetectionPolicy::default(),
        None,
        Some(Arc::new(StubImageClassifier(65.0))),
    );
    let text = "URGENT: your account has been suspended";
    let urls = vec!["http://paypal-secure.tk/verify".to_string()];
    let verdict = aggregator.analyze(text, &urls, &["aW1hZ2U=".to_string()]);

    assert!(verdict.text_score > 30.0);
    assert!(verdict.url_score > 30.0);
    assert_eq!(verdict.image_score, 65.0);
    let base = verdict
        .text_score
        .max(verdict.url_score)
        .max(verdict.image_score);
    assert_eq!(verdict.unified_risk, (base + 25.0).min(100.0));
}

#[test]
fn failing_image_collaborator_does_not_abort_analysis() {
    let aggregator = SignalAggregator::with_collaborators(
        DetectionPolicy::default(),
        None,
        Some(Arc::new(FailingImageClassifier)),
    );
    let verdict = aggregator.analyze(
        "URGENT: account suspended",
        &["http://192.168.1.1/login".to_string()],
        &["broken".to_string()],
    );

    assert_eq!(verdict.image_score, 0.0);
    assert!(verdict.url_score > 0.0);
    assert!(verdict.text_score > 0.0);
}

#[test]
fn text_classifier_boost_flows_into_unified_verdict() {
    let aggregator = SignalAggregator::with_collaborators(
        DetectionPolicy::default(),
        Some(Arc::new(FixedTextClassifier(0.9))),
        None,
    );
    // No rule category fires, so only the boost scores: 0.9 * 30 = 27
    let verdict = aggregator.analyze("greetings friend, wonderful weather lately", &[], &[]);

    assert_eq!(verdict.text_score, 27.0);
    assert_eq!(verdict.unified_risk, 27.0);
    assert_eq!(verdict.risk_tier, RiskTier::Safe);
}

#[test]
fn warnings_are_subset_of_factors() {
    let verdict = engine().analyze(
        "URGENT: suspicious login detected on your account",
        &["http://paypal-secure.tk/verify".to_string()],
        &[],
    );

    assert!(!verdict.warnings.is_empty());
    for warning in &verdict.warnings {
        assert!(verdict.factors.contains(warning));
    }
    // URL channel produced alarm-keyword factors
    assert!(verdict
        .warnings
        .iter()
        .any(|w| w.contains("Suspicious TLD") || w.contains("Brand impersonation")));
}

#[test]
fn summary_names_channels_and_tier() {
    let verdict = engine().analyze(
        "URGENT: your account has been suspended. Act immediately.",
        &["http://paypal-secure.tk/verify".to_string()],
        &[],
    );

    assert!(verdict.summary.starts_with("Text analysis flagged indicators"));
    assert!(verdict.summary.contains("URL analysis flagged indicators"));
    assert!(verdict.summary.ends_with("Overall risk assessed as High Risk."));
}
