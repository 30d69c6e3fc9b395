//! Detection Policy
//!
//! The tunable detection policy: text indicator categories, URL threat
//! lists and weights, and the alarm-keyword set used to classify warnings.
//! Catalogs are declarative data consumed by scan-and-accumulate loops -
//! adding an indicator is a policy change, not a code change.
//!
//! The policy is built once at startup (from defaults or a JSON file) and
//! is read-only for the lifetime of the process.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

// ============================================================================
// DEFAULT TEXT WEIGHTS
// ============================================================================

pub const URGENCY_WEIGHT: f32 = 20.0;
pub const FEAR_WEIGHT: f32 = 25.0;
pub const AUTHORITY_WEIGHT: f32 = 18.0;
pub const ACTION_REQUEST_WEIGHT: f32 = 15.0;
pub const GENERIC_IDENTITY_WEIGHT: f32 = 12.0;
pub const AMBIGUOUS_CLAIM_WEIGHT: f32 = 10.0;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("failed to read policy file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse policy file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid policy: {0}")]
    Invalid(String),
}

// ============================================================================
// TEXT CATALOG
// ============================================================================

/// One psychological-manipulation indicator category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextCategory {
    /// Display label, e.g. "Urgency / Time Pressure"
    pub label: String,
    /// Trigger phrases, matched case-insensitively as substrings
    pub triggers: Vec<String>,
    /// Points added once per category, not per occurrence
    pub weight: f32,
    /// Why this pattern indicates manipulation
    pub rationale: String,
}

impl TextCategory {
    fn new(label: &str, triggers: &[&str], weight: f32, rationale: &str) -> Self {
        Self {
            label: label.to_string(),
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
            weight,
            rationale: rationale.to_string(),
        }
    }
}

// ============================================================================
// URL CATALOG
// ============================================================================

/// Weights for the eight URL heuristic checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlWeights {
    /// Raw IPv4 literal as host
    pub ip_host: f32,
    /// Host ends with a risky TLD
    pub risky_tld: f32,
    /// Host is a known URL shortener
    pub shortener: f32,
    /// Host contains a brand token but is not the official domain
    pub brand_impersonation: f32,
    /// Per distinct credential-harvesting keyword
    pub keyword_per_hit: f32,
    /// Cap on the keyword contribution
    pub keyword_cap: f32,
    /// URL longer than `max_url_len`
    pub long_url: f32,
    /// '@' anywhere in the URL
    pub embedded_credentials: f32,
    /// Unencrypted scheme combined with a sensitive-action keyword
    pub insecure_sensitive: f32,
}

impl Default for UrlWeights {
    fn default() -> Self {
        Self {
            ip_host: 40.0,
            risky_tld: 25.0,
            shortener: 20.0,
            brand_impersonation: 30.0,
            keyword_per_hit: 5.0,
            keyword_cap: 15.0,
            long_url: 10.0,
            embedded_credentials: 50.0,
            insecure_sensitive: 15.0,
        }
    }
}

/// URL threat lists and weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlPolicy {
    /// TLDs frequently seen in malicious campaigns (leading dot included)
    pub risky_tlds: Vec<String>,
    /// Shortener domains matched against the exact host
    pub shorteners: Vec<String>,
    /// Brand tokens for impersonation detection
    pub brands: Vec<String>,
    /// Credential-harvesting keywords matched anywhere in the URL
    pub sensitive_keywords: Vec<String>,
    /// Keywords that mark a sensitive action (insecure-transport check)
    pub sensitive_actions: Vec<String>,
    /// Length above which a URL is considered abnormally long
    pub max_url_len: usize,
    pub weights: UrlWeights,
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self {
            risky_tlds: strings(&[".tk", ".ru", ".cn", ".zip", ".xyz", ".top", ".gq"]),
            shorteners: strings(&[
                "bit.ly", "goo.gl", "tinyurl.com", "t.co", "is.gd", "buff.ly", "ad.vu",
            ]),
            brands: strings(&[
                "paypal", "google", "apple", "microsoft", "facebook", "netflix", "amazon",
            ]),
            sensitive_keywords: strings(&[
                "login", "verify", "secure", "account", "update", "banking", "signin",
                "support",
            ]),
            sensitive_actions: strings(&["login", "signin", "account", "verify"]),
            max_url_len: 75,
            weights: UrlWeights::default(),
        }
    }
}

// ============================================================================
// DETECTION POLICY
// ============================================================================

/// Complete, versioned detection policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionPolicy {
    /// Policy revision, carried through for audit
    pub version: String,
    /// Text indicator catalog, scanned in order
    pub text_categories: Vec<TextCategory>,
    pub url: UrlPolicy,
    /// Factors containing any of these (case-insensitive) become warnings
    pub alarm_keywords: Vec<String>,
}

impl Default for DetectionPolicy {
    fn default() -> Self {
        Self {
            version: "builtin-1".to_string(),
            text_categories: vec![
                TextCategory::new(
                    "Urgency / Time Pressure",
                    &[
                        "urgent", "immediately", "now", "limited time", "24 hours",
                        "act fast", "immediate action", "expires", "deadline",
                    ],
                    URGENCY_WEIGHT,
                    "Creates artificial deadline to bypass rational decision-making",
                ),
                TextCategory::new(
                    "Fear / Loss Threat",
                    &[
                        "suspended", "blocked", "unusual activity", "unauthorized",
                        "legal action", "warrant", "arrest", "terminated", "breach",
                    ],
                    FEAR_WEIGHT,
                    "Threatens negative consequences to induce panic-driven compliance",
                ),
                TextCategory::new(
                    "Authority Impersonation",
                    &[
                        "admin", "support team", "security department",
                        "verification center", "bank", "irs", "tax", "ceo",
                        "hr department",
                    ],
                    AUTHORITY_WEIGHT,
                    "Falsely claims to represent trusted authority to gain compliance",
                ),
                TextCategory::new(
                    "Coercive Action Request",
                    &[
                        "click here", "verify", "confirm", "update your", "sign in",
                        "log in", "reply", "download",
                    ],
                    ACTION_REQUEST_WEIGHT,
                    "Demands immediate action without allowing verification",
                ),
                TextCategory::new(
                    "Generic Identity",
                    &[
                        "dear user", "dear customer", "dear account holder",
                        "valued customer", "dear member", "account user",
                    ],
                    GENERIC_IDENTITY_WEIGHT,
                    "Uses generic salutation instead of personalized information",
                ),
                TextCategory::new(
                    "Ambiguous Security Claim",
                    &[
                        "security alert", "unusual activity", "suspicious login",
                        "verification required", "account review", "security update",
                    ],
                    AMBIGUOUS_CLAIM_WEIGHT,
                    "Makes vague security claims without specific verifiable details",
                ),
            ],
            url: UrlPolicy::default(),
            alarm_keywords: strings(&[
                "critical", "threat", "suspicious", "impersonation", "detected",
            ]),
        }
    }
}

impl DetectionPolicy {
    /// Load a policy from a JSON file. Missing sections fall back to the
    /// built-in defaults; the result is validated before use.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PolicyError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let policy: DetectionPolicy = serde_json::from_str(&content)?;
        policy.validate()?;
        log::info!(
            "Detection policy '{}' loaded from {}",
            policy.version,
            path.as_ref().display()
        );
        Ok(policy)
    }

    /// Reject policies that would make the detectors degenerate.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.text_categories.is_empty() {
            return Err(PolicyError::Invalid("text catalog is empty".into()));
        }
        for cat in &self.text_categories {
            if cat.triggers.is_empty() {
                return Err(PolicyError::Invalid(format!(
                    "category '{}' has no triggers",
                    cat.label
                )));
            }
            if cat.weight <= 0.0 {
                return Err(PolicyError::Invalid(format!(
                    "category '{}' has non-positive weight",
                    cat.label
                )));
            }
        }
        let w = &self.url.weights;
        let url_weights = [
            w.ip_host,
            w.risky_tld,
            w.shortener,
            w.brand_impersonation,
            w.keyword_per_hit,
            w.keyword_cap,
            w.long_url,
            w.embedded_credentials,
            w.insecure_sensitive,
        ];
        if url_weights.iter().any(|&v| v <= 0.0) {
            return Err(PolicyError::Invalid(
                "URL check weights must be positive".into(),
            ));
        }
        if self.url.max_url_len == 0 {
            return Err(PolicyError::Invalid("max_url_len must be positive".into()));
        }
        Ok(())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_policy_is_valid() {
        let policy = DetectionPolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.text_categories.len(), 6);
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let policy = DetectionPolicy {
            text_categories: vec![],
            ..Default::default()
        };
        assert!(matches!(policy.validate(), Err(PolicyError::Invalid(_))));
    }

    #[test]
    fn test_non_positive_weight_rejected() {
        let mut policy = DetectionPolicy::default();
        policy.text_categories[0].weight = 0.0;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "version": "ops-2026-08" }}"#).unwrap();

        let policy = DetectionPolicy::from_json_file(file.path()).unwrap();
        assert_eq!(policy.version, "ops-2026-08");
        // Untouched sections keep the built-ins
        assert_eq!(policy.text_categories.len(), 6);
        assert!(policy.url.risky_tlds.contains(&".tk".to_string()));
    }

    #[test]
    fn test_json_override_applies() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "url": {{ "risky_tlds": [".evil"], "max_url_len": 50 }} }}"#
        )
        .unwrap();

        let policy = DetectionPolicy::from_json_file(file.path()).unwrap();
        assert_eq!(policy.url.risky_tlds, vec![".evil".to_string()]);
        assert_eq!(policy.url.max_url_len, 50);
        // Weights were omitted, defaults apply
        assert_eq!(policy.url.weights.ip_host, 40.0);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            DetectionPolicy::from_json_file(file.path()),
            Err(PolicyError::Parse(_))
        ));
    }
}
