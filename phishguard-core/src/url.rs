//! URL Threat Detector
//!
//! Eight independent additive heuristic checks against one URL. Checks
//! are non-exclusive: a URL may trigger any subset, and each triggered
//! check contributes exactly one evidence item. A malformed URL is a
//! zero-score channel, never an error.

use crate::policy::DetectionPolicy;
use crate::verdict::{ChannelResult, EvidenceItem};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
// Explicit path: the crate shares its name with this module
use ::url::Url;

/// Dotted IPv4 literal used as a host
static IPV4_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$").unwrap());

pub struct UrlThreatDetector {
    policy: Arc<DetectionPolicy>,
}

impl UrlThreatDetector {
    pub fn new(policy: Arc<DetectionPolicy>) -> Self {
        Self { policy }
    }

    /// Score one URL. Total: parse failure yields score 0 with no
    /// evidence and is logged, never propagated.
    pub fn analyze(&self, raw: &str) -> ChannelResult {
        if raw.is_empty() {
            return ChannelResult::default();
        }

        // Scheme-less URLs default to the unencrypted scheme, which
        // deliberately keeps them eligible for the transport check
        let normalized = if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.to_string()
        } else {
            format!("http://{}", raw)
        };

        let parsed = match Url::parse(&normalized) {
            Ok(u) => u,
            Err(e) => {
                log::debug!("URL parse failed for {:?}: {}", raw, e);
                return ChannelResult::default();
            }
        };

        let host = parsed.host_str().unwrap_or("").to_lowercase();
        let lower_url = normalized.to_lowercase();
        let url_policy = &self.policy.url;
        let weights = &url_policy.weights;

        let mut score = 0.0f32;
        let mut reasons = Vec::new();
        let mut evidence = Vec::new();

        // 1. Raw IP host
        if IPV4_HOST.is_match(&host) {
            score += weights.ip_host;
            reasons.push(format!("IP-based URL detected: {}", host));
            evidence.push(EvidenceItem {
                indicator: "IP-based URL (critical)".to_string(),
                snippet: host.clone(),
                rationale: "Legitimate sites use domain names, not raw IP addresses"
                    .to_string(),
                weight: weights.ip_host,
            });
        }

        // 2. Risky TLD, first match only
        if let Some(tld) = url_policy
            .risky_tlds
            .iter()
            .find(|t| host.ends_with(t.as_str()))
        {
            score += weights.risky_tld;
            reasons.push(format!("Suspicious TLD: {}", tld));
            evidence.push(EvidenceItem {
                indicator: "Suspicious Top-Level Domain".to_string(),
                snippet: tld.clone(),
                rationale: "This TLD is commonly associated with malicious campaigns"
                    .to_string(),
                weight: weights.risky_tld,
            });
        }

        // 3. Shortener, exact host match
        if url_policy.shorteners.iter().any(|s| s == &host) {
            score += weights.shortener;
            reasons.push(format!("URL shortener used: {}", host));
            evidence.push(EvidenceItem {
                indicator: "URL Shortener".to_string(),
                snippet: host.clone(),
                rationale: "Shorteners hide the true destination - potential redirection attack"
                    .to_string(),
                weight: weights.shortener,
            });
        }

        // 4. Brand impersonation, first triggering brand only.
        // The official domain and its subdomains are allowlisted.
        if let Some(brand) = url_policy.brands.iter().find(|b| {
            host.contains(b.as_str())
                && host != format!("{}.com", b)
                && !host.ends_with(&format!(".{}.com", b))
        }) {
            score += weights.brand_impersonation;
            reasons.push(format!(
                "Brand impersonation: '{}' in suspicious domain",
                brand
            ));
            evidence.push(EvidenceItem {
                indicator: "Brand Impersonation (critical)".to_string(),
                snippet: host.clone(),
                rationale: format!(
                    "Domain contains '{}' but is not the official domain",
                    brand
                ),
                weight: weights.brand_impersonation,
            });
        }

        // 5. Credential-harvesting keywords, +5 per distinct, capped
        let found: Vec<&String> = url_policy
            .sensitive_keywords
            .iter()
            .filter(|k| lower_url.contains(k.as_str()))
            .collect();
        if !found.is_empty() {
            let keyword_score =
                (found.len() as f32 * weights.keyword_per_hit).min(weights.keyword_cap);
            score += keyword_score;
            let joined = found
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            reasons.push(format!("Suspicious keywords: {}", joined));
            evidence.push(EvidenceItem {
                indicator: "Credential Harvesting Keywords".to_string(),
                snippet: joined,
                rationale: "URL contains terms commonly used in phishing attacks".to_string(),
                weight: keyword_score,
            });
        }

        // 6. Excessive length
        if normalized.len() > url_policy.max_url_len {
            score += weights.long_url;
            reasons.push(format!(
                "Abnormally long URL: {} characters",
                normalized.len()
            ));
            evidence.push(EvidenceItem {
                indicator: "URL Length Anomaly".to_string(),
                snippet: format!("{} characters", normalized.len()),
                rationale: "Long URLs may be obfuscating malicious intent".to_string(),
                weight: weights.long_url,
            });
        }

        // 7. Embedded-credential marker: '@' makes everything before it
        // userinfo, so the visible domain is not the real destination
        if normalized.contains('@') {
            score += weights.embedded_credentials;
            reasons.push("URL contains '@' symbol - critical destination spoofing".to_string());
            evidence.push(EvidenceItem {
                indicator: "Embedded Credentials (critical)".to_string(),
                snippet: "@ symbol in URL".to_string(),
                rationale: "'@' redirects to a different domain - common phishing technique"
                    .to_string(),
                weight: weights.embedded_credentials,
            });
        }

        // 8. Unencrypted transport for a sensitive action
        if parsed.scheme() == "http"
            && url_policy
                .sensitive_actions
                .iter()
                .any(|k| lower_url.contains(k.as_str()))
        {
            score += weights.insecure_sensitive;
            reasons.push("Unencrypted connection for sensitive action".to_string());
            evidence.push(EvidenceItem {
                indicator: "Insecure Protocol".to_string(),
                snippet: "http used for a credential-related page".to_string(),
                rationale: "Legitimate sites use https for login and account pages".to_string(),
                weight: weights.insecure_sensitive,
            });
        }

        let score = score.clamp(0.0, 100.0);
        log::debug!(
            "URL analysis: {} -> {:.1} ({} checks fired)",
            raw,
            score,
            evidence.len()
        );

        ChannelResult {
            score,
            reasons,
            evidence,
        }
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
