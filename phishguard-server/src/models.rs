//! Request/response models for the analysis API.

use phishguard_core::{EvidenceItem, UnifiedVerdict};
use serde::{Deserialize, Serialize};

/// One analysis request: free text, explicit URLs, base64 images.
/// All fields optional, but at least one must carry content.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub images_b64: Vec<String>,
}

impl AnalyzeRequest {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.urls.is_empty() && self.images_b64.is_empty()
    }
}

/// Full verdict payload returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub risk_score: f32,
    pub text_score: f32,
    pub url_score: f32,
    pub image_score: f32,
    pub risk_level: String,
    pub verdict: String,
    pub factors: Vec<String>,
    pub warnings: Vec<String>,
    pub evidence: Vec<EvidenceItem>,
    pub analysis_summary: String,
}

impl From<UnifiedVerdict> for AnalyzeResponse {
    fn from(v: UnifiedVerdict) -> Self {
        Self {
            risk_score: v.unified_risk,
            text_score: v.text_score,
            url_score: v.url_score,
            image_score: v.image_score,
            risk_level: v.risk_tier.as_str().to_string(),
            verdict: v.verdict.as_str().to_string(),
            factors: v.factors,
            warnings: v.warnings,
            evidence: v.evidence,
            analysis_summary: v.summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_are_empty() {
        let request: AnalyzeRequest = serde_json::from_str("{}").unwrap();
        assert!(request.is_empty());
    }

    #[test]
    fn test_request_with_text_is_not_empty() {
        let request: AnalyzeRequest =
            serde_json::from_str(r#"{"text": "hello"}"#).unwrap();
        assert!(!request.is_empty());
    }
}
