//! Verdict Types
//!
//! Core types for risk scoring and classification.
//! No logic here beyond tier derivation - just data structures.

use serde::{Deserialize, Serialize};

// ============================================================================
// TIER THRESHOLDS (fixed - not part of the tunable policy)
// ============================================================================

/// Below this unified risk = Safe
pub const SAFE_BELOW: f32 = 31.0;

/// At or above this unified risk = HighRisk
pub const HIGH_RISK_FROM: f32 = 70.0;

// ============================================================================
// RISK TIER
// ============================================================================

/// Risk classification tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    /// No action needed
    Safe,
    /// Worth a closer look or a user warning
    Suspicious,
    /// Near-certain phishing, block or quarantine
    HighRisk,
}

impl RiskTier {
    /// Derive the tier from a unified risk score.
    pub fn from_score(score: f32) -> Self {
        if score < SAFE_BELOW {
            RiskTier::Safe
        } else if score < HIGH_RISK_FROM {
            RiskTier::Suspicious
        } else {
            RiskTier::HighRisk
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Safe => "Safe",
            RiskTier::Suspicious => "Suspicious",
            RiskTier::HighRisk => "High Risk",
        }
    }

    pub fn severity_level(&self) -> u8 {
        match self {
            RiskTier::Safe => 0,
            RiskTier::Suspicious => 1,
            RiskTier::HighRisk => 2,
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// VERDICT
// ============================================================================

/// Binary verdict derived from the risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Safe,
    Threat,
}

impl Verdict {
    /// Safe iff the tier is Safe; anything above is a threat.
    pub fn from_tier(tier: RiskTier) -> Self {
        match tier {
            RiskTier::Safe => Verdict::Safe,
            _ => Verdict::Threat,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Safe => "Safe",
            Verdict::Threat => "Threat",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// EVIDENCE
// ============================================================================

/// Auditable record linking a fired indicator to the literal input
/// excerpt that triggered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Indicator label, e.g. "Urgency / Time Pressure"
    pub indicator: String,
    /// Literal excerpt from the original (case-preserving) input
    pub snippet: String,
    /// Why this indicator matters
    pub rationale: String,
    /// Points this indicator contributed (always > 0)
    pub weight: f32,
}

// ============================================================================
// CHANNEL RESULT
// ============================================================================

/// Result of analyzing one unit: the text body, one URL, or one image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelResult {
    /// Channel score, clamped to 0-100
    pub score: f32,
    /// Human-readable reasons, in fire order
    pub reasons: Vec<String>,
    /// One item per fired indicator
    pub evidence: Vec<EvidenceItem>,
}

// ============================================================================
// UNIFIED VERDICT
// ============================================================================

/// Fused multi-channel analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedVerdict {
    /// Fused 0-100 risk score
    pub unified_risk: f32,
    pub text_score: f32,
    pub url_score: f32,
    pub image_score: f32,
    pub risk_tier: RiskTier,
    pub verdict: Verdict,
    /// Deduplicated reasons across all channels, first-seen order
    pub factors: Vec<String>,
    /// Subset of factors matching the alarm-keyword set
    pub warnings: Vec<String>,
    /// All evidence across channels, never merged
    pub evidence: Vec<EvidenceItem>,
    /// Narrative summary of the analysis
    pub summary: String,
}

// ============================================================================
// UNIT TESTS
// ============================================================================
