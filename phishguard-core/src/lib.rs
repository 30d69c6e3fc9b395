//! PhishGuard Core - Explainable Phishing Detection Engine
//!
//! Assigns a 0-100 risk score to a message (free text, embedded or
//! explicit links, optional images) and returns an auditable trail of
//! which indicators fired and why.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    SIGNAL AGGREGATOR                     │
//! │                                                          │
//! │  text ──► TextThreatDetector ──► ChannelResult ─┐        │
//! │  urls ──► UrlThreatDetector  ──► ChannelResult ─┼► fuse  │
//! │  imgs ──► ImageClassifier*   ──► ChannelResult ─┘   │    │
//! │                                                      ▼    │
//! │                                          UnifiedVerdict  │
//! └──────────────────────────────────────────────────────────┘
//!   * optional collaborator, absence degrades to a zero channel
//! ```
//!
//! The pipeline is synchronous, CPU-bound and stateless: every call is
//! a pure function of its inputs and the read-only [`DetectionPolicy`]
//! built at startup. Concurrent calls need no coordination. Callers
//! with an event loop should dispatch `analyze` to a blocking pool.
//!
//! Fusion is max-plus-escalation: `unified = max(channel scores) +
//! escalation(active channels)`, so the unified risk never drops below
//! the worst channel.

pub mod aggregate;
pub mod bridge;
pub mod policy;
pub mod text;
pub mod url;
pub mod verdict;

pub use aggregate::{extract_urls, SignalAggregator};
pub use bridge::{BridgeError, ImageClassifier, TextClassifier};
pub use policy::{DetectionPolicy, PolicyError, TextCategory, UrlPolicy, UrlWeights};
pub use text::TextThreatDetector;
pub use url::UrlThreatDetector;
pub use verdict::{ChannelResult, EvidenceItem, RiskTier, UnifiedVerdict, Verdict};
