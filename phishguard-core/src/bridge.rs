//! Collaborator Bridge
//!
//! Seams for the optional statistical collaborators: a text classifier
//! that produces a malicious probability, and an image classifier that
//! produces a full channel result. Both are injected at aggregator
//! construction so tests can substitute deterministic stubs.
//!
//! The engine never depends on these for correctness: a missing or
//! failing collaborator degrades to "no signal", it never fails a call.

use crate::verdict::ChannelResult;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

/// Statistical text classifier. Returns the probability in [0, 1] that
/// the text is malicious.
pub trait TextClassifier: Send + Sync {
    fn malicious_probability(&self, text: &str) -> Result<f32, BridgeError>;
}

/// Image-channel classifier. Returns a [`ChannelResult`] for one encoded
/// image, same shape as the rule-based detectors.
pub trait ImageClassifier: Send + Sync {
    fn analyze_image(&self, image_b64: &str) -> Result<ChannelResult, BridgeError>;
}
