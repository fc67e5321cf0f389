//! Extractive answering
//!
//! An extractor receives the question and one context string, splits the
//! context into candidate spans and returns the best-supported span verbatim.
//! Weak support yields an empty answer, never a fabricated one.

mod cross_encoder;
mod lexical;
mod spans;

pub use cross_encoder::CrossEncoderExtractor;
pub use lexical::LexicalExtractor;
pub use spans::{candidate_spans, Span};

use crate::config::ExtractorConfig;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Extractor kinds accepted in configuration
pub const EXTRACTOR_KINDS: &[&str] = &["cross-encoder", "lexical"];

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Extractor initialization failed: {0}")]
    InitializationError(String),

    #[error("Inference failed: {0}")]
    InferenceError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// A span copied from the context, with how strongly it answers the question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedAnswer {
    pub text: String,
    /// 0.0 to 1.0
    pub confidence: f32,
}

impl ExtractedAnswer {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Trait for answer extractors
pub trait AnswerExtractor: Send + Sync {
    /// Best span of `context` answering `question`, or an empty answer
    fn extract(&self, question: &str, context: &str) -> Result<ExtractedAnswer, ExtractionError>;

    /// Human-readable extractor name for logs
    fn name(&self) -> &str;
}

/// Build the extractor selected by `config.kind`
pub fn extractor_from_config(
    config: &ExtractorConfig,
) -> Result<Arc<dyn AnswerExtractor>, ExtractionError> {
    match config.kind.as_str() {
        "cross-encoder" => Ok(Arc::new(CrossEncoderExtractor::new(
            &config.model,
            config.min_confidence,
            config.max_span_chars,
        )?)),
        "lexical" => Ok(Arc::new(LexicalExtractor::new(
            config.min_confidence,
            config.max_span_chars,
        ))),
        other => Err(ExtractionError::InitializationError(format!(
            "Unknown extractor kind '{}', expected one of {:?}",
            other, EXTRACTOR_KINDS
        ))),
    }
}

/// Pick the highest-confidence span; earlier spans win ties.
/// `confidences[i]` belongs to `spans[i]`.
fn best_span(
    context: &str,
    spans: &[Span],
    confidences: &[f32],
    min_confidence: f32,
) -> ExtractedAnswer {
    let mut best: Option<(usize, f32)> = None;
    for (i, &confidence) in confidences.iter().enumerate() {
        if best.map_or(true, |(_, c)| confidence > c) {
            best = Some((i, confidence));
        }
    }

    match best {
        Some((i, confidence)) if confidence >= min_confidence && confidence > 0.0 => {
            ExtractedAnswer {
                text: spans[i].text(context).trim().to_string(),
                confidence,
            }
        }
        _ => ExtractedAnswer::empty(),
    }
}
