//! Cross-encoder span scoring using FastEmbed

use super::{best_span, candidate_spans, AnswerExtractor, ExtractedAnswer, ExtractionError};
use fastembed::{RerankInitOptions, RerankerModel, TextRerank};
use std::sync::Arc;

/// Scores every candidate span against the question with a cross-encoder and
/// keeps the best one. Raw scores are logits; confidence is their logistic.
pub struct CrossEncoderExtractor {
    model: Arc<TextRerank>,
    model_name: String,
    min_confidence: f32,
    max_span_chars: usize,
}

impl CrossEncoderExtractor {
    /// Create a new extractor with specified model
    ///
    /// # Arguments
    /// * `model_name` - "bge-reranker-base", "bge-reranker-v2-m3" or "jina-reranker-v1-turbo-en"
    /// * `min_confidence` - Spans below this confidence give an empty answer
    /// * `max_span_chars` - Longest span considered
    pub fn new(
        model_name: &str,
        min_confidence: f32,
        max_span_chars: usize,
    ) -> Result<Self, ExtractionError> {
        let reranker_model = match model_name {
            "bge-reranker-base" | "BAAI/bge-reranker-base" => RerankerModel::BGERerankerBase,
            "bge-reranker-v2-m3" | "BAAI/bge-reranker-v2-m3" => RerankerModel::BGERerankerV2M3,
            "jina-reranker-v1-turbo-en" => RerankerModel::JINARerankerV1TurboEn,
            _ => {
                return Err(ExtractionError::InitializationError(format!(
                    "Unsupported cross-encoder: {}. Supported: bge-reranker-base, bge-reranker-v2-m3, jina-reranker-v1-turbo-en",
                    model_name
                )));
            }
        };

        tracing::info!("Initializing cross-encoder model: {}", model_name);

        let init_options = RerankInitOptions::new(reranker_model).with_show_download_progress(true);

        let model = TextRerank::try_new(init_options)
            .map_err(|e| ExtractionError::InitializationError(e.to_string()))?;

        Ok(Self {
            model: Arc::new(model),
            model_name: model_name.to_string(),
            min_confidence,
            max_span_chars,
        })
    }

    /// Create extractor with default model
    pub fn with_default_model() -> Result<Self, ExtractionError> {
        Self::new("bge-reranker-base", 0.1, 400)
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn logistic(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl AnswerExtractor for CrossEncoderExtractor {
    fn extract(&self, question: &str, context: &str) -> Result<ExtractedAnswer, ExtractionError> {
        if question.trim().is_empty() {
            return Err(ExtractionError::InvalidInput(
                "Question cannot be empty".to_string(),
            ));
        }

        let spans = candidate_spans(context, self.max_span_chars);
        if spans.is_empty() {
            return Ok(ExtractedAnswer::empty());
        }

        let documents: Vec<&str> = spans.iter().map(|s| s.text(context)).collect();

        let results = self
            .model
            .rerank(question, documents, false, None)
            .map_err(|e| ExtractionError::InferenceError(e.to_string()))?;

        // Results come back sorted by score; put them back in span order
        let mut confidences = vec![0.0; spans.len()];
        for result in results {
            if let Some(slot) = confidences.get_mut(result.index) {
                *slot = logistic(result.score);
            }
        }

        Ok(best_span(
            context,
            &spans,
            &confidences,
            self.min_confidence,
        ))
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logistic() {
        assert!((logistic(0.0) - 0.5).abs() < 1e-6);
        assert!(logistic(8.0) > 0.99);
        assert!(logistic(-8.0) < 0.01);
    }

    #[test]
    fn test_unsupported_model() {
        let result = CrossEncoderExtractor::new("gpt-4o-mini", 0.1, 400);
        assert!(matches!(
            result,
            Err(ExtractionError::InitializationError(_))
        ));
    }

    #[test]
    #[ignore] // Requires model download
    fn test_extracts_answer_sentence() {
        let extractor = CrossEncoderExtractor::with_default_model().unwrap();
        let context = "Office hours are on Fridays.\n\n---\n\nThe deadline for GA1 is Jan 15.";

        let answer = extractor
            .extract("When is the GA1 deadline?", context)
            .unwrap();
        assert_eq!(answer.text, "The deadline for GA1 is Jan 15.");
    }

    #[test]
    #[ignore] // Requires model download
    fn test_empty_context() {
        let extractor = CrossEncoderExtractor::with_default_model().unwrap();
        let answer = extractor.extract("When is the deadline?", "").unwrap();
        assert!(answer.is_empty());
    }
}
