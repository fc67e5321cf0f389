//! Model-free extractor scoring spans by IDF-weighted term overlap

use super::{best_span, candidate_spans, AnswerExtractor, ExtractedAnswer, ExtractionError};
use ahash::{AHashMap, AHashSet};
use regex::Regex;
use std::sync::OnceLock;

const STOPWORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "as", "at", "be", "can", "do", "does", "for", "from", "how",
    "i", "if", "in", "is", "it", "me", "my", "of", "on", "or", "should", "so", "that", "the",
    "this", "to", "use", "was", "we", "what", "when", "where", "which", "who", "why", "will",
    "with", "you",
];

fn token_pattern() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r"[a-z0-9]+(?:[-.][a-z0-9]+)*").expect("token pattern is valid")
    })
}

/// Lowercased content terms with plural `s` stripped
fn terms(text: &str) -> AHashSet<String> {
    let lowered = text.to_lowercase();
    token_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !STOPWORDS.contains(t))
        .map(|t| {
            if t.len() > 3 && t.ends_with('s') && !t.ends_with("ss") {
                t[..t.len() - 1].to_string()
            } else {
                t.to_string()
            }
        })
        .collect()
}

/// Offline extractor. Confidence is the share of the question's IDF weight a
/// span covers, so a span containing every rare question term scores 1.0.
pub struct LexicalExtractor {
    min_confidence: f32,
    max_span_chars: usize,
}

impl LexicalExtractor {
    pub fn new(min_confidence: f32, max_span_chars: usize) -> Self {
        Self {
            min_confidence,
            max_span_chars,
        }
    }
}

impl AnswerExtractor for LexicalExtractor {
    fn extract(&self, question: &str, context: &str) -> Result<ExtractedAnswer, ExtractionError> {
        let question_terms = terms(question);
        let spans = candidate_spans(context, self.max_span_chars);
        if question_terms.is_empty() || spans.is_empty() {
            return Ok(ExtractedAnswer::empty());
        }

        let span_terms: Vec<AHashSet<String>> =
            spans.iter().map(|s| terms(s.text(context))).collect();

        let mut document_frequency: AHashMap<&str, usize> = AHashMap::new();
        for set in &span_terms {
            for term in set {
                *document_frequency.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let n = spans.len() as f32;
        let weight = |term: &str| {
            let df = document_frequency.get(term).copied().unwrap_or(0) as f32;
            (1.0 + n / (1.0 + df)).ln()
        };

        let total: f32 = question_terms.iter().map(|t| weight(t.as_str())).sum();
        let confidences: Vec<f32> = span_terms
            .iter()
            .map(|set| {
                let covered: f32 = question_terms
                    .iter()
                    .filter(|t| set.contains(*t))
                    .map(|t| weight(t.as_str()))
                    .sum();
                covered / total
            })
            .collect();

        Ok(best_span(
            context,
            &spans,
            &confidences,
            self.min_confidence,
        ))
    }

    fn name(&self) -> &str {
        "lexical"
    }
}
