//! Candidate answer spans

use regex::Regex;
use std::sync::OnceLock;

/// Byte range of a context string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn text<'a>(&self, context: &'a str) -> &'a str {
        &context[self.start..self.end]
    }
}

fn sentence_end() -> &'static Regex {
    static SENTENCE_END: OnceLock<Regex> = OnceLock::new();
    SENTENCE_END.get_or_init(|| {
        Regex::new(r#"[.!?]+["')\]]*\s+"#).expect("sentence boundary pattern is valid")
    })
}

/// Split `context` into lines, then sentences, trimmed and cut to `max_chars`.
///
/// Spans without any alphanumeric character (separators, bullets) are dropped.
/// Every span is a valid byte range into `context`.
pub fn candidate_spans(context: &str, max_chars: usize) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut line_start = 0;

    for line in context.split('\n') {
        let mut sentence_start = 0;
        for boundary in sentence_end().find_iter(line) {
            push_span(context, line_start + sentence_start, line_start + boundary.end(), max_chars, &mut spans);
            sentence_start = boundary.end();
        }
        push_span(context, line_start + sentence_start, line_start + line.len(), max_chars, &mut spans);
        line_start += line.len() + 1;
    }

    spans
}

fn push_span(context: &str, start: usize, end: usize, max_chars: usize, spans: &mut Vec<Span>) {
    let raw = &context[start..end];
    let trimmed_start = start + (raw.len() - raw.trim_start().len());
    let trimmed_end = start + raw.trim_end().len();
    if trimmed_start >= trimmed_end {
        return;
    }

    let text = &context[trimmed_start..trimmed_end];
    if !text.chars().any(char::is_alphanumeric) {
        return;
    }

    let end = match text.char_indices().nth(max_chars) {
        // Cut at the last word boundary before the limit, or hard at the limit
        Some((limit, _)) => match text[..limit].rfind(char::is_whitespace) {
            Some(space) if space > 0 => trimmed_start + text[..space].trim_end().len(),
            _ => trimmed_start + limit,
        },
        None => trimmed_end,
    };

    spans.push(Span {
        start: trimmed_start,
        end,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(context: &str, max_chars: usize) -> Vec<&str> {
        candidate_spans(context, max_chars)
            .iter()
            .map(|s| s.text(context))
            .collect()
    }

    #[test]
    fn test_sentences_and_lines() {
        let context = "The deadline is Jan 15. Submit early!\nUse gpt-3.5-turbo-0125 here";
        assert_eq!(
            texts(context, 400),
            vec![
                "The deadline is Jan 15.",
                "Submit early!",
                "Use gpt-3.5-turbo-0125 here"
            ]
        );
    }

    #[test]
    fn test_separator_lines_dropped() {
        let context = "First doc.\n\n---\n\nSecond doc.";
        assert_eq!(texts(context, 400), vec!["First doc.", "Second doc."]);
    }

    #[test]
    fn test_long_span_cut_at_word_boundary() {
        let context = "alpha beta gamma delta";
        assert_eq!(texts(context, 12), vec!["alpha beta"]);
    }

    #[test]
    fn test_unicode_offsets_valid() {
        let context = "Café opens at 9. Naïve question? Yes…";
        let spans = candidate_spans(context, 400);
        assert_eq!(spans.len(), 3);
        for span in spans {
            assert!(context.is_char_boundary(span.start));
            assert!(context.is_char_boundary(span.end));
        }
    }

    #[test]
    fn test_empty_context() {
        assert!(candidate_spans("", 400).is_empty());
        assert!(candidate_spans("\n\n---\n", 400).is_empty());
    }
}
