//! HTML to plain text with line breaks at block boundaries

use scraper::{ElementRef, Html, Node};

/// Elements that start and end their own line
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "details", "div", "dl", "dt",
    "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "summary", "table", "tbody", "thead", "tfoot",
    "tr", "ul",
];

/// Elements whose text is never content
const SKIPPED_TAGS: &[&str] = &["script", "style", "template", "noscript"];

/// Strip markup from an HTML fragment.
///
/// Inline whitespace collapses to single spaces, block elements break lines,
/// lines are trimmed and blank lines dropped.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut collector = TextCollector::default();
    walk(fragment.root_element(), &mut collector, false);
    collector.finish()
}

fn walk(element: ElementRef<'_>, out: &mut TextCollector, in_pre: bool) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                if in_pre {
                    out.push_preformatted(&text.text);
                } else {
                    out.push_inline(&text.text);
                }
            }
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                let Some(child_ref) = ElementRef::wrap(child) else {
                    continue;
                };

                let is_block = BLOCK_TAGS.contains(&name);
                if is_block {
                    out.break_line();
                }
                walk(child_ref, out, in_pre || name == "pre");
                match name {
                    "td" | "th" => out.push_inline(" "),
                    _ if is_block => out.break_line(),
                    _ => {}
                }
            }
            _ => {}
        }
    }
}

#[derive(Default)]
struct TextCollector {
    lines: Vec<String>,
    current: String,
}

impl TextCollector {
    fn push_inline(&mut self, text: &str) {
        let mut pending_space = text.starts_with(char::is_whitespace);
        for word in text.split_whitespace() {
            if pending_space && !self.current.is_empty() && !self.current.ends_with(' ') {
                self.current.push(' ');
            }
            self.current.push_str(word);
            pending_space = true;
        }
        if text.ends_with(char::is_whitespace)
            && !self.current.is_empty()
            && !self.current.ends_with(' ')
        {
            self.current.push(' ');
        }
    }

    fn push_preformatted(&mut self, text: &str) {
        let mut pieces = text.split('\n').peekable();
        while let Some(piece) = pieces.next() {
            self.current.push_str(piece.trim_end());
            if pieces.peek().is_some() {
                self.break_line();
            }
        }
    }

    fn break_line(&mut self) {
        let line = self.current.trim();
        if !line.is_empty() {
            self.lines.push(line.to_string());
        }
        self.current.clear();
    }

    fn finish(mut self) -> String {
        self.break_line();
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_break_lines() {
        let text = html_to_text("<p>First paragraph.</p><p>Second   paragraph.</p>");
        assert_eq!(text, "First paragraph.\nSecond paragraph.");
    }

    #[test]
    fn test_inline_tags_stay_on_line() {
        let text = html_to_text(
            r#"<p>Use <code>gpt-3.5-turbo-0125</code> via the <a href="https://x">API</a>.</p>"#,
        );
        assert_eq!(text, "Use gpt-3.5-turbo-0125 via the API.");
    }

    #[test]
    fn test_br_and_lists() {
        let text = html_to_text("<p>Steps:<br>do this</p><ul><li>one</li><li>two</li></ul>");
        assert_eq!(text, "Steps:\ndo this\none\ntwo");
    }

    #[test]
    fn test_scripts_dropped_and_entities_decoded() {
        let text = html_to_text("<div>A &amp; B<script>alert(1)</script></div>");
        assert_eq!(text, "A & B");
    }

    #[test]
    fn test_preformatted_keeps_lines() {
        let text = html_to_text("<pre><code>uv run app.py\npython -m http.server</code></pre>");
        assert_eq!(text, "uv run app.py\npython -m http.server");
    }

    #[test]
    fn test_quote_block_separated() {
        let html = r#"<aside class="quote"><div class="title">alice:</div><blockquote><p>Is it due Friday?</p></blockquote></aside><p>Yes.</p>"#;
        assert_eq!(html_to_text(html), "alice:\nIs it due Friday?\nYes.");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(html_to_text(""), "");
        assert_eq!(html_to_text("<p>  </p>"), "");
    }
}
