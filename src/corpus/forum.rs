//! Forum topic dump

use super::{html_to_text, Document, DocumentOrigin};
use serde::Deserialize;

/// One topic with its posts in thread order. Extra keys (`topic_id`, `slug`,
/// `title`) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ForumTopic {
    pub url: String,
    pub posts: Vec<ForumPost>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ForumPost {
    pub post_number: u32,
    pub username: String,
    /// Rendered post body
    pub html: String,
}

impl ForumTopic {
    /// One document per post, citing the topic URL. Returns the documents and the
    /// number of posts whose text was blank after stripping markup.
    pub fn into_documents(self, snippet_chars: usize) -> (Vec<Document>, usize) {
        let mut docs = Vec::with_capacity(self.posts.len());
        let mut skipped = 0;

        for post in self.posts {
            let text = html_to_text(&post.html);
            match Document::new(text, self.url.as_str(), snippet_chars, DocumentOrigin::Forum) {
                Some(doc) => docs.push(doc),
                None => {
                    tracing::debug!(
                        "Skipping empty post #{} by {} in {}",
                        post.post_number,
                        post.username,
                        self.url
                    );
                    skipped += 1;
                }
            }
        }

        (docs, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::ELLIPSIS;

    #[test]
    fn test_posts_become_documents() {
        let topics: Vec<ForumTopic> = serde_json::from_str(
            r#"[{
                "topic_id": 155939,
                "slug": "ga5-question-8-clarification",
                "title": "GA5 Question 8 Clarification",
                "url": "https://forum.example.edu/t/ga5-question-8-clarification/155939",
                "posts": [
                    {"post_number": 1, "username": "alice", "html": "<p>Which model?</p>"},
                    {"post_number": 2, "username": "bob", "html": "<p>Use the one<br>in the question.</p>"}
                ]
            }]"#,
        )
        .unwrap();

        let (docs, skipped) = topics.into_iter().next().unwrap().into_documents(200);
        assert_eq!(skipped, 0);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "Which model?");
        assert_eq!(docs[1].content, "Use the one\nin the question.");
        assert!(docs
            .iter()
            .all(|d| d.source_url.ends_with("/155939") && d.origin == DocumentOrigin::Forum));
    }

    #[test]
    fn test_long_post_snippet_truncated() {
        let body = "word ".repeat(100);
        let topic = ForumTopic {
            url: "https://forum.example.edu/t/x/1".to_string(),
            posts: vec![ForumPost {
                post_number: 1,
                username: "carol".to_string(),
                html: format!("<p>{}</p>", body),
            }],
        };

        let (docs, _) = topic.into_documents(200);
        let snippet = &docs[0].display_snippet;
        assert!(snippet.ends_with(ELLIPSIS));
        assert_eq!(snippet.chars().count(), 201);
        assert!(docs[0].content.starts_with(&snippet[..snippet.len() - ELLIPSIS.len()]));
    }

    #[test]
    fn test_image_only_post_skipped() {
        let topic = ForumTopic {
            url: "https://forum.example.edu/t/x/2".to_string(),
            posts: vec![ForumPost {
                post_number: 1,
                username: "dave".to_string(),
                html: r#"<p><img src="/uploads/screenshot.png"></p>"#.to_string(),
            }],
        };

        let (docs, skipped) = topic.into_documents(200);
        assert!(docs.is_empty());
        assert_eq!(skipped, 1);
    }
}
