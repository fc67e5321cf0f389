//! Structured course page record

use super::{Document, DocumentOrigin, COURSE_SOURCE};
use serde::Deserialize;

/// Course content as produced by the course page post-processor.
/// Every group is optional; unknown keys such as `headings` are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CourseContent {
    pub paragraphs: Vec<String>,
    pub lists: Vec<Vec<String>>,
    pub tables: Vec<Vec<Vec<String>>>,
    pub links: Vec<CourseLink>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CourseLink {
    pub text: String,
    pub url: String,
}

impl CourseContent {
    /// Paragraphs, then lists, then tables, then links. Returns the documents and
    /// the number of blank records dropped.
    pub fn into_documents(self, snippet_chars: usize) -> (Vec<Document>, usize) {
        let mut docs = Vec::new();
        let mut skipped = 0;

        let mut push = |doc: Option<Document>| match doc {
            Some(doc) => docs.push(doc),
            None => skipped += 1,
        };

        for paragraph in self.paragraphs {
            push(Document::new(
                paragraph,
                COURSE_SOURCE,
                snippet_chars,
                DocumentOrigin::Course,
            ));
        }

        for list in self.lists {
            push(Document::new(
                list.join("\n"),
                COURSE_SOURCE,
                snippet_chars,
                DocumentOrigin::Course,
            ));
        }

        for table in self.tables {
            let text = table
                .iter()
                .map(|row| row.join("\t"))
                .collect::<Vec<_>>()
                .join("\n");
            push(Document::new(
                text,
                COURSE_SOURCE,
                snippet_chars,
                DocumentOrigin::Course,
            ));
        }

        for link in self.links {
            push(Document::new(
                link.text,
                link.url,
                snippet_chars,
                DocumentOrigin::Course,
            ));
        }

        (docs, skipped)
    }
}
