//! Document loading
//!
//! Normalizes the structured course record and the forum topic dump into one
//! flat, ordered list of [`Document`]s. Course documents come first, forum
//! documents after, each group in source order. The order matters only because
//! embedding rows are aligned with it.

mod course;
mod forum;
mod markup;

pub use course::{CourseContent, CourseLink};
pub use forum::{ForumPost, ForumTopic};
pub use markup::html_to_text;

use crate::config::DataConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Source marker used for paragraphs, lists and tables of the course page
pub const COURSE_SOURCE: &str = "course";

/// Placeholder source for forum topics without a URL
pub const FORUM_SOURCE: &str = "forum";

/// Appended to citation labels that were cut short
pub const ELLIPSIS: &str = "…";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Which input produced a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentOrigin {
    Course,
    Forum,
}

/// Immutable unit of retrievable content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Text that gets embedded and fed to the answer extractor
    pub content: String,
    /// Course marker, course link URL or forum topic URL
    pub source_url: String,
    /// Citation label shown to users
    pub display_snippet: String,
    pub origin: DocumentOrigin,
}

impl Document {
    /// Build a document, or `None` when the content is blank
    pub fn new(
        content: impl Into<String>,
        source_url: impl Into<String>,
        snippet_chars: usize,
        origin: DocumentOrigin,
    ) -> Option<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            return None;
        }

        let mut source_url = source_url.into();
        if source_url.trim().is_empty() {
            source_url = match origin {
                DocumentOrigin::Course => COURSE_SOURCE.to_string(),
                DocumentOrigin::Forum => FORUM_SOURCE.to_string(),
            };
        }

        let display_snippet = snippet(&content, snippet_chars);

        Some(Self {
            content,
            source_url,
            display_snippet,
            origin,
        })
    }
}

/// First `max_chars` characters of `text`, with an ellipsis when anything was cut
pub fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}

/// How one input file contributed to the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Loaded,
    Missing,
    Malformed,
}

/// Per-source load outcome
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub status: SourceStatus,
    pub documents: usize,
    /// Records dropped because their text was blank
    pub skipped: usize,
}

impl SourceReport {
    pub fn empty(status: SourceStatus) -> Self {
        Self {
            status,
            documents: 0,
            skipped: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub course: SourceReport,
    pub forum: SourceReport,
}

/// Ordered documents plus how each source fared
#[derive(Debug, Clone)]
pub struct LoadedCorpus {
    pub documents: Vec<Document>,
    pub report: LoadReport,
}

/// Reads both JSON sources into a document collection
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    course_file: PathBuf,
    forum_file: PathBuf,
    snippet_chars: usize,
}

impl DocumentLoader {
    pub fn new(course_file: PathBuf, forum_file: PathBuf, snippet_chars: usize) -> Self {
        Self {
            course_file,
            forum_file,
            snippet_chars,
        }
    }

    pub fn from_config(config: &DataConfig) -> Self {
        Self::new(
            config.course_file.clone(),
            config.forum_file.clone(),
            config.snippet_chars,
        )
    }

    /// Load every available source. Missing or malformed sources contribute nothing.
    pub fn load(&self) -> LoadedCorpus {
        let mut documents = Vec::new();

        let course = match read_source::<CourseContent>(&self.course_file) {
            Ok(Some(content)) => {
                let (docs, skipped) = content.into_documents(self.snippet_chars);
                let report = SourceReport {
                    status: SourceStatus::Loaded,
                    documents: docs.len(),
                    skipped,
                };
                documents.extend(docs);
                report
            }
            Ok(None) => {
                warn!(
                    "Course file {} not found, continuing without course content",
                    self.course_file.display()
                );
                SourceReport::empty(SourceStatus::Missing)
            }
            Err(e) => {
                warn!("Skipping course content: {}", e);
                SourceReport::empty(SourceStatus::Malformed)
            }
        };

        let forum = match read_source::<Vec<ForumTopic>>(&self.forum_file) {
            Ok(Some(topics)) => {
                let mut report = SourceReport::empty(SourceStatus::Loaded);
                for topic in topics {
                    let (docs, skipped) = topic.into_documents(self.snippet_chars);
                    report.documents += docs.len();
                    report.skipped += skipped;
                    documents.extend(docs);
                }
                report
            }
            Ok(None) => {
                warn!(
                    "Forum file {} not found, continuing without forum posts",
                    self.forum_file.display()
                );
                SourceReport::empty(SourceStatus::Missing)
            }
            Err(e) => {
                warn!("Skipping forum posts: {}", e);
                SourceReport::empty(SourceStatus::Malformed)
            }
        };

        info!(
            "Loaded {} documents ({} course, {} forum)",
            documents.len(),
            course.documents,
            forum.documents
        );

        LoadedCorpus {
            documents,
            report: LoadReport { course, forum },
        }
    }
}

/// Read and parse a JSON source; `Ok(None)` when the file does not exist
fn read_source<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, LoadError> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes from {}", raw.len(), path.display());

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| LoadError::Malformed {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_short_text_untouched() {
        assert_eq!(snippet("short", 200), "short");
        let exact = "a".repeat(200);
        assert_eq!(snippet(&exact, 200), exact);
    }

    #[test]
    fn test_snippet_truncates_on_char_boundary() {
        let text = "é".repeat(250);
        let cut = snippet(&text, 200);
        assert!(cut.ends_with(ELLIPSIS));
        assert_eq!(cut.chars().count(), 201);
    }

    #[test]
    fn test_blank_document_rejected() {
        assert!(Document::new("   \n", "course", 200, DocumentOrigin::Course).is_none());
    }

    #[test]
    fn test_missing_source_url_gets_placeholder() {
        let doc = Document::new("Post body", "", 200, DocumentOrigin::Forum).unwrap();
        assert_eq!(doc.source_url, FORUM_SOURCE);
    }
}
