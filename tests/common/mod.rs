//! Shared fixtures: deterministic embedders and on-disk corpora

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use virtual_ta::answer::LexicalExtractor;
use virtual_ta::config::Config;
use virtual_ta::embedding::{l2_normalize, EmbeddingError, EmbeddingProvider};
use virtual_ta::qa::QaEngine;

pub const DIMENSION: usize = 256;

/// Bag-of-words feature hashing. Same text, same vector.
pub struct HashingEmbedder;

impl HashingEmbedder {
    fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; DIMENSION];
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = blake3::hash(token.as_bytes());
            let bytes = hash.as_bytes();
            let bucket = u16::from_le_bytes([bytes[0], bytes[1]]) as usize % DIMENSION;
            vector[bucket] += 1.0;
        }
        l2_normalize(&mut vector);
        vector
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(Self::vector(text))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn model_name(&self) -> &str {
        "hashing-test"
    }
}

/// Counts document batches, i.e. knowledge base builds when the corpus fits
/// in one batch. Each batch sleeps so concurrent callers overlap.
pub struct CountingEmbedder {
    pub batches: Arc<AtomicUsize>,
    delay: Duration,
}

impl CountingEmbedder {
    pub fn new(delay: Duration) -> (Self, Arc<AtomicUsize>) {
        let batches = Arc::new(AtomicUsize::new(0));
        (
            Self {
                batches: Arc::clone(&batches),
                delay,
            },
            batches,
        )
    }
}

impl EmbeddingProvider for CountingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        HashingEmbedder.embed(text)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        HashingEmbedder.embed_batch(texts)
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn model_name(&self) -> &str {
        "counting-test"
    }
}

/// Fails every call with `message`
pub struct FailingEmbedder {
    pub message: String,
}

impl EmbeddingProvider for FailingEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::GenerationError(self.message.clone()))
    }

    fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::GenerationError(self.message.clone()))
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn model_name(&self) -> &str {
        "failing-test"
    }
}

/// Fails the first `failures` document batches, then behaves like [`HashingEmbedder`]
pub struct FlakyEmbedder {
    remaining_failures: AtomicUsize,
}

impl FlakyEmbedder {
    pub fn new(failures: usize) -> Self {
        Self {
            remaining_failures: AtomicUsize::new(failures),
        }
    }
}

impl EmbeddingProvider for FlakyEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        HashingEmbedder.embed(text)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let failing = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(EmbeddingError::GenerationError("transient failure".to_string()));
        }
        HashingEmbedder.embed_batch(texts)
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    fn model_name(&self) -> &str {
        "flaky-test"
    }
}

pub const GA1_COURSE: &str = r#"{"paragraphs": ["The deadline for GA1 is Jan 15."]}"#;

pub const FORUM: &str = r#"[
  {
    "topic_id": 155939,
    "url": "https://forum.example.edu/t/ga5-question-8-clarification/155939",
    "posts": [
      {"post_number": 1, "username": "alice", "html": "<p>For GA5 question 8, which tokenizer counts the tokens?</p>"},
      {"post_number": 2, "username": "bob", "html": "<p>Use a tokenizer to count the tokens and multiply by the rate.</p>"}
    ]
  },
  {
    "topic_id": 161071,
    "url": "https://forum.example.edu/t/docker-or-podman/161071",
    "posts": [
      {"post_number": 1, "username": "carol", "html": "<p>Can I use Docker instead of Podman?</p>"},
      {"post_number": 2, "username": "dave", "html": "<p>Podman is recommended, but Docker is <b>acceptable</b> for the project.</p>"},
      {"post_number": 3, "username": "erin", "html": "<p>Docker works fine for the project.</p>"}
    ]
  }
]"#;

/// Temporary data directory with optional course and forum files
pub struct Fixture {
    pub dir: TempDir,
    pub config: Config,
}

impl Fixture {
    pub fn new(course: Option<&str>, forum: Option<&str>) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data.course_file = dir.path().join("course_content_structured.json");
        config.data.forum_file = dir.path().join("discourse_posts.json");
        config.extractor.kind = "lexical".to_string();
        config.extractor.min_confidence = 0.2;

        if let Some(course) = course {
            write(&config.data.course_file, course);
        }
        if let Some(forum) = forum {
            write(&config.data.forum_file, forum);
        }

        Self { dir, config }
    }

    pub fn engine(&self, embedder: impl EmbeddingProvider + 'static) -> QaEngine {
        QaEngine::new(
            &self.config,
            Arc::new(embedder),
            Arc::new(LexicalExtractor::new(
                self.config.extractor.min_confidence,
                self.config.extractor.max_span_chars,
            )),
        )
    }
}

pub fn write(path: &Path, content: &str) {
    std::fs::write(path, content).unwrap();
}
