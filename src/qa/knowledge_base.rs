//! Documents and their index, built together and never mutated

use crate::corpus::{Document, DocumentOrigin, LoadReport};
use crate::embedding::{SearchResult, VectorIndex, VectorIndexError};
use serde::Serialize;
use std::time::Duration;

/// Summary of a built knowledge base
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeBaseStats {
    pub documents: usize,
    pub course_documents: usize,
    pub forum_documents: usize,
    pub dimension: usize,
    pub embedding_model: String,
    /// BLAKE3 over the ordered documents; equal sources give equal fingerprints
    pub fingerprint: String,
    pub build_ms: u64,
    pub sources: LoadReport,
}

/// A retrieved document with its rank data
#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    pub row: usize,
    pub score: f32,
    pub document: Document,
}

/// Document collection plus the index whose row `i` embeds document `i`
#[derive(Debug)]
pub struct KnowledgeBase {
    documents: Vec<Document>,
    index: VectorIndex,
    stats: KnowledgeBaseStats,
}

impl KnowledgeBase {
    /// Pair documents with their embeddings. Fails unless there is exactly one
    /// embedding per document.
    pub fn new(
        documents: Vec<Document>,
        embeddings: Vec<Vec<f32>>,
        dimension: usize,
        embedding_model: &str,
        sources: LoadReport,
        build_time: Duration,
    ) -> Result<Self, VectorIndexError> {
        if documents.len() != embeddings.len() {
            return Err(VectorIndexError::InitializationError(format!(
                "{} documents but {} embeddings",
                documents.len(),
                embeddings.len()
            )));
        }

        let index = VectorIndex::build(&embeddings, dimension)?;

        let count = |origin| documents.iter().filter(|d| d.origin == origin).count();
        let stats = KnowledgeBaseStats {
            documents: documents.len(),
            course_documents: count(DocumentOrigin::Course),
            forum_documents: count(DocumentOrigin::Forum),
            dimension,
            embedding_model: embedding_model.to_string(),
            fingerprint: fingerprint(&documents),
            build_ms: build_time.as_millis() as u64,
            sources,
        };

        Ok(Self {
            documents,
            index,
            stats,
        })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, row: usize) -> Option<&Document> {
        self.documents.get(row)
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn stats(&self) -> &KnowledgeBaseStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Nearest documents to an already embedded query
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>, VectorIndexError> {
        self.index.search(query, k)
    }

    /// Like [`search`](Self::search) but returns owned documents
    pub fn search_documents(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredDocument>, VectorIndexError> {
        Ok(self
            .search(query, k)?
            .into_iter()
            .filter_map(|hit| {
                self.document(hit.row).map(|doc| ScoredDocument {
                    row: hit.row,
                    score: hit.score,
                    document: doc.clone(),
                })
            })
            .collect())
    }
}

/// Hex BLAKE3 digest of every document's fields, in order
pub fn fingerprint(documents: &[Document]) -> String {
    let mut hasher = blake3::Hasher::new();
    for doc in documents {
        for field in [&doc.content, &doc.source_url, &doc.display_snippet] {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
