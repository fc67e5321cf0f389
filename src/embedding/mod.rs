//! Embedding & indexing
//!
//! Local embedding generation and exact nearest-neighbor search.
//! Architecture:
//! - EmbeddingProvider trait for abstraction
//! - FastEmbedProvider for local embedding (all-MiniLM-L6-v2, 384-dim)
//! - VectorIndex: flat inner-product search over L2-normalized rows
mod provider;
mod vector_index;

pub use provider::{l2_normalize, EmbeddingError, EmbeddingProvider, FastEmbedProvider};
pub use vector_index::{SearchResult, VectorIndex, VectorIndexError};
