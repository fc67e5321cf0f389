//! Exact inner-product vector index
use super::l2_normalize;
use ndarray::{Array1, Array2, ArrayView1};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorIndexError {
    #[error("Index initialization failed: {0}")]
    InitializationError(String),

    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Non-finite value in {0}")]
    NonFiniteValue(String),
}

/// Search result with row position and similarity score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    /// Row of the matched vector, equal to the position of its document
    pub row: usize,
    /// Cosine similarity (inner product of unit vectors), higher is more similar
    pub score: f32,
}

/// Flat in-memory index over L2-normalized rows
///
/// Search is exhaustive, so results are exact and ordered by score descending
/// with ties going to the lower row. Built once; a rebuild produces a new index.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    /// One normalized embedding per row
    matrix: Array2<f32>,
    /// Vector dimension
    dimension: usize,
}

impl VectorIndex {
    /// Build an index from `rows`, normalizing each one
    ///
    /// # Arguments
    /// * `rows` - Embedding vectors, row `i` belonging to document `i`
    /// * `dimension` - Expected length of every row
    pub fn build(rows: &[Vec<f32>], dimension: usize) -> Result<Self, VectorIndexError> {
        if dimension == 0 {
            return Err(VectorIndexError::InitializationError(
                "Dimension must be greater than 0".to_string(),
            ));
        }

        let mut flat = Vec::with_capacity(rows.len() * dimension);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dimension {
                return Err(VectorIndexError::InvalidDimension {
                    expected: dimension,
                    actual: row.len(),
                });
            }
            if row.iter().any(|x| !x.is_finite()) {
                return Err(VectorIndexError::NonFiniteValue(format!("row {}", i)));
            }

            let start = flat.len();
            flat.extend_from_slice(row);
            l2_normalize(&mut flat[start..]);
        }

        let matrix = Array2::from_shape_vec((rows.len(), dimension), flat)
            .map_err(|e| VectorIndexError::InitializationError(e.to_string()))?;

        Ok(Self { matrix, dimension })
    }

    /// Search for the k nearest rows
    ///
    /// # Returns
    /// At most `k` results, sorted by score descending, ties by row ascending
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>, VectorIndexError> {
        if query.len() != self.dimension {
            return Err(VectorIndexError::InvalidDimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if query.iter().any(|x| !x.is_finite()) {
            return Err(VectorIndexError::NonFiniteValue("query".to_string()));
        }

        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut normalized = query.to_vec();
        l2_normalize(&mut normalized);
        let scores: Array1<f32> = self.matrix.dot(&ArrayView1::from(&normalized[..]));

        let mut results: Vec<SearchResult> = scores
            .iter()
            .enumerate()
            .map(|(row, &score)| SearchResult { row, score })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.row.cmp(&b.row)));
        results.truncate(k);

        Ok(results)
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        self.matrix.nrows()
    }

    /// Check if index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get vector dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}
