//! In-process nearest-neighbour search over document embeddings.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IndexError {
    #[error("no vectors to index")]
    Empty,
    #[error("vector {index} has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
}

/// Brute-force cosine index. Positions match the order vectors were given in.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dims: usize,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    pub fn new(vectors: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        let dims = vectors.first().map(Vec::len).ok_or(IndexError::Empty)?;
        if dims == 0 {
            return Err(IndexError::Empty);
        }
        if let Some((index, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != dims) {
            return Err(IndexError::DimensionMismatch {
                index,
                expected: dims,
                found: v.len(),
            });
        }
        Ok(Self { dims, vectors })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Top `k` positions by cosine similarity to `query`, best first. Ties keep
    /// insertion order.
    pub fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f64)>, IndexError> {
        if query.len() != self.dims {
            return Err(IndexError::DimensionMismatch {
                index: usize::MAX,
                expected: self.dims,
                found: query.len(),
            });
        }
        let mut hits: Vec<(usize, f64)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(idx, v)| (idx, cosine_similarity(query, v)))
            .filter(|(_, sim)| sim.is_finite())
            .collect();
        hits.sort_by(|a, b| b.1.total_cmp(&a.1));
        hits.truncate(k);
        Ok(hits)
    }
}

/// Cosine similarity; 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();
    let norm_a = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
