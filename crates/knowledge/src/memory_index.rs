//! In-memory vector index with exhaustive cosine search.

use crate::vector_index::{cosine_similarity, EmbeddedChunk, ScoredChunk, VectorIndex};
use ragdesk_core::{AppError, AppResult};
use std::cmp::Ordering;

/// Append-only, process-lifetime vector index.
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    dimensions: usize,
    entries: Vec<EmbeddedChunk>,
}

impl MemoryIndex {
    /// Build an index from an initial set of entries.
    ///
    /// The dimension of the first vector fixes the index dimension.
    ///
    /// # Errors
    /// - `AppError::EmptyCorpus` when `entries` is empty
    /// - `AppError::DimensionMismatch` when vectors disagree on dimension
    pub fn build(entries: Vec<EmbeddedChunk>) -> AppResult<Self> {
        let dimensions = entries
            .first()
            .map(|e| e.vector.len())
            .ok_or(AppError::EmptyCorpus)?;

        if dimensions == 0 {
            return Err(AppError::InvalidArgument(
                "embedding vectors must not be empty".to_string(),
            ));
        }

        let mut index = Self {
            dimensions,
            entries: Vec::with_capacity(entries.len()),
        };
        index.append(entries)?;

        tracing::info!(
            "Built in-memory index: {} chunks, {} dimensions",
            index.entries.len(),
            dimensions
        );

        Ok(index)
    }

    fn check_dimension(&self, actual: usize) -> AppResult<()> {
        if actual != self.dimensions {
            return Err(AppError::DimensionMismatch {
                expected: self.dimensions,
                actual,
            });
        }
        Ok(())
    }
}

impl VectorIndex for MemoryIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn append(&mut self, entries: Vec<EmbeddedChunk>) -> AppResult<()> {
        for entry in &entries {
            self.check_dimension(entry.vector.len())?;
        }

        self.entries.extend(entries);
        Ok(())
    }

    fn search(&self, query_embedding: &[f32], top_k: usize) -> AppResult<Vec<ScoredChunk>> {
        if top_k == 0 {
            return Err(AppError::InvalidArgument(
                "top_k must be greater than zero".to_string(),
            ));
        }

        self.check_dimension(query_embedding.len())?;

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query_embedding, &entry.vector)))
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect())
    }
}
