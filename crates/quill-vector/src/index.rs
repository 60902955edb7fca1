//! In-memory vector index with brute-force cosine similarity search.
//!
//! Entries keep their insertion order so that equal scores come back in the
//! order the segments were added. Search is O(n), which is fine for the few
//! thousand segments a handful of PDFs produce.

use std::sync::{Arc, RwLock};

use uuid::Uuid;

use quill_core::error::QuillError;
use quill_core::types::Segment;

/// A single hit returned from a vector search.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The ID assigned to the entry on insert.
    pub id: Uuid,
    /// Cosine similarity score (-1.0 to 1.0).
    pub score: f64,
    /// The stored segment.
    pub segment: Segment,
}

#[derive(Debug, Clone)]
struct VectorEntry {
    id: Uuid,
    embedding: Vec<f32>,
    segment: Segment,
}

/// In-memory vector index using brute-force cosine similarity.
///
/// Thread-safe via interior RwLock; clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Arc<RwLock<Vec<VectorEntry>>>,
}

impl VectorIndex {
    /// Create a new empty vector index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert several entries under one write lock.
    ///
    /// Either every entry is added or none is: all embeddings must be
    /// non-empty and share the dimension of what is already stored.
    pub fn insert_batch(
        &self,
        items: Vec<(Vec<f32>, Segment)>,
    ) -> Result<Vec<Uuid>, QuillError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| QuillError::Storage(format!("Lock poisoned: {}", e)))?;

        let expected = entries
            .first()
            .map(|e| e.embedding.len())
            .or_else(|| items.first().map(|(v, _)| v.len()));
        if let Some(expected) = expected {
            if expected == 0 {
                return Err(QuillError::Storage("cannot index an empty vector".to_string()));
            }
            if let Some((v, _)) = items.iter().find(|(v, _)| v.len() != expected) {
                return Err(QuillError::Storage(format!(
                    "dimension mismatch: index holds {} dimensions, got {}",
                    expected,
                    v.len()
                )));
            }
        }

        let mut ids = Vec::with_capacity(items.len());
        entries.reserve(items.len());
        for (embedding, segment) in items {
            let id = Uuid::new_v4();
            entries.push(VectorEntry {
                id,
                embedding,
                segment,
            });
            ids.push(id);
        }
        Ok(ids)
    }

    /// Search for the k nearest neighbors to the query vector by cosine similarity.
    ///
    /// Returns results sorted by descending similarity score. Ties keep
    /// insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, QuillError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| QuillError::Storage(format!("Lock poisoned: {}", e)))?;

        let mut scored: Vec<(f64, &VectorEntry)> = entries
            .iter()
            .map(|entry| (cosine_similarity(query, &entry.embedding), entry))
            .collect();

        // sort_by is stable.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(score, entry)| SearchHit {
                id: entry.id,
                score,
                segment: entry.segment.clone(),
            })
            .collect())
    }

    /// Return the number of vectors currently stored in the index.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Return true if the index contains no vectors.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of distinct source documents across all entries.
    pub fn document_count(&self) -> usize {
        self.entries
            .read()
            .map(|entries| {
                let mut ids: Vec<&str> = entries
                    .iter()
                    .map(|e| e.segment.source_document_id.as_str())
                    .collect();
                ids.sort_unstable();
                ids.dedup();
                ids.len()
            })
            .unwrap_or(0)
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if the lengths differ or either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}
