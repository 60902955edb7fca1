//! Segment store: embeds document segments on the way in and queries by text.
//!
//! Wraps a [`VectorIndex`] and an embedding service so callers deal only in
//! segments and query strings, never raw vectors.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use quill_core::error::QuillError;
use quill_core::types::Segment;

use crate::embedding::DynEmbeddingService;
use crate::index::VectorIndex;

/// A segment returned from a similarity search.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredSegment {
    pub score: f64,
    pub segment: Segment,
}

/// Similarity-searchable collection of document segments.
///
/// Cheap to clone; clones share the underlying index.
#[derive(Clone)]
pub struct SegmentStore {
    index: VectorIndex,
    embedder: Arc<dyn DynEmbeddingService>,
}

impl SegmentStore {
    /// Create an empty store backed by `embedder`.
    pub fn new(embedder: Arc<dyn DynEmbeddingService>) -> Self {
        Self::with_index(VectorIndex::new(), embedder)
    }

    /// Create a store over an existing index.
    pub fn with_index(index: VectorIndex, embedder: Arc<dyn DynEmbeddingService>) -> Self {
        Self { index, embedder }
    }

    /// Embed and index `segments`.
    ///
    /// Every segment is embedded before anything is inserted, so a failure
    /// part-way through leaves the store exactly as it was. Returns the
    /// number of segments added.
    pub async fn add_segments(&self, segments: Vec<Segment>) -> Result<usize, QuillError> {
        if segments.is_empty() {
            return Ok(0);
        }

        let started = Instant::now();
        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let vectors = self.embedder.embed_batch_boxed(&texts).await?;
        if vectors.len() != segments.len() {
            return Err(QuillError::Embedding(format!(
                "embedded {} of {} segments",
                vectors.len(),
                segments.len()
            )));
        }

        let ids = self
            .index
            .insert_batch(vectors.into_iter().zip(segments).collect())?;

        info!(
            added = ids.len(),
            total = self.index.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Segments indexed"
        );
        Ok(ids.len())
    }

    /// Return up to `k` segments most similar to `query`, best first.
    ///
    /// An empty store answers with no hits without calling the embedder.
    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredSegment>, QuillError> {
        if self.index.is_empty() || k == 0 {
            debug!(k, "Skipping search on empty store");
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed_boxed(query).await?;
        let hits = self.index.search(&query_vec, k)?;
        debug!(k, hits = hits.len(), "Similarity search complete");

        Ok(hits
            .into_iter()
            .map(|hit| ScoredSegment {
                score: hit.score,
                segment: hit.segment,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of distinct documents with at least one indexed segment.
    pub fn document_count(&self) -> usize {
        self.index.document_count()
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }
}

impl std::fmt::Debug for SegmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentStore")
            .field("segments", &self.index.len())
            .finish_non_exhaustive()
    }
}
