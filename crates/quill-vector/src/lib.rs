//! Quill vector crate - embedding service, in-memory index, and segment store.
//!
//! Provides an embedding service trait with an Ollama backend and a mock for
//! testing, a brute-force cosine index, and [`SegmentStore`], which pairs the
//! two so callers can add document segments and query them by text.

pub mod embedding;
pub mod index;
pub mod store;

pub use embedding::{DynEmbeddingService, EmbeddingService, MockEmbedding, OllamaEmbedding};
pub use index::{SearchHit, VectorIndex};
pub use store::{ScoredSegment, SegmentStore};
