//! Embedding service trait and implementations.
//!
//! - `OllamaEmbedding` calls the Ollama `/api/embed` endpoint. This is the
//!   production embedding backend.
//! - `MockEmbedding` provides deterministic hash-based vectors for testing.

use std::collections::hash_map::DefaultHasher;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use tracing::debug;

use quill_core::config::QuillConfig;
use quill_core::error::QuillError;
use quill_llm::OllamaEndpoint;

/// Boxed future returned by [`DynEmbeddingService`].
pub type BoxedEmbedFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, QuillError>> + Send + 'a>>;

/// Service for generating text embeddings.
///
/// Implementations convert text into fixed-dimensional vectors that capture
/// semantic meaning. Used for both ingestion (indexing) and retrieval (query).
pub trait EmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, QuillError>> + Send;

    /// Embed several texts, preserving order.
    ///
    /// The default embeds one text at a time.
    fn embed_batch<'a>(
        &'a self,
        texts: &'a [String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, QuillError>> + Send + 'a {
        async move {
            let mut vectors = Vec::with_capacity(texts.len());
            for text in texts {
                vectors.push(self.embed(text).await?);
            }
            Ok(vectors)
        }
    }
}

/// Object-safe version of [`EmbeddingService`] for dynamic dispatch.
///
/// Because `EmbeddingService::embed` returns `impl Future` it is not
/// object-safe. This trait uses boxed futures instead, allowing
/// `Arc<dyn DynEmbeddingService>` to be stored in structs without generics.
pub trait DynEmbeddingService: Send + Sync {
    fn embed_boxed<'a>(&'a self, text: &'a str) -> BoxedEmbedFuture<'a, Vec<f32>>;

    fn embed_batch_boxed<'a>(&'a self, texts: &'a [String]) -> BoxedEmbedFuture<'a, Vec<Vec<f32>>>;
}

/// Blanket impl: any `EmbeddingService` automatically implements `DynEmbeddingService`.
impl<T: EmbeddingService> DynEmbeddingService for T {
    fn embed_boxed<'a>(&'a self, text: &'a str) -> BoxedEmbedFuture<'a, Vec<f32>> {
        Box::pin(self.embed(text))
    }

    fn embed_batch_boxed<'a>(&'a self, texts: &'a [String]) -> BoxedEmbedFuture<'a, Vec<Vec<f32>>> {
        Box::pin(self.embed_batch(texts))
    }
}

// ---------------------------------------------------------------------------
// OllamaEmbedding - embeddings from the model server
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct EmbedRequest<'a, I: Serialize + ?Sized> {
    model: &'a str,
    input: &'a I,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedding service backed by Ollama's `/api/embed` endpoint.
///
/// The vector size depends on the model; the index checks that every
/// vector it stores has the same length.
#[derive(Debug)]
pub struct OllamaEmbedding {
    endpoint: OllamaEndpoint,
    model: String,
}

impl OllamaEmbedding {
    pub fn new(endpoint: OllamaEndpoint, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            model: model.into(),
        }
    }

    /// Build from configuration, using `documents.embedding_model` or the chat model.
    pub fn from_config(config: &QuillConfig) -> Result<Self, QuillError> {
        let endpoint = OllamaEndpoint::from_config(&config.model)?;
        Ok(Self::new(endpoint, config.embedding_model()))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn request<I: Serialize + Sync + ?Sized>(
        &self,
        input: &I,
        expected: usize,
    ) -> Result<Vec<Vec<f32>>, QuillError> {
        let request = EmbedRequest {
            model: &self.model,
            input,
        };
        let response: EmbedResponse = self.endpoint.post_json("/api/embed", &request).await?;

        if response.embeddings.len() != expected {
            return Err(QuillError::Embedding(format!(
                "expected {} embeddings, model server returned {}",
                expected,
                response.embeddings.len()
            )));
        }
        debug!(model = %self.model, count = expected, "Embeddings generated");
        Ok(response.embeddings)
    }
}

impl EmbeddingService for OllamaEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, QuillError> {
        if text.is_empty() {
            return Err(QuillError::Embedding("Cannot embed empty text".to_string()));
        }
        let mut vectors = self.request(text, 1).await?;
        vectors
            .pop()
            .ok_or_else(|| QuillError::Embedding("model server returned no embedding".to_string()))
    }

    fn embed_batch<'a>(
        &'a self,
        texts: &'a [String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, QuillError>> + Send + 'a {
        async move {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            if texts.iter().any(|t| t.is_empty()) {
                return Err(QuillError::Embedding("Cannot embed empty text".to_string()));
            }
            self.request(texts, texts.len()).await
        }
    }
}

// ---------------------------------------------------------------------------
// MockEmbedding - deterministic hash-based vectors for testing
// ---------------------------------------------------------------------------

/// Mock embedding service that returns deterministic 384-dimensional vectors.
///
/// The output is derived from a hash of the input text, so identical inputs
/// always produce identical outputs. This allows testing retrieval without a
/// real model.
#[derive(Debug, Clone, Default)]
pub struct MockEmbedding;

impl MockEmbedding {
    pub fn new() -> Self {
        Self
    }

    fn hash_to_vector(text: &str) -> Vec<f32> {
        let mut result = Vec::with_capacity(384);
        for i in 0..384 {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            let h = hasher.finish();
            let val = ((h as f64) / (u64::MAX as f64)) * 2.0 - 1.0;
            result.push(val as f32);
        }

        let norm: f32 = result.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut result {
                *val /= norm;
            }
        }

        result
    }
}

impl EmbeddingService for MockEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, QuillError> {
        if text.is_empty() {
            return Err(QuillError::Embedding("Cannot embed empty text".to_string()));
        }
        Ok(Self::hash_to_vector(text))
    }
}
