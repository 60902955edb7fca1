//! Document session: ingested documents plus the question-answering loop.

use std::sync::Arc;

use tracing::debug;

use quill_core::config::QuillConfig;
use quill_core::error::QuillError;
use quill_llm::DynGenerationClient;
use quill_vector::{DynEmbeddingService, SegmentStore};

use crate::answer::{Answer, AnswerAssembler};
use crate::pipeline::{IngestReport, IngestionPipeline};

/// One user's document workspace.
///
/// The pipeline and the answerer share the same [`SegmentStore`]; separate
/// sessions have separate stores.
#[derive(Debug)]
pub struct DocumentSession {
    pipeline: IngestionPipeline,
    answerer: AnswerAssembler,
    store: SegmentStore,
    documents: Vec<IngestReport>,
}

impl DocumentSession {
    pub fn new(pipeline: IngestionPipeline, answerer: AnswerAssembler) -> Self {
        let store = pipeline.store().clone();
        Self {
            pipeline,
            answerer,
            store,
            documents: Vec::new(),
        }
    }

    /// Build a PDF session with a fresh, empty store.
    pub fn from_config(
        config: &QuillConfig,
        client: Arc<dyn DynGenerationClient>,
        embedder: Arc<dyn DynEmbeddingService>,
    ) -> Result<Self, QuillError> {
        let store = SegmentStore::new(embedder);
        let pipeline = IngestionPipeline::from_config(&config.documents, store.clone())?;
        let answerer = AnswerAssembler::from_config(&config.documents, store, client);
        Ok(Self::new(pipeline, answerer))
    }

    /// Ingest an uploaded document and remember its report.
    pub async fn ingest(
        &mut self,
        bytes: &[u8],
        filename: &str,
    ) -> Result<IngestReport, QuillError> {
        let report = self.pipeline.ingest(bytes, filename).await?;
        self.documents.push(report.clone());
        Ok(report)
    }

    /// Answer a question from the ingested documents.
    ///
    /// Blank questions return `Ok(None)` without retrieval or generation.
    pub async fn ask(&self, query: &str) -> Result<Option<Answer>, QuillError> {
        if query.trim().is_empty() {
            debug!("Ignoring blank question");
            return Ok(None);
        }
        self.answerer.answer(query).await.map(Some)
    }

    /// Number of successful ingestions, repeats included.
    pub fn documents_ingested(&self) -> usize {
        self.documents.len()
    }

    /// Reports of every successful ingestion, oldest first.
    pub fn documents(&self) -> &[IngestReport] {
        &self.documents
    }

    pub fn segment_count(&self) -> usize {
        self.store.len()
    }
}
