//! Ingestion pipeline: persist -> extract -> split -> embed -> index.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use quill_core::config::DocumentsConfig;
use quill_core::error::QuillError;
use quill_core::types::Segment;
use quill_vector::SegmentStore;

use crate::extract::{PdfExtractor, TextExtractor};
use crate::splitter::TextSplitter;
use crate::storage::DocumentStorage;

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// Stored file name; also the `source_document_id` of every segment.
    pub document_id: String,
    pub stored_path: PathBuf,
    pub pages: usize,
    pub segments: usize,
    pub ingested_at: DateTime<Utc>,
}

/// Turns uploaded documents into indexed, retrievable segments.
pub struct IngestionPipeline {
    storage: DocumentStorage,
    extractor: Arc<dyn TextExtractor>,
    splitter: TextSplitter,
    store: SegmentStore,
}

impl IngestionPipeline {
    pub fn new(
        storage: DocumentStorage,
        extractor: Arc<dyn TextExtractor>,
        splitter: TextSplitter,
        store: SegmentStore,
    ) -> Self {
        Self {
            storage,
            extractor,
            splitter,
            store,
        }
    }

    /// PDF pipeline configured from the `[documents]` section.
    pub fn from_config(config: &DocumentsConfig, store: SegmentStore) -> Result<Self, QuillError> {
        Ok(Self::new(
            DocumentStorage::new(&config.storage_dir),
            Arc::new(PdfExtractor::new()),
            TextSplitter::new(config.chunk_size, config.chunk_overlap)?,
            store,
        ))
    }

    pub fn store(&self) -> &SegmentStore {
        &self.store
    }

    /// Ingest one uploaded document.
    ///
    /// The store is only touched in the final step, in a single batch, so
    /// any error leaves it as it was. Ingesting the same file twice indexes
    /// its segments twice.
    pub async fn ingest(&self, bytes: &[u8], filename: &str) -> Result<IngestReport, QuillError> {
        let started = Instant::now();
        let document_id = DocumentStorage::file_name(filename)?;
        self.extractor.check_format(bytes)?;

        let stored_path = self.storage.persist(bytes, &document_id).await?;
        let stored = self.storage.read(&stored_path).await?;

        let extractor = Arc::clone(&self.extractor);
        let pages = tokio::task::spawn_blocking(move || extractor.extract_pages(&stored))
            .await
            .map_err(|e| QuillError::ExtractionFailed(format!("extraction task failed: {}", e)))??;
        debug!(document_id = %document_id, pages = pages.len(), "Text extracted");

        let segments = self.segment_pages(&document_id, &pages);
        if segments.is_empty() {
            warn!(document_id = %document_id, "Document contains no extractable text");
        }

        let added = self.store.add_segments(segments).await?;

        info!(
            document_id = %document_id,
            pages = pages.len(),
            segments = added,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Document ingested"
        );

        Ok(IngestReport {
            document_id,
            stored_path,
            pages: pages.len(),
            segments: added,
            ingested_at: Utc::now(),
        })
    }

    /// Split every page, keeping offsets relative to the page. Blank windows
    /// carry nothing to retrieve and are dropped.
    fn segment_pages(&self, document_id: &str, pages: &[String]) -> Vec<Segment> {
        pages
            .iter()
            .enumerate()
            .flat_map(|(page, text)| {
                self.splitter
                    .split(text)
                    .into_iter()
                    .filter(|(_, window)| !window.trim().is_empty())
                    .map(move |(offset, window)| Segment {
                        text: window,
                        source_offset: offset,
                        source_document_id: document_id.to_string(),
                        page,
                    })
            })
            .collect()
    }
}

impl std::fmt::Debug for IngestionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionPipeline")
            .field("storage", &self.storage)
            .field("splitter", &self.splitter)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
