//! Plain-text extraction from uploaded documents.

use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

use quill_core::error::QuillError;

/// Turns raw document bytes into plain text, one string per page.
///
/// Extraction is CPU-bound and synchronous; the pipeline runs it on a
/// blocking thread.
pub trait TextExtractor: Send + Sync {
    /// Cheap format check run before anything is written to disk.
    ///
    /// Returns [`QuillError::UnsupportedFormat`] when `bytes` cannot be a
    /// document this extractor reads.
    fn check_format(&self, bytes: &[u8]) -> Result<(), QuillError>;

    /// Extract the text of every page, in page order.
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, QuillError>;
}

/// Number of leading bytes searched for the PDF header.
const HEADER_SEARCH_LEN: usize = 1024;
const PDF_MAGIC: &[u8] = b"%PDF-";

/// PDF text extraction backed by `pdf-extract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for PdfExtractor {
    fn check_format(&self, bytes: &[u8]) -> Result<(), QuillError> {
        let head = &bytes[..bytes.len().min(HEADER_SEARCH_LEN)];
        if head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC) {
            Ok(())
        } else {
            Err(QuillError::UnsupportedFormat(
                "missing %PDF- header".to_string(),
            ))
        }
    }

    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, QuillError> {
        self.check_format(bytes)?;

        // pdf-extract panics on some malformed files.
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        }));

        match result {
            Ok(Ok(pages)) => {
                debug!(pages = pages.len(), "PDF text extracted");
                Ok(pages)
            }
            Ok(Err(e)) => Err(QuillError::ExtractionFailed(e.to_string())),
            Err(_) => Err(QuillError::ExtractionFailed(
                "PDF parser aborted on malformed input".to_string(),
            )),
        }
    }
}
