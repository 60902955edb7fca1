//! Document question answering for Quill.
//!
//! Ingestion stores an uploaded PDF, extracts its text page by page, cuts
//! the text into overlapping segments and indexes them. Retrieval embeds a
//! question, pulls the closest segments and asks the model to answer from
//! them.

pub mod answer;
pub mod extract;
pub mod pipeline;
pub mod session;
pub mod splitter;
pub mod storage;

pub use answer::{Answer, AnswerAssembler};
pub use extract::{PdfExtractor, TextExtractor};
pub use pipeline::{IngestReport, IngestionPipeline};
pub use session::DocumentSession;
pub use splitter::TextSplitter;
pub use storage::DocumentStorage;
