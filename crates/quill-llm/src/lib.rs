//! Quill LLM crate - generation client trait and the Ollama HTTP backend.
//!
//! Sessions talk to the model through [`GenerationClient`]; the concrete
//! [`OllamaClient`] maps structured prompts to `/api/chat` and plain
//! templates to `/api/generate`. [`MockGeneration`] records prompts for tests.

pub mod client;
pub mod endpoint;
pub mod mock;
pub mod ollama;

pub use client::{DynGenerationClient, GenerationClient};
pub use endpoint::OllamaEndpoint;
pub use mock::MockGeneration;
pub use ollama::OllamaClient;
