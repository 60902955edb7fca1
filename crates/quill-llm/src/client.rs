//! Generation client trait.

use std::future::Future;
use std::pin::Pin;

use quill_core::error::QuillError;
use quill_core::types::Prompt;

/// Submits an assembled prompt to a language model and returns its output.
///
/// A call resolves once the model has produced its full response or the
/// request has failed. Implementations do not retry.
pub trait GenerationClient: Send + Sync {
    /// Generate a completion for `prompt`.
    fn generate(
        &self,
        prompt: &Prompt,
    ) -> impl Future<Output = Result<String, QuillError>> + Send;

    /// Identifier of the model this client talks to.
    fn model(&self) -> &str;
}

/// Object-safe version of [`GenerationClient`] for dynamic dispatch.
///
/// Sessions store `Arc<dyn DynGenerationClient>` so they are not generic over
/// the backend. Every `GenerationClient` gets this trait through the blanket
/// impl below.
pub trait DynGenerationClient: Send + Sync {
    fn generate_boxed<'a>(
        &'a self,
        prompt: &'a Prompt,
    ) -> Pin<Box<dyn Future<Output = Result<String, QuillError>> + Send + 'a>>;

    fn model(&self) -> &str;
}

impl<T: GenerationClient> DynGenerationClient for T {
    fn generate_boxed<'a>(
        &'a self,
        prompt: &'a Prompt,
    ) -> Pin<Box<dyn Future<Output = Result<String, QuillError>> + Send + 'a>> {
        Box::pin(self.generate(prompt))
    }

    fn model(&self) -> &str {
        GenerationClient::model(self)
    }
}
