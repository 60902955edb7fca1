//! Retrieval and answer assembly.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use quill_core::config::{DocumentsConfig, CONTEXT_PLACEHOLDER, QUERY_PLACEHOLDER};
use quill_core::error::QuillError;
use quill_core::types::{Prompt, Segment};
use quill_llm::DynGenerationClient;
use quill_vector::SegmentStore;

/// Separator placed between retrieved segments in the context block.
const CONTEXT_SEPARATOR: &str = "\n\n";

/// A generated answer and the segments it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<Segment>,
}

/// Answers questions from the segments in a [`SegmentStore`].
pub struct AnswerAssembler {
    store: SegmentStore,
    client: Arc<dyn DynGenerationClient>,
    template: String,
    top_k: usize,
}

impl AnswerAssembler {
    pub fn new(
        store: SegmentStore,
        client: Arc<dyn DynGenerationClient>,
        template: impl Into<String>,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            client,
            template: template.into(),
            top_k,
        }
    }

    pub fn from_config(
        config: &DocumentsConfig,
        store: SegmentStore,
        client: Arc<dyn DynGenerationClient>,
    ) -> Self {
        Self::new(store, client, config.prompt_template.clone(), config.top_k)
    }

    /// Retrieve the closest segments to `query` and have the model answer
    /// from them.
    ///
    /// With nothing indexed the prompt is still sent, with an empty context.
    pub async fn answer(&self, query: &str) -> Result<Answer, QuillError> {
        let started = Instant::now();
        let hits = self.store.similarity_search(query, self.top_k).await?;
        let sources: Vec<Segment> = hits.into_iter().map(|h| h.segment).collect();

        let context = sources
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);
        let prompt = fill_template(&self.template, query, &context);
        debug!(
            sources = sources.len(),
            prompt_chars = prompt.chars().count(),
            "Answer prompt assembled"
        );

        let text = self.client.generate_boxed(&Prompt::Text(prompt)).await?;
        info!(
            model = %self.client.model(),
            sources = sources.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Answer generated"
        );
        Ok(Answer { text, sources })
    }
}

impl std::fmt::Debug for AnswerAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerAssembler")
            .field("model", &self.client.model())
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

/// Substitute both placeholders in one left-to-right pass.
///
/// Placeholder text appearing inside the query or the context is left
/// alone rather than substituted again.
fn fill_template(template: &str, query: &str, context: &str) -> String {
    let mut out = String::with_capacity(template.len() + query.len() + context.len());
    let mut rest = template;

    loop {
        let next = [(QUERY_PLACEHOLDER, query), (CONTEXT_PLACEHOLDER, context)]
            .into_iter()
            .filter_map(|(placeholder, value)| {
                rest.find(placeholder).map(|i| (i, placeholder, value))
            })
            .min_by_key(|(i, _, _)| *i);

        match next {
            Some((i, placeholder, value)) => {
                out.push_str(&rest[..i]);
                out.push_str(value);
                rest = &rest[i + placeholder.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}
