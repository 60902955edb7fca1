//! Chat session: one conversation bound to one model.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use quill_core::config::ChatConfig;
use quill_core::error::QuillError;
use quill_core::types::Turn;
use quill_llm::DynGenerationClient;

use crate::prompt::PromptAssembler;
use crate::store::ConversationStore;

/// A single conversation with the model.
///
/// Owns its log; independent sessions never share turns.
pub struct ChatSession {
    store: ConversationStore,
    assembler: PromptAssembler,
    client: Arc<dyn DynGenerationClient>,
}

impl ChatSession {
    pub fn new(
        store: ConversationStore,
        assembler: PromptAssembler,
        client: Arc<dyn DynGenerationClient>,
    ) -> Self {
        Self {
            store,
            assembler,
            client,
        }
    }

    /// Start a conversation seeded with the configured greeting and system prompt.
    pub fn from_config(config: &ChatConfig, client: Arc<dyn DynGenerationClient>) -> Self {
        Self::new(
            ConversationStore::new(config.greeting.clone()),
            PromptAssembler::new(config.system_prompt.clone()),
            client,
        )
    }

    /// Send a user message and return the model's reply.
    ///
    /// Blank messages return `Ok(None)` without contacting the model. The
    /// user turn and the reply are appended together once generation
    /// succeeds; on error the log is left as it was.
    pub async fn send(&mut self, message: &str) -> Result<Option<String>, QuillError> {
        if message.trim().is_empty() {
            debug!("Ignoring blank chat message");
            return Ok(None);
        }

        let user_turn = Turn::user(message);
        let mut pending = self.store.all().to_vec();
        pending.push(user_turn.clone());
        let prompt = self.assembler.assemble(&pending);

        let started = Instant::now();
        let reply = match self.client.generate_boxed(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(model = %self.client.model(), error = %e, "Chat generation failed");
                return Err(e);
            }
        };

        self.store.append(user_turn);
        self.store.append(Turn::assistant(reply.clone()));
        info!(
            model = %self.client.model(),
            turns = self.store.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Chat turn complete"
        );
        Ok(Some(reply))
    }

    /// The conversation so far, greeting first.
    pub fn history(&self) -> &[Turn] {
        self.store.all()
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("model", &self.client.model())
            .field("turns", &self.store.len())
            .finish()
    }
}
