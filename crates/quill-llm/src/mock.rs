//! Mock generation client that records prompts.

use std::sync::Mutex;

use quill_core::error::QuillError;
use quill_core::types::Prompt;

use crate::client::GenerationClient;

#[derive(Debug, Clone)]
enum Behavior {
    Reply(String),
    Unavailable,
    Timeout(u64),
}

/// Generation client for tests.
///
/// Every prompt is recorded before the configured behavior is applied, so a
/// failing mock still shows what it was asked.
#[derive(Debug)]
pub struct MockGeneration {
    behavior: Behavior,
    prompts: Mutex<Vec<Prompt>>,
}

impl MockGeneration {
    /// Always answer with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Reply(reply.into()))
    }

    /// Always fail with [`QuillError::EndpointUnavailable`].
    pub fn unavailable() -> Self {
        Self::with_behavior(Behavior::Unavailable)
    }

    /// Always fail with [`QuillError::GenerationTimeout`].
    pub fn timing_out(after_secs: u64) -> Self {
        Self::with_behavior(Behavior::Timeout(after_secs))
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// All prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// The most recent prompt, if any.
    pub fn last_prompt(&self) -> Option<Prompt> {
        self.prompts.lock().ok().and_then(|p| p.last().cloned())
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl Default for MockGeneration {
    fn default() -> Self {
        Self::replying("mock reply")
    }
}

impl GenerationClient for MockGeneration {
    async fn generate(&self, prompt: &Prompt) -> Result<String, QuillError> {
        self.prompts
            .lock()
            .map_err(|e| QuillError::Storage(format!("Lock poisoned: {}", e)))?
            .push(prompt.clone());

        match &self.behavior {
            Behavior::Reply(reply) => Ok(reply.clone()),
            Behavior::Unavailable => Err(QuillError::EndpointUnavailable(
                "mock endpoint is down".to_string(),
            )),
            Behavior::Timeout(secs) => Err(QuillError::GenerationTimeout(*secs)),
        }
    }

    fn model(&self) -> &str {
        "mock"
    }
}
