//! Ollama-backed generation client.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use quill_core::config::ModelConfig;
use quill_core::error::QuillError;
use quill_core::types::{Message, Prompt};

use crate::client::GenerationClient;
use crate::endpoint::OllamaEndpoint;

/// Generation client for a model served by Ollama.
///
/// Structured prompts go to `/api/chat`, plain templates to `/api/generate`.
/// Streaming is disabled; every call waits for the complete response.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    endpoint: OllamaEndpoint,
    model: String,
    options: GenerationOptions,
}

/// Sampling options forwarded with every request.
#[derive(Debug, Clone, Copy, Serialize)]
struct GenerationOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    options: GenerationOptions,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerationOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaClient {
    /// Create a client from the `[model]` configuration section.
    pub fn new(config: &ModelConfig) -> Result<Self, QuillError> {
        Ok(Self::with_endpoint(OllamaEndpoint::from_config(config)?, config))
    }

    /// Create a client on top of an existing endpoint.
    pub fn with_endpoint(endpoint: OllamaEndpoint, config: &ModelConfig) -> Self {
        Self {
            endpoint,
            model: config.name.clone(),
            options: GenerationOptions {
                temperature: config.temperature,
                num_predict: config.max_tokens,
            },
        }
    }
}

impl GenerationClient for OllamaClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String, QuillError> {
        let started = Instant::now();
        debug!(
            model = %self.model,
            prompt_chars = prompt.char_count(),
            "Submitting prompt"
        );

        let output = match prompt {
            Prompt::Messages(messages) => {
                let request = ChatRequest {
                    model: &self.model,
                    messages,
                    stream: false,
                    options: self.options,
                };
                let response: ChatResponse = self.endpoint.post_json("/api/chat", &request).await?;
                response.message.content
            }
            Prompt::Text(text) => {
                let request = GenerateRequest {
                    model: &self.model,
                    prompt: text,
                    stream: false,
                    options: self.options,
                };
                let response: GenerateResponse =
                    self.endpoint.post_json("/api/generate", &request).await?;
                response.response
            }
        };

        info!(
            model = %self.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            output_chars = output.chars().count(),
            "Generation complete"
        );
        Ok(output)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
