//! Prompt assembly for chat.

use quill_core::types::{Message, Prompt, Role, Turn};

/// Builds the structured prompt sent to the model for a conversation.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    system_instruction: String,
}

impl PromptAssembler {
    pub fn new(system_instruction: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
        }
    }

    /// System instruction first, then every turn in order with its role and
    /// text unchanged. Nothing is truncated.
    pub fn assemble(&self, turns: &[Turn]) -> Prompt {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(Message {
            role: Role::System,
            content: self.system_instruction.clone(),
        });
        messages.extend(turns.iter().map(Message::from));
        Prompt::Messages(messages)
    }
}
