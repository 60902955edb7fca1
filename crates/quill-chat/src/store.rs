//! Conversation log.

use serde::Serialize;

use quill_core::types::Turn;

/// Ordered, append-only log of one conversation.
///
/// Always starts with the assistant greeting. Lives for one session and is
/// never written to disk.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationStore {
    turns: Vec<Turn>,
}

impl ConversationStore {
    /// Create a log holding only the assistant's `greeting`.
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::assistant(greeting)],
        }
    }

    /// Append `turn` to the end of the log.
    ///
    /// Turns with empty or whitespace-only text are dropped; returns whether
    /// the turn was stored.
    pub fn append(&mut self, turn: Turn) -> bool {
        if turn.text.trim().is_empty() {
            return false;
        }
        self.turns.push(turn);
        true
    }

    /// All turns in the order they were added.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
