use serde::{Deserialize, Serialize};

// =============================================================================
// Conversation
// =============================================================================

/// Who authored a conversation turn.
///
/// Serialized in lowercase, which is also what the Ollama chat API expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }
}

// =============================================================================
// Prompts
// =============================================================================

/// A role-tagged message inside a structured prompt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl From<&Turn> for Message {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role,
            content: turn.text.clone(),
        }
    }
}

/// Input to a generation call. Built fresh per request and never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Prompt {
    /// Ordered chat messages, system instruction first.
    Messages(Vec<Message>),
    /// A single filled-in template.
    Text(String),
}

impl Prompt {
    /// Total characters across the prompt, for logging.
    pub fn char_count(&self) -> usize {
        match self {
            Prompt::Messages(messages) => messages.iter().map(|m| m.content.chars().count()).sum(),
            Prompt::Text(text) => text.chars().count(),
        }
    }
}

// =============================================================================
// Documents
// =============================================================================

/// A bounded, overlapping slice of a document's extracted text.
///
/// `source_offset` counts characters (not bytes) from the start of the page
/// the segment was cut from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub source_offset: usize,
    pub source_document_id: String,
    /// Zero-based page index within the source document.
    pub page: usize,
}
