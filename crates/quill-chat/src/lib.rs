//! Conversational interface for Quill.
//!
//! Holds the conversation log, turns it into a prompt for the model, and
//! ties both to a generation client in a [`ChatSession`].

pub mod prompt;
pub mod session;
pub mod store;

pub use prompt::PromptAssembler;
pub use session::ChatSession;
pub use store::ConversationStore;
