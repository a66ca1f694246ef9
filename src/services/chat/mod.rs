//! Chat Orchestrator
//!
//! Tool-calling chat over a plain text-completion model.

pub mod prompt;
pub mod service;
pub mod stream;

pub use prompt::DEFAULT_SYSTEM_PREAMBLE;
pub use service::{ChatRequest, ChatService, TurnResult, CHAT_COMPLETION_PURPOSE};
pub use stream::{ChatEventStream, ChatStream};
