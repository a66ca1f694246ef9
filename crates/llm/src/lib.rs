//! Paper Desk LLM
//!
//! Text-completion model access for the chat orchestrator:
//! - `CompletionClient` - the prompt-in, text-out abstraction
//! - `OllamaClient` - local inference via Ollama's `/api/generate`
//! - conversation `Message` types and `LlmError`
//!
//! Also includes the HTTP client factory.

pub mod http_client;
pub mod ollama;
pub mod provider;
pub mod types;

// Re-export main types
pub use http_client::build_http_client;
pub use ollama::OllamaClient;
pub use provider::CompletionClient;
pub use types::*;
