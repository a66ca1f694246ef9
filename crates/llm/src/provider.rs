//! Completion Client Trait
//!
//! Defines the interface the chat orchestrator uses to reach a model. The
//! orchestrator only needs plain text in, plain text out: tool calling is
//! carried inside the text, so no native function-calling support is assumed.

use async_trait::async_trait;

use super::types::{LlmError, LlmResult};

/// A text-completion model.
///
/// Implementations own transport concerns (timeouts, retries, auth). A failed
/// call is returned as-is; callers do not retry.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &str;

    /// Returns the model being used.
    fn model(&self) -> &str;

    /// Complete the given prompt and return the model's raw text.
    async fn complete(&self, prompt: &str) -> LlmResult<String>;

    /// Check if the provider is reachable.
    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }
}

/// Helper function to map HTTP error status codes
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    match status {
        404 => LlmError::ModelNotFound {
            model: body.to_string(),
        },
        400 => LlmError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => LlmError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => LlmError::Other {
            message: format!("{}: HTTP {}: {}", provider, status, body),
        },
    }
}
