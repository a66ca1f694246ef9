//! Ollama Completion Client
//!
//! `CompletionClient` for a local Ollama server using the plain
//! `/api/generate` endpoint. Local models are the typical case for
//! text-protocol tool calling: the request carries no tool schema at all.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::http_client::build_http_client;
use crate::provider::{parse_http_error, CompletionClient};
use crate::types::{LlmError, LlmResult, ProviderConfig};

/// Default Ollama API endpoint
const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

/// Ollama client for local inference
pub struct OllamaClient {
    config: ProviderConfig,
    client: reqwest::Client,
    endpoint: Url,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    done: bool,
}

impl OllamaClient {
    /// Create a new Ollama client with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let endpoint = Self::generate_endpoint(config.base_url.as_deref())?;
        let client = build_http_client(&config)?;
        Ok(Self {
            config,
            client,
            endpoint,
        })
    }

    /// Resolve `<base>/api/generate`, keeping any path prefix on the base URL.
    fn generate_endpoint(base_url: Option<&str>) -> LlmResult<Url> {
        let base = base_url.unwrap_or(OLLAMA_DEFAULT_URL);
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{}/", base)
        };
        Url::parse(&normalized)
            .and_then(|url| url.join("api/generate"))
            .map_err(|e| LlmError::InvalidRequest {
                message: format!("invalid Ollama base URL '{}': {}", base, e),
            })
    }

    fn build_request<'a>(&'a self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
                num_predict: (self.config.max_tokens > 0).then_some(self.config.max_tokens),
            },
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn map_transport_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_connect() {
            LlmError::ProviderUnavailable {
                message: format!(
                    "cannot reach Ollama at {}: {}",
                    self.endpoint.origin().ascii_serialization(),
                    err
                ),
            }
        } else {
            LlmError::NetworkError {
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: &str) -> LlmResult<String> {
        let body = self.build_request(prompt);
        tracing::debug!(
            model = %self.config.model,
            prompt_chars = prompt.len(),
            "ollama generate request"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
            message: e.to_string(),
        })?;

        if status != 200 {
            return Err(parse_http_error(status, &body_text, "ollama"));
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;
        if !parsed.done {
            tracing::warn!(model = %self.config.model, "ollama returned an unfinished generation");
        }
        Ok(parsed.response)
    }

    async fn health_check(&self) -> LlmResult<()> {
        let mut url = self.endpoint.clone();
        url.set_path("/api/tags");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status().as_u16();
        if status == 200 {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(parse_http_error(status, &body, "ollama"))
        }
    }
}
