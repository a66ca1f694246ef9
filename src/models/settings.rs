//! Settings Models
//!
//! Chat orchestrator configuration stored in config.json.

use serde::{Deserialize, Serialize};

use paper_desk_llm::ProviderConfig;

/// Upper bound accepted for `max_iterations`
pub const MAX_ITERATIONS_LIMIT: u32 = 50;

/// Upper bound accepted for `history_window`
pub const MAX_HISTORY_WINDOW: usize = 100;

/// Chat orchestrator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Model calls allowed per turn before the loop stops
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Number of trailing history messages included in each prompt
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Replaces the built-in system preamble when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_preamble: Option<String>,
    /// Capacity of the stream event channel
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
    /// Model client configuration
    #[serde(default)]
    pub model: ProviderConfig,
}

fn default_max_iterations() -> u32 {
    5
}

fn default_history_window() -> usize {
    10
}

fn default_stream_buffer() -> usize {
    64
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            history_window: default_history_window(),
            system_preamble: None,
            stream_buffer: default_stream_buffer(),
            model: ProviderConfig::default(),
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub max_iterations: Option<u32>,
    pub history_window: Option<usize>,
    /// `Some(None)` clears the override
    pub system_preamble: Option<Option<String>>,
    pub stream_buffer: Option<usize>,
    pub model_base_url: Option<Option<String>>,
    pub model_name: Option<String>,
    pub temperature: Option<f32>,
    pub request_timeout_secs: Option<u64>,
}

impl ChatSettings {
    /// Apply a partial update to the settings
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(max_iterations) = update.max_iterations {
            self.max_iterations = max_iterations;
        }
        if let Some(history_window) = update.history_window {
            self.history_window = history_window;
        }
        if let Some(preamble) = update.system_preamble {
            self.system_preamble = preamble;
        }
        if let Some(stream_buffer) = update.stream_buffer {
            self.stream_buffer = stream_buffer;
        }
        if let Some(base_url) = update.model_base_url {
            self.model.base_url = base_url;
        }
        if let Some(model) = update.model_name {
            self.model.model = model;
        }
        if let Some(temperature) = update.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = update.request_timeout_secs {
            self.model.request_timeout_secs = timeout;
        }
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 || self.max_iterations > MAX_ITERATIONS_LIMIT {
            return Err(format!(
                "max_iterations must be between 1 and {}, got {}",
                MAX_ITERATIONS_LIMIT, self.max_iterations
            ));
        }

        if self.history_window > MAX_HISTORY_WINDOW {
            return Err(format!(
                "history_window cannot exceed {}",
                MAX_HISTORY_WINDOW
            ));
        }

        if self.stream_buffer == 0 {
            return Err("stream_buffer must be at least 1".to_string());
        }

        if self.model.model.trim().is_empty() {
            return Err("model name cannot be empty".to_string());
        }

        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.model.temperature
            ));
        }

        if matches!(&self.system_preamble, Some(p) if p.trim().is_empty()) {
            return Err("system_preamble cannot be blank; clear it instead".to_string());
        }

        Ok(())
    }
}
