//! Chat Settings Store
//!
//! Owns `~/.paper-desk/config.json`: the settings every new chat service is
//! built from. Writes go through a sibling temp file and a rename, so a crash
//! mid-save never leaves a truncated settings file behind.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use paper_desk_tools::ToolRegistry;

use crate::models::settings::{ChatSettings, SettingsUpdate};
use crate::services::chat::ChatService;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_dir, ensure_paper_desk_dir};

/// Persistent chat settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    settings: ChatSettings,
}

impl ConfigService {
    /// Open `~/.paper-desk/config.json`, writing defaults if it is missing
    pub fn new() -> AppResult<Self> {
        ensure_paper_desk_dir()?;
        Self::with_path(config_path()?)
    }

    /// Open an explicit settings file, writing defaults if it is missing
    pub fn with_path(config_path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = config_path.into();
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir(parent)?;
            }
        }

        let settings = if config_path.exists() {
            read_settings(&config_path)?
        } else {
            let defaults = ChatSettings::default();
            write_settings(&config_path, &defaults)?;
            tracing::info!(path = %config_path.display(), "created default chat settings");
            defaults
        };

        Ok(Self {
            config_path,
            settings,
        })
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply a partial update and persist it.
    ///
    /// An update that fails validation leaves both memory and disk untouched.
    pub fn update_settings(&mut self, update: SettingsUpdate) -> AppResult<ChatSettings> {
        let mut candidate = self.settings.clone();
        candidate.apply_update(update);
        write_settings(&self.config_path, &candidate)?;
        tracing::info!(
            max_iterations = candidate.max_iterations,
            model = %candidate.model.model,
            "chat settings updated"
        );
        self.settings = candidate;
        Ok(self.settings.clone())
    }

    /// Re-read the file after an external edit. Returns whether anything changed.
    ///
    /// A file that no longer parses or validates is reported and the settings
    /// in memory are kept.
    pub fn reload(&mut self) -> AppResult<bool> {
        let fresh = read_settings(&self.config_path)?;
        let changed = fresh != self.settings;
        if changed {
            tracing::info!(path = %self.config_path.display(), "chat settings reloaded");
            self.settings = fresh;
        }
        Ok(changed)
    }

    /// Restore and persist the default settings
    pub fn reset(&mut self) -> AppResult<()> {
        let defaults = ChatSettings::default();
        write_settings(&self.config_path, &defaults)?;
        self.settings = defaults;
        Ok(())
    }

    /// Build a chat service over the local Ollama model from the current settings.
    pub fn chat_service(&self, registry: Arc<ToolRegistry>) -> AppResult<ChatService> {
        ChatService::from_settings(self.settings.clone(), registry)
    }
}

fn read_settings(path: &Path) -> AppResult<ChatSettings> {
    let content = fs::read_to_string(path)?;
    let settings: ChatSettings = serde_json::from_str(&content).map_err(|e| {
        AppError::config(format!("{} is not valid settings JSON: {}", path.display(), e))
    })?;
    settings.validate().map_err(AppError::validation)?;
    Ok(settings)
}

fn write_settings(path: &Path, settings: &ChatSettings) -> AppResult<()> {
    settings.validate().map_err(AppError::validation)?;
    let content = serde_json::to_string_pretty(settings)?;
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, content)?;
    fs::rename(&staging, path)?;
    Ok(())
}
