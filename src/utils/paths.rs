//! Cross-Platform Path Utilities
//!
//! Resolves the Paper Desk data directory (~/.paper-desk/).

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the Paper Desk directory (~/.paper-desk/)
pub fn paper_desk_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".paper-desk"))
}

/// Get the config file path (~/.paper-desk/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(paper_desk_dir()?.join("config.json"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Get the Paper Desk directory, creating if it doesn't exist
pub fn ensure_paper_desk_dir() -> AppResult<PathBuf> {
    let path = paper_desk_dir()?;
    ensure_dir(&path)?;
    Ok(path)
}
