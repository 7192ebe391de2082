//! Configuration module for RagSearch-RS
//!
//! Handles loading and validating settings from YAML files and environment variables.
//! Settings are passed explicitly to the components that need them; there is no
//! process-wide settings instance.

mod settings;

pub use settings::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable pointing at an explicit settings file
pub const SETTINGS_PATH_VAR: &str = "RAGSEARCH_SETTINGS_PATH";

/// Candidate settings file locations, in lookup order
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(path) = std::env::var(SETTINGS_PATH_VAR) {
        paths.push(PathBuf::from(path));
    }
    paths.push(PathBuf::from("settings.yml"));
    paths.push(PathBuf::from("config/settings.yml"));
    paths.push(PathBuf::from("/etc/ragsearch/settings.yml"));
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("ragsearch-rs/settings.yml"));
    }
    paths
}

/// The first settings file that exists, if any
pub fn locate() -> Option<PathBuf> {
    search_paths().into_iter().find(|p| p.exists())
}

/// Load settings from `path` (or defaults), then apply environment
/// overrides and validate
///
/// Nothing is logged here; callers usually load settings before the
/// subscriber exists.
pub fn load_from(path: Option<&Path>) -> Result<Settings> {
    let mut settings = match path {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("invalid settings file {}", path.display()))?,
        None => Settings::default(),
    };

    settings.merge_env();
    settings.validate()?;
    Ok(settings)
}
