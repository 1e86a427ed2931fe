//! Configuration module for batchsearch-rs
//!
//! Handles loading settings from YAML files and environment variables, and
//! exposes them to the runner through the key based [`ConfigSource`] trait.

mod properties;
mod settings;

pub use properties::*;
pub use settings::*;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Load settings from the first settings file found, then the environment
///
/// Lookup order: `BATCHSEARCH_SETTINGS_PATH`, `./settings.yml`,
/// `./config/settings.yml`, `<config dir>/batchsearch-rs/settings.yml`.
pub fn load() -> Result<Settings> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(path) = std::env::var("BATCHSEARCH_SETTINGS_PATH") {
        candidates.push(PathBuf::from(path));
    }
    candidates.push(PathBuf::from("settings.yml"));
    candidates.push(PathBuf::from("config/settings.yml"));
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("batchsearch-rs/settings.yml"));
    }

    let mut settings = match candidates.iter().find(|p| p.exists()) {
        Some(path) => {
            info!("Loading settings from: {}", path.display());
            Settings::from_file(path)?
        }
        None => {
            info!("No settings file found, using defaults");
            Settings::default()
        }
    };
    settings.merge_env();
    Ok(settings)
}
