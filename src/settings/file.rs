//! Loading and saving settings as TOML.

use crate::error::Result;
use crate::settings::Settings;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = "skbhook";
const CONFIG_FILE_NAME: &str = "skbhook.toml";

/// Default settings file location, `<config dir>/skbhook/skbhook.toml`.
///
/// `None` when the platform has no per-user config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Reads and validates settings from a TOML file.
///
/// Missing keys fall back to their defaults.
///
/// # Arguments
///
/// * `path` - File to read
///
/// # Returns
///
/// * `Ok(Settings)` - If the file parsed and passed validation
/// * `Err(SkbHookError)` - `Io`, `ConfigParse` or `InvalidSettings`
pub fn load_settings(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)?;
    let settings: Settings = toml::from_str(&content)?;
    settings.validate()?;

    info!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Writes `settings` to `path`, creating parent directories as needed.
///
/// # Arguments
///
/// * `path` - Destination file, overwritten if present
/// * `settings` - Settings to serialize
pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let content = toml::to_string_pretty(settings)?;
    fs::write(path, content)?;

    info!("Saved settings to {}", path.display());
    Ok(())
}
