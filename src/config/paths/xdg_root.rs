//! XDG Base Directory utilities.

use crate::error::CatalogError;
use std::path::PathBuf;

/// Directory name used under the XDG roots.
pub const APP_DIR: &str = "lesson-catalog";

/// Get XDG data home directory
///
/// Returns `$XDG_DATA_HOME` if set, otherwise defaults to `$HOME/.local/share`
pub fn data_home() -> Result<PathBuf, CatalogError> {
    if let Ok(xdg_data_home) = std::env::var("XDG_DATA_HOME") {
        if !xdg_data_home.is_empty() {
            return Ok(PathBuf::from(xdg_data_home));
        }
    }
    home().map(|home| home.join(".local").join("share"))
}

/// Get XDG config home directory
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise defaults to `$HOME/.config`
pub fn config_home() -> Result<PathBuf, CatalogError> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config_home.is_empty() {
            return Ok(PathBuf::from(xdg_config_home));
        }
    }
    home().map(|home| home.join(".config"))
}

/// `$XDG_DATA_HOME/lesson-catalog/`
pub fn app_data_dir() -> Result<PathBuf, CatalogError> {
    Ok(data_home()?.join(APP_DIR))
}

fn home() -> Result<PathBuf, CatalogError> {
    std::env::var("HOME").map(PathBuf::from).map_err(|_| {
        CatalogError::Config("Could not determine home directory (HOME not set)".to_string())
    })
}
