//! Platform configuration and log paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/tson-runner/`
//! - macOS: `~/Library/Application Support/tson-runner/`
//! - Windows: `%APPDATA%\tson-runner\`

use std::path::{Path, PathBuf};

/// Application name used for all per-user directories
const APP_NAME: &str = "tson-runner";

/// File name of the global properties file inside the config directory
pub const GLOBAL_PROPERTIES: &str = "global.properties";

/// File name of the per-workspace properties file
pub const LOCAL_PROPERTIES: &str = "local.properties";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the path to the global properties file
pub fn global_properties_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(GLOBAL_PROPERTIES))
}

/// Get the path to a workspace's local properties file
pub fn local_properties_path(workspace: &Path) -> PathBuf {
    workspace.join(LOCAL_PROPERTIES)
}

/// Resolve `relative` against `root`, leaving absolute paths untouched
pub fn resolve_in(root: &Path, relative: &Path) -> PathBuf {
    if relative.is_absolute() {
        relative.to_path_buf()
    } else {
        root.join(relative)
    }
}
