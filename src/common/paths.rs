//! Configuration paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/bugreport-app-tester/`
//! - macOS: `~/Library/Application Support/bugreport-app-tester/`
//! - Windows: `%APPDATA%\bugreport-app-tester\`

use std::path::PathBuf;

/// Name used for the configuration directory
const APP_NAME: &str = "bugreport-app-tester";

/// Prefix of the per-run directory holding pulled artifacts
pub const DATA_DIR_PREFIX: &str = "aae-bugreport-";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
