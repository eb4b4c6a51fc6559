//! Configuration module for bsql.
//!
//! Handles the settings file (~/.config/bsql/config.toml) and the saved
//! connection history (~/.config/bsql/connections.json).

mod connections;
mod schema;

pub use connections::{
    delete_connection, delete_connection_at, load_history, load_history_from, save_connection,
    save_connection_at, ConnectionConfig,
};
pub use schema::{Config, DisplayConfig, SqlConfig};

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Returns the config directory path.
///
/// Checks the `BSQL_CONFIG_DIR` environment variable first, then falls back
/// to the system default (~/.config/bsql on Linux/macOS).
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("BSQL_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|p| p.join("bsql"))
}

/// Returns the settings file path (~/.config/bsql/config.toml).
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

/// Returns the connection-history file path (~/.config/bsql/connections.json).
pub fn history_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("connections.json"))
}

/// Load configuration from the default path or return defaults.
pub fn load_config() -> Result<Config> {
    if let Some(path) = config_path() {
        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }
    }
    Ok(Config::default())
}
