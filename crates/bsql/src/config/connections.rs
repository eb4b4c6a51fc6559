//! Saved-connection history.
//!
//! The history is an MRU-ordered list of connection descriptors persisted as
//! one JSON document, rewritten whole on every mutation. Entry identity is
//! the derived `user@host:port/dbname` key — never the display name — so
//! re-saving a connection replaces it in place and editing a history row
//! naturally upserts the original entry.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::db::Driver;

use super::history_path;

/// Current history file schema version.
const HISTORY_VERSION: u32 = 1;

/// A connection descriptor as entered on the Connect form. Empty fields mean
/// "use the driver default"; substitution happens in the `effective_*`
/// accessors, not at rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Optional display label. Presentation only; never part of identity.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub driver: Driver,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub port: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

impl ConnectionConfig {
    pub fn effective_host(&self) -> &str {
        if self.host.is_empty() {
            "localhost"
        } else {
            &self.host
        }
    }

    pub fn effective_port(&self) -> &str {
        if self.port.is_empty() {
            self.driver.default_port()
        } else {
            &self.port
        }
    }

    pub fn effective_user(&self) -> &str {
        if self.user.is_empty() {
            self.driver.default_user()
        } else {
            &self.user
        }
    }

    pub fn effective_database(&self) -> &str {
        if self.database.is_empty() {
            self.driver.default_database()
        } else {
            &self.database
        }
    }

    /// Canonical connection identity: `user@host:port/dbname` after
    /// driver-default substitution.
    pub fn derived_key(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.effective_user(),
            self.effective_host(),
            self.effective_port(),
            self.effective_database()
        )
    }

    /// What the history list shows: the explicit name when given, the
    /// derived key otherwise.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            self.derived_key()
        } else {
            self.name.clone()
        }
    }

    pub fn same_connection(&self, other: &ConnectionConfig) -> bool {
        self.derived_key() == other.derived_key()
    }
}

/// The history file format with versioning.
#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    version: u32,
    entries: Vec<ConnectionConfig>,
}

/// Load history from the default path, most recently used first.
pub fn load_history() -> Result<Vec<ConnectionConfig>> {
    let path = history_path().context("Could not determine history path")?;
    load_history_from(&path)
}

/// Load history from a specific path. A missing file is an empty history; a
/// file written by a future version is treated as empty to be safe.
pub fn load_history_from(path: &Path) -> Result<Vec<ConnectionConfig>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file: {}", path.display()))?;

    let file: HistoryFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse history file: {}", path.display()))?;

    if file.version > HISTORY_VERSION {
        return Ok(Vec::new());
    }

    Ok(file.entries)
}

/// Upsert a descriptor into the default history file: replace in place when
/// the derived key already exists, prepend otherwise.
pub fn save_connection(config: &ConnectionConfig) -> Result<()> {
    let path = history_path().context("Could not determine history path")?;
    save_connection_at(&path, config)
}

pub fn save_connection_at(path: &Path, config: &ConnectionConfig) -> Result<()> {
    // A corrupt file degrades to an empty history and is rewritten whole.
    let mut entries = load_history_from(path).unwrap_or_default();

    let mut entry = config.clone();
    entry.last_used = Some(Utc::now());

    if let Some(existing) = entries.iter_mut().find(|e| e.same_connection(config)) {
        *existing = entry;
    } else {
        entries.insert(0, entry);
    }

    write_history(path, &entries)
}

/// Remove every entry matching the descriptor's derived key.
pub fn delete_connection(config: &ConnectionConfig) -> Result<()> {
    let path = history_path().context("Could not determine history path")?;
    delete_connection_at(&path, config)
}

pub fn delete_connection_at(path: &Path, config: &ConnectionConfig) -> Result<()> {
    let mut entries = load_history_from(path).unwrap_or_default();
    entries.retain(|e| !e.same_connection(config));
    write_history(path, &entries)
}

/// Persist the full list atomically (temp file + rename in the same dir).
fn write_history(path: &Path, entries: &[ConnectionConfig]) -> Result<()> {
    let parent = path
        .parent()
        .context("History path has no parent directory")?;
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;

    let file = HistoryFile {
        version: HISTORY_VERSION,
        entries: entries.to_vec(),
    };
    let content = serde_json::to_string_pretty(&file).context("Failed to serialize history")?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in: {}", parent.display()))?;
    tmp.write_all(content.as_bytes())
        .context("Failed to write temp history file")?;
    tmp.flush().context("Failed to flush temp history file")?;
    tmp.persist(path)
        .map_err(|e| anyhow::anyhow!("Failed to persist history file: {}", e))?;

    Ok(())
}
