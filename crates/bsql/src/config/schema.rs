//! Settings file schema.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub sql: SqlConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Rows fetched per table-view page.
    pub page_size: usize,
    /// Width of the table sidebar, in terminal columns.
    pub sidebar_width: u16,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            sidebar_width: 26,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlConfig {
    /// Render completed keywords in lower case. Toggleable at runtime with
    /// Ctrl+T; this only sets the starting state.
    pub lowercase_keywords: bool,
}
