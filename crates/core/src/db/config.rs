use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::validate_space_name;

/// Default minimum pattern length considered by the search engine.
pub const DEFAULT_MIN_SEARCH_SIZE: usize = 4;

/// Serializable engine configuration.
///
/// Usually read from a JSON file; every field is optional on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZignConfig {
    /// Directories consulted when a signature file is not found as given.
    pub search_paths: Vec<PathBuf>,
    /// Byte patterns shorter than this are left out of searches.
    pub min_search_size: usize,
    /// Graph signatures with a lower cyclomatic complexity are never compared.
    pub min_graph_cc: i32,
    /// Space selected when an engine is created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_space: Option<String>,
}

impl Default for ZignConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            min_search_size: DEFAULT_MIN_SEARCH_SIZE,
            min_graph_cc: 0,
            default_space: None,
        }
    }
}

impl ZignConfig {
    /// Load a JSON config from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config: ZignConfig =
            serde_json::from_str(&json).context("Failed to parse config JSON")?;
        if let Some(space) = &config.default_space {
            validate_space_name(space)
                .with_context(|| format!("Invalid default space in {}", path.display()))?;
        }
        Ok(config)
    }

    /// Locate a signature file: as given first, then inside each search path.
    pub fn resolve(&self, file: &Path) -> Option<PathBuf> {
        if file.is_file() {
            return Some(file.to_path_buf());
        }
        if file.is_absolute() {
            return None;
        }
        self.search_paths.iter().map(|dir| dir.join(file)).find(|candidate| candidate.is_file())
    }
}
