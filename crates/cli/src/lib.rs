use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::warn;
use zign_core::db::ZignConfig;
use zign_core::Zignatures;

pub mod commands;

/// Where the CLI keeps its signatures and how to interpret them.
#[derive(Debug, Clone)]
pub struct Session {
    /// Signature file read on startup and written back after mutations.
    pub db_path: PathBuf,
    pub engine: Zignatures,
}

impl Session {
    /// Load the config (if given), the signature file (if it exists) and
    /// select `space`.
    pub fn open(db_path: &Path, config_path: Option<&Path>, space: Option<&str>) -> Result<Self> {
        let config = match config_path {
            Some(path) => ZignConfig::load(path)?,
            None => ZignConfig::default(),
        };
        let mut engine = Zignatures::with_config(config).context("Failed to apply config")?;

        if db_path.is_file() {
            let report = engine
                .store_mut()
                .load(db_path)
                .with_context(|| format!("Failed to load signatures from {}", db_path.display()))?;
            if report.skipped > 0 {
                warn!(
                    skipped = report.skipped,
                    db = %db_path.display(),
                    "skipped malformed signature entries"
                );
            }
        }
        if let Some(space) = space {
            engine
                .select_space(Some(space))
                .with_context(|| format!("Failed to select space '{space}'"))?;
        }
        Ok(Self { db_path: db_path.to_path_buf(), engine })
    }

    /// Write the store back to `db_path`. An empty store leaves an empty file.
    pub fn persist(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        if self.engine.store().is_empty() {
            fs::write(&self.db_path, "").with_context(|| {
                format!("Failed to write signatures to {}", self.db_path.display())
            })?;
            return Ok(());
        }
        self.engine
            .save(&self.db_path)
            .with_context(|| format!("Failed to write signatures to {}", self.db_path.display()))
    }
}

/// Parse an address given as `0x`-prefixed hex or decimal.
pub fn parse_address(text: &str) -> Result<u64> {
    let trimmed = text.trim();
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };
    parsed.map_err(|_| anyhow!("Invalid address '{}'", text))
}
