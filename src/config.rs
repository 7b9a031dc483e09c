//! Settings file
//!
//! Optional `~/.config/printfleet/config.json`. Defaults apply when the
//! file is absent; a present-but-broken file is an error rather than a
//! silent fallback.

use anyhow::{Context, Result};
use reconcile::Delays;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("printfleet"))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Settings {
    /// Pause after each state-mutating call, in milliseconds
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Wait before the post-install verification probe, in milliseconds
    #[serde(default = "default_verify_ms")]
    pub verify_ms: u64,

    /// Override for the applied-manifest marker location
    #[serde(default)]
    pub marker_path: Option<PathBuf>,
}

fn default_settle_ms() -> u64 {
    1000
}

fn default_verify_ms() -> u64 {
    3000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            verify_ms: default_verify_ms(),
            marker_path: None,
        }
    }
}

impl Settings {
    /// Load config.json, falling back to defaults when it does not exist
    pub fn load() -> Result<Self> {
        let path = config_dir()?.join("config.json");
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        serde_json::from_str(&content).context("Invalid config.json format")
    }

    pub fn delays(&self) -> Delays {
        Delays::from_millis(self.settle_ms, self.verify_ms)
    }

    /// Where the applied-manifest marker lives
    pub fn marker_path(&self) -> Result<PathBuf> {
        match &self.marker_path {
            Some(path) => Ok(path.clone()),
            None => Ok(config_dir()?.join("applied.json")),
        }
    }
}
