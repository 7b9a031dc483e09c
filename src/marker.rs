//! Applied-manifest marker
//!
//! Records which manifest version last converged cleanly. Written only
//! after a pass with zero failures, as an explicit step in the apply
//! command - never from inside the engine.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
pub struct AppliedMarker {
    pub version: String,
    pub applied_at: DateTime<Utc>,
}

impl AppliedMarker {
    /// Persist the marker for a cleanly applied manifest version
    pub fn record(path: &Path, version: &str) -> Result<()> {
        let marker = Self {
            version: version.to_string(),
            applied_at: Utc::now(),
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Could not create {}", dir.display()))?;
        }
        let content = serde_json::to_string_pretty(&marker)?;
        fs::write(path, content)
            .with_context(|| format!("Could not write marker {}", path.display()))?;
        Ok(())
    }

    /// Load the marker, `None` when no manifest was ever applied
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read marker {}", path.display()))?;
        let marker = serde_json::from_str(&content).context("Invalid marker format")?;
        Ok(Some(marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("applied.json");

        assert!(AppliedMarker::load(&path).unwrap().is_none());

        AppliedMarker::record(&path, "2024-06-01").unwrap();
        let marker = AppliedMarker::load(&path).unwrap().unwrap();
        assert_eq!(marker.version, "2024-06-01");
    }
}
