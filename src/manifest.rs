//! Manifest loading and validation
//!
//! The manifest models install and removal as two disjoint sections rather
//! than a per-entry flag; the loader converts both into `DesiredDevice`
//! records. Validation lives here, not in the engine: by the time records
//! reach the reconciler, names are unique and required fields are present.

use anyhow::{bail, Context, Result};
use reconcile::{DesiredDevice, Lifecycle};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    /// Opaque version label, recorded in the applied marker on success
    #[serde(default)]
    pub version: Option<String>,

    /// Devices that should exist
    #[serde(default)]
    pub printers: Vec<PrinterEntry>,

    /// Devices that should be gone
    #[serde(default)]
    pub remove: Vec<RemovalEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterEntry {
    pub name: String,
    pub address: String,
    pub driver: String,
    #[serde(default)]
    pub driver_package: Option<String>,
    /// Feature defaults (key -> value), applied on reconfigure
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
    /// Vendor module settings, applied through the same configuration call
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovalEntry {
    pub name: String,
    /// Optional address fallback for matching a renamed device
    #[serde(default)]
    pub address: Option<String>,
}

impl Manifest {
    /// Load a manifest from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid manifest format in {}", path.display()))
    }

    /// Validate the manifest before it reaches the engine
    ///
    /// Duplicate names are rejected here: within one manifest the name is
    /// the natural key, and last-wins behavior downstream would silently
    /// drop an entry.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::new();

        for entry in &self.printers {
            if entry.name.trim().is_empty() {
                bail!("printer entry with empty name");
            }
            if entry.address.trim().is_empty() {
                bail!("printer {}: empty address", entry.name);
            }
            if entry.driver.trim().is_empty() {
                bail!("printer {}: empty driver identity", entry.name);
            }
            if !seen.insert(entry.name.as_str()) {
                bail!("duplicate device name in manifest: {}", entry.name);
            }
        }

        for entry in &self.remove {
            if entry.name.trim().is_empty() {
                bail!("removal entry with empty name");
            }
            if !seen.insert(entry.name.as_str()) {
                bail!("duplicate device name in manifest: {}", entry.name);
            }
        }

        Ok(())
    }

    /// Convert into engine records, manifest order preserved
    pub fn to_devices(&self) -> Vec<DesiredDevice> {
        let mut devices = Vec::with_capacity(self.printers.len() + self.remove.len());

        for entry in &self.remove {
            devices.push(DesiredDevice {
                name: entry.name.clone(),
                address: entry.address.clone().unwrap_or_default(),
                driver: String::new(),
                driver_package: String::new(),
                feature_defaults: BTreeMap::new(),
                vendor_modules: BTreeMap::new(),
                lifecycle: Lifecycle::Remove,
            });
        }

        for entry in &self.printers {
            devices.push(DesiredDevice {
                name: entry.name.clone(),
                address: entry.address.clone(),
                driver: entry.driver.clone(),
                driver_package: entry.driver_package.clone().unwrap_or_default(),
                feature_defaults: entry.defaults.clone(),
                vendor_modules: entry.modules.clone(),
                lifecycle: Lifecycle::Install,
            });
        }

        devices
    }
}
