//! Device identity model
//!
//! Value types for the desired and observed sides of a reconciliation pass,
//! plus the matching rules the diff engine decides with. Everything here is
//! pure value comparison; no system state is touched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether a manifest entry wants the device present or gone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Install,
    Remove,
}

/// A printing device as declared in the manifest
///
/// `name` is the natural key within one manifest. Duplicate names are the
/// loader's problem: validation happens before records reach the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesiredDevice {
    /// Logical device name, unique within the manifest
    pub name: String,
    /// Network address (IP) the device should be bound to
    pub address: String,
    /// Driver identity as the driver store reports it
    pub driver: String,
    /// Path to the driver package, empty when the driver is pre-staged
    #[serde(default)]
    pub driver_package: String,
    /// Feature defaults applied on reconfigure (key -> value)
    #[serde(default)]
    pub feature_defaults: BTreeMap<String, String>,
    /// Vendor module settings, applied through the same configuration call
    #[serde(default)]
    pub vendor_modules: BTreeMap<String, String>,
    pub lifecycle: Lifecycle,
}

impl DesiredDevice {
    /// Standard TCP/IP port name this device's port is created under
    pub fn port_name(&self) -> String {
        format!("IP_{}", self.address.trim())
    }

    /// Iterate feature defaults followed by vendor module settings
    pub fn settings(&self) -> impl Iterator<Item = (&String, &String)> {
        self.feature_defaults.iter().chain(self.vendor_modules.iter())
    }
}

/// A device as currently registered on the machine
///
/// A point-in-time snapshot fact. The engine re-probes for every manifest
/// entry and never caches one of these across entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedDevice {
    pub name: String,
    pub port_name: String,
    pub driver: String,
    pub address: String,
}

/// The three independent lookup results for one desired device
///
/// Name, port, and address are probed separately because the registered
/// objects drift independently under repeated redeploys. The diff engine
/// consumes all three; any inconsistency is treated as untrusted state.
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    pub by_name: Option<ObservedDevice>,
    pub by_port: Option<ObservedDevice>,
    pub by_address: Option<ObservedDevice>,
}

impl MatchResult {
    /// The observed device a removal should target: name match preferred,
    /// address match as fallback.
    pub fn removal_target(&self) -> Option<&ObservedDevice> {
        self.by_name.as_ref().or(self.by_address.as_ref())
    }
}

/// Case-insensitive, substring-tolerant driver identity comparison
///
/// Observed driver strings may carry vendor suffixes ("PCL 6" revisions,
/// architecture tags), so the desired identity only has to appear within
/// the observed one.
pub fn driver_matches(desired: &str, observed: &str) -> bool {
    let desired = desired.trim().to_lowercase();
    if desired.is_empty() {
        return false;
    }
    observed.to_lowercase().contains(&desired)
}

/// Normalize an address for exact-match comparison
///
/// Trim and lowercase only; no CIDR or IP-object semantics.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Exact address equality after normalization
pub fn address_matches(a: &str, b: &str) -> bool {
    let a = normalize_address(a);
    !a.is_empty() && a == normalize_address(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desired(name: &str, address: &str) -> DesiredDevice {
        DesiredDevice {
            name: name.into(),
            address: address.into(),
            driver: "Generic PCL".into(),
            driver_package: String::new(),
            feature_defaults: BTreeMap::new(),
            vendor_modules: BTreeMap::new(),
            lifecycle: Lifecycle::Install,
        }
    }

    #[test]
    fn driver_match_is_case_insensitive() {
        assert!(driver_matches("generic pcl", "Generic PCL"));
    }

    #[test]
    fn driver_match_tolerates_vendor_suffix() {
        assert!(driver_matches(
            "KX DRIVER",
            "Kyocera KX DRIVER for Universal Printing v8.3 (x64)"
        ));
    }

    #[test]
    fn driver_mismatch_detected() {
        assert!(!driver_matches("Generic PCL", "HP Universal PS"));
        assert!(!driver_matches("", "anything"));
    }

    #[test]
    fn address_comparison_is_normalized_exact_match() {
        assert!(address_matches(" 10.0.0.5 ", "10.0.0.5"));
        assert!(!address_matches("10.0.0.5", "10.0.0.50"));
        assert!(!address_matches("", ""));
    }

    #[test]
    fn port_name_derives_from_address() {
        assert_eq!(desired("Sales", " 10.0.0.5").port_name(), "IP_10.0.0.5");
    }

    #[test]
    fn removal_target_prefers_name_match() {
        let by_name = ObservedDevice {
            name: "Sales".into(),
            port_name: "IP_10.0.0.5".into(),
            driver: "Generic PCL".into(),
            address: "10.0.0.5".into(),
        };
        let by_address = ObservedDevice {
            name: "Stale-Sales".into(),
            ..by_name.clone()
        };
        let matches = MatchResult {
            by_name: Some(by_name.clone()),
            by_port: None,
            by_address: Some(by_address.clone()),
        };
        assert_eq!(matches.removal_target(), Some(&by_name));

        let matches = MatchResult {
            by_name: None,
            by_port: None,
            by_address: Some(by_address.clone()),
        };
        assert_eq!(matches.removal_target(), Some(&by_address));
    }
}
