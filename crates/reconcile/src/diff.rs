//! Diff engine - classify the action needed to converge one device
//!
//! A pure function over the desired record and the three probe results.
//! Any drift between name, port, and address lookups forces a clean
//! reinstall rather than a partial repair: convergence certainty over
//! efficiency.

use crate::device::{driver_matches, DesiredDevice, Lifecycle, MatchResult};

/// The action the executor should take for one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Device not registered at all: driver + port + device creation
    Install,
    /// Registered but drifted: tear down the named objects, then install
    Reinstall { device: String, port: String },
    /// Fully consistent: apply feature defaults and vendor modules only
    Reconfigure,
    /// Removal entry that resolved to a registered device
    Uninstall { device: String, port: String },
    /// Nothing to do
    Skip { reason: String },
}

impl Action {
    /// Whether executing this action mutates the registration store
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Skip { .. })
    }
}

/// Decide the action for one desired device
pub fn plan_action(desired: &DesiredDevice, matches: &MatchResult) -> Action {
    match desired.lifecycle {
        Lifecycle::Remove => plan_removal(matches),
        Lifecycle::Install => plan_install(desired, matches),
    }
}

fn plan_removal(matches: &MatchResult) -> Action {
    match matches.removal_target() {
        Some(observed) => Action::Uninstall {
            device: observed.name.clone(),
            port: observed.port_name.clone(),
        },
        None => Action::Skip {
            reason: "not installed".to_string(),
        },
    }
}

/// Decision table for install-class entries, first match wins:
///
/// 1. nothing registered under the name        -> Install
/// 2. registered, wrong driver                 -> Reinstall
/// 3. registered, no port for the address      -> Reinstall
/// 4. no device found by address independently -> Reinstall
/// 5. all three lookups consistent             -> Reconfigure
fn plan_install(desired: &DesiredDevice, matches: &MatchResult) -> Action {
    let Some(by_name) = &matches.by_name else {
        return Action::Install;
    };

    let reinstall = Action::Reinstall {
        device: by_name.name.clone(),
        port: by_name.port_name.clone(),
    };

    if !driver_matches(&desired.driver, &by_name.driver) {
        log::debug!(
            "{}: driver drift (want {:?}, observed {:?})",
            desired.name,
            desired.driver,
            by_name.driver
        );
        return reinstall;
    }
    if matches.by_port.is_none() {
        log::debug!("{}: no port matches {}", desired.name, desired.address);
        return reinstall;
    }
    if matches.by_address.is_none() {
        log::debug!("{}: no device found at {}", desired.name, desired.address);
        return reinstall;
    }

    Action::Reconfigure
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ObservedDevice;
    use std::collections::BTreeMap;

    fn desired(lifecycle: Lifecycle) -> DesiredDevice {
        DesiredDevice {
            name: "Sales-Printer".into(),
            address: "10.0.0.5".into(),
            driver: "Generic PCL".into(),
            driver_package: String::new(),
            feature_defaults: BTreeMap::new(),
            vendor_modules: BTreeMap::new(),
            lifecycle,
        }
    }

    fn observed(driver: &str) -> ObservedDevice {
        ObservedDevice {
            name: "Sales-Printer".into(),
            port_name: "IP_10.0.0.5".into(),
            driver: driver.into(),
            address: "10.0.0.5".into(),
        }
    }

    fn consistent(driver: &str) -> MatchResult {
        MatchResult {
            by_name: Some(observed(driver)),
            by_port: Some(observed(driver)),
            by_address: Some(observed(driver)),
        }
    }

    #[test]
    fn absent_device_installs() {
        let action = plan_action(&desired(Lifecycle::Install), &MatchResult::default());
        assert_eq!(action, Action::Install);
    }

    #[test]
    fn driver_drift_reinstalls_regardless_of_port_and_address() {
        let matches = consistent("HP Universal PS");
        let action = plan_action(&desired(Lifecycle::Install), &matches);
        assert!(matches!(action, Action::Reinstall { .. }));
    }

    #[test]
    fn missing_port_reinstalls() {
        let mut matches = consistent("Generic PCL v4");
        matches.by_port = None;
        let action = plan_action(&desired(Lifecycle::Install), &matches);
        assert!(matches!(action, Action::Reinstall { .. }));
    }

    #[test]
    fn missing_address_match_reinstalls() {
        let mut matches = consistent("Generic PCL v4");
        matches.by_address = None;
        let action = plan_action(&desired(Lifecycle::Install), &matches);
        assert!(matches!(action, Action::Reinstall { .. }));
    }

    #[test]
    fn consistent_device_reconfigures() {
        let action = plan_action(&desired(Lifecycle::Install), &consistent("Generic PCL v4"));
        assert_eq!(action, Action::Reconfigure);
    }

    #[test]
    fn removal_resolves_by_name_then_address() {
        let matches = MatchResult {
            by_name: Some(observed("Generic PCL")),
            by_port: None,
            by_address: None,
        };
        let action = plan_action(&desired(Lifecycle::Remove), &matches);
        assert_eq!(
            action,
            Action::Uninstall {
                device: "Sales-Printer".into(),
                port: "IP_10.0.0.5".into(),
            }
        );

        let mut stale = observed("Generic PCL");
        stale.name = "Old-Sales".into();
        let matches = MatchResult {
            by_name: None,
            by_port: None,
            by_address: Some(stale),
        };
        let action = plan_action(&desired(Lifecycle::Remove), &matches);
        assert!(matches!(action, Action::Uninstall { device, .. } if device == "Old-Sales"));
    }

    #[test]
    fn removal_of_missing_device_skips() {
        let action = plan_action(&desired(Lifecycle::Remove), &MatchResult::default());
        assert_eq!(
            action,
            Action::Skip {
                reason: "not installed".into()
            }
        );
        assert!(!action.is_mutation());
    }
}
