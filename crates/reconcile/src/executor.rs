//! Action executor
//!
//! Carries out one planned action through the `PrintStore` trait. The
//! registration store is eventually consistent after mutation, so the
//! executor waits a settle delay between state-mutating calls and the next
//! read. Port removal gets a single-shot recovery ladder; nothing else is
//! retried.

use std::thread;
use std::time::Duration;

use crate::device::DesiredDevice;
use crate::diff::Action;
use crate::error::{Error, Result};
use crate::ops::PrintStore;
use crate::outcome::{ActionKind, ActionOutcome};
use crate::probe::StateProber;

/// Settle/verify delays between external calls
///
/// The registration store does not reflect mutations synchronously;
/// `settle` is the pause after each mutating call, `verify` the wait
/// before the post-install re-probe.
#[derive(Debug, Clone, Copy)]
pub struct Delays {
    pub settle: Duration,
    pub verify: Duration,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(1000),
            verify: Duration::from_millis(3000),
        }
    }
}

impl Delays {
    /// Zero delays, for tests and stores that are synchronously consistent
    pub fn none() -> Self {
        Self {
            settle: Duration::ZERO,
            verify: Duration::ZERO,
        }
    }

    pub fn from_millis(settle: u64, verify: u64) -> Self {
        Self {
            settle: Duration::from_millis(settle),
            verify: Duration::from_millis(verify),
        }
    }
}

/// Executes planned actions against a store, one device at a time
pub struct Executor<'a> {
    prober: &'a dyn StateProber,
    store: &'a dyn PrintStore,
    delays: Delays,
}

impl<'a> Executor<'a> {
    pub fn new(prober: &'a dyn StateProber, store: &'a dyn PrintStore, delays: Delays) -> Self {
        Self {
            prober,
            store,
            delays,
        }
    }

    /// Execute one action and produce the device's outcome
    ///
    /// Never panics and never aborts the pass: every failure ends up as a
    /// failed outcome for this device only.
    pub fn execute(&self, desired: &DesiredDevice, action: &Action) -> ActionOutcome {
        let kind = ActionKind::from(action);
        let run = match action {
            Action::Install => self.install(desired),
            Action::Reinstall { device, port } => self.reinstall(desired, device, port),
            Action::Reconfigure => self.configure(desired),
            Action::Uninstall { device, port } => self.teardown(device, port),
            Action::Skip { reason } => {
                log::info!("{}: {}, skipping", desired.name, reason);
                return ActionOutcome::ok_with(&desired.name, kind, reason);
            }
        };

        match run {
            Ok(()) => ActionOutcome::ok(&desired.name, kind),
            Err(e) => ActionOutcome::failed(&desired.name, kind, e),
        }
    }

    /// Driver bind, port creation, device creation, then a verifying
    /// re-probe. Not atomic: a crash mid-sequence leaves a partial device
    /// that the next pass classifies as drift and reinstalls.
    fn install(&self, desired: &DesiredDevice) -> Result<()> {
        let port = desired.port_name();
        log::info!("{}: installing on {}", desired.name, port);

        self.store
            .install_driver(&desired.driver, &desired.driver_package)?;
        self.settle();
        self.store.create_port(&port, &desired.address)?;
        self.settle();
        self.store.create_device(&desired.name, &port, &desired.driver)?;

        self.sleep(self.delays.verify);
        if self.prober.probe_by_name(&desired.name)?.is_none() {
            return Err(Error::Verification {
                device: desired.name.clone(),
                action: "install",
            });
        }

        self.configure(desired)
    }

    /// Full remove-then-install. Teardown failures are remembered but do
    /// not stop the install attempt; the device still records the failure
    /// so the operator sees the stuck port.
    fn reinstall(&self, desired: &DesiredDevice, device: &str, port: &str) -> Result<()> {
        let teardown = self.teardown(device, port);
        if let Err(e) = &teardown {
            log::warn!(
                "{}: teardown incomplete, attempting install anyway: {}",
                desired.name,
                e
            );
        }
        self.install(desired)?;
        teardown
    }

    /// Remove a device object and then its port
    fn teardown(&self, device: &str, port: &str) -> Result<()> {
        log::info!("removing {} and port {}", device, port);
        self.store.remove_device(device)?;
        self.settle();
        self.remove_port_with_recovery(port)
    }

    /// Port removal with the single-shot recovery ladder
    ///
    /// The spooling service can still hold a handle on the port. On the
    /// first failure: remove stray devices bound to the port, restart the
    /// spooler, settle, retry once. Exactly one retry, never a loop.
    fn remove_port_with_recovery(&self, port: &str) -> Result<()> {
        let first = match self.store.remove_port(port) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        log::warn!("port {} removal failed, running recovery: {}", port, first);

        match self.store.devices_on_port(port) {
            Ok(strays) => {
                for stray in strays {
                    log::info!("removing stray device {} on {}", stray, port);
                    if let Err(e) = self.store.remove_device(&stray) {
                        log::warn!("stray device {} not removed: {}", stray, e);
                    }
                }
            }
            Err(e) => log::warn!("could not list devices on {}: {}", port, e),
        }

        if let Err(e) = self.store.restart_spooler() {
            log::warn!("spooler restart failed: {}", e);
        }
        self.settle();

        self.store.remove_port(port)
    }

    /// Apply every feature default and vendor module setting, each call
    /// wrapped individually so one unsupported value does not block the
    /// rest. The first failure becomes the device's error detail.
    fn configure(&self, desired: &DesiredDevice) -> Result<()> {
        let mut total = 0usize;
        let mut failed = 0usize;
        let mut first: Option<String> = None;

        for (key, value) in desired.settings() {
            total += 1;
            if let Err(e) = self.store.set_feature(&desired.name, key, value) {
                log::warn!("{}: setting {}={} failed: {}", desired.name, key, value, e);
                failed += 1;
                if first.is_none() {
                    first = Some(e.to_string());
                }
            }
        }

        match first {
            None => Ok(()),
            Some(first) => Err(Error::PartialConfig {
                device: desired.name.clone(),
                failed,
                total,
                first,
            }),
        }
    }

    fn settle(&self) {
        self.sleep(self.delays.settle);
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Lifecycle, ObservedDevice};
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeMap;

    /// Records every mutation; port removal fails a configurable number
    /// of times, settings listed in `failing_settings` always fail.
    #[derive(Default)]
    struct RecordingStore {
        calls: RefCell<Vec<String>>,
        port_busy: Cell<u32>,
        failing_settings: Vec<String>,
        hide_devices: bool,
    }

    impl RecordingStore {
        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn record(&self, call: String) {
            self.calls.borrow_mut().push(call);
        }
    }

    impl PrintStore for RecordingStore {
        fn install_driver(&self, identity: &str, _package_path: &str) -> Result<()> {
            self.record(format!("install_driver:{identity}"));
            Ok(())
        }

        fn create_port(&self, name: &str, _address: &str) -> Result<()> {
            self.record(format!("create_port:{name}"));
            Ok(())
        }

        fn create_device(&self, name: &str, port: &str, _driver: &str) -> Result<()> {
            self.record(format!("create_device:{name}@{port}"));
            Ok(())
        }

        fn remove_device(&self, name: &str) -> Result<()> {
            self.record(format!("remove_device:{name}"));
            Ok(())
        }

        fn remove_port(&self, name: &str) -> Result<()> {
            self.record(format!("remove_port:{name}"));
            if self.port_busy.get() > 0 {
                self.port_busy.set(self.port_busy.get() - 1);
                return Err(Error::mutation("remove_port", name, "port in use by spooler"));
            }
            Ok(())
        }

        fn restart_spooler(&self) -> Result<()> {
            self.record("restart_spooler".to_string());
            Ok(())
        }

        fn set_feature(&self, device: &str, key: &str, value: &str) -> Result<()> {
            self.record(format!("set_feature:{device}:{key}={value}"));
            if self.failing_settings.iter().any(|k| k == key) {
                return Err(Error::mutation("set_feature", device, "unsupported value"));
            }
            Ok(())
        }

        fn devices_on_port(&self, port: &str) -> Result<Vec<String>> {
            self.record(format!("devices_on_port:{port}"));
            Ok(vec!["Stray-Copy".to_string()])
        }
    }

    impl StateProber for RecordingStore {
        fn probe_by_name(&self, name: &str) -> Result<Option<ObservedDevice>> {
            if self.hide_devices {
                return Ok(None);
            }
            Ok(Some(ObservedDevice {
                name: name.to_string(),
                port_name: "IP_10.0.0.5".into(),
                driver: "Generic PCL".into(),
                address: "10.0.0.5".into(),
            }))
        }

        fn probe_by_port(&self, _fragment: &str) -> Result<Option<ObservedDevice>> {
            self.probe_by_name("Sales-Printer")
        }

        fn probe_by_address(&self, _address: &str) -> Result<Option<ObservedDevice>> {
            self.probe_by_name("Sales-Printer")
        }
    }

    fn sales_printer() -> DesiredDevice {
        let mut feature_defaults = BTreeMap::new();
        feature_defaults.insert("Color".to_string(), "false".to_string());
        feature_defaults.insert("DuplexingMode".to_string(), "TwoSidedLongEdge".to_string());
        DesiredDevice {
            name: "Sales-Printer".into(),
            address: "10.0.0.5".into(),
            driver: "Generic PCL".into(),
            driver_package: String::new(),
            feature_defaults,
            vendor_modules: BTreeMap::new(),
            lifecycle: Lifecycle::Install,
        }
    }

    #[test]
    fn install_runs_driver_port_device_in_order() {
        let store = RecordingStore::default();
        let executor = Executor::new(&store, &store, Delays::none());

        let outcome = executor.execute(&sales_printer(), &Action::Install);
        assert!(outcome.success);

        let calls = store.calls();
        assert_eq!(calls[0], "install_driver:Generic PCL");
        assert_eq!(calls[1], "create_port:IP_10.0.0.5");
        assert_eq!(calls[2], "create_device:Sales-Printer@IP_10.0.0.5");
        // defaults applied after the verified install
        assert!(calls[3].starts_with("set_feature:Sales-Printer:Color"));
    }

    #[test]
    fn install_verification_failure_is_recorded() {
        let store = RecordingStore {
            hide_devices: true,
            ..Default::default()
        };
        let executor = Executor::new(&store, &store, Delays::none());

        let outcome = executor.execute(&sales_printer(), &Action::Install);
        assert!(!outcome.success);
        assert!(outcome.detail.unwrap().contains("not observed"));
    }

    #[test]
    fn busy_port_recovers_through_the_ladder_once() {
        let store = RecordingStore::default();
        store.port_busy.set(1);
        let executor = Executor::new(&store, &store, Delays::none());

        let action = Action::Uninstall {
            device: "Sales-Printer".into(),
            port: "IP_10.0.0.5".into(),
        };
        let outcome = executor.execute(&sales_printer(), &action);
        assert!(outcome.success);

        assert_eq!(
            store.calls(),
            vec![
                "remove_device:Sales-Printer",
                "remove_port:IP_10.0.0.5",
                "devices_on_port:IP_10.0.0.5",
                "remove_device:Stray-Copy",
                "restart_spooler",
                "remove_port:IP_10.0.0.5",
            ]
        );
    }

    #[test]
    fn ladder_never_loops() {
        let store = RecordingStore::default();
        store.port_busy.set(10);
        let executor = Executor::new(&store, &store, Delays::none());

        let action = Action::Uninstall {
            device: "Sales-Printer".into(),
            port: "IP_10.0.0.5".into(),
        };
        let outcome = executor.execute(&sales_printer(), &action);
        assert!(!outcome.success);

        let removals = store
            .calls()
            .iter()
            .filter(|c| c.starts_with("remove_port:"))
            .count();
        assert_eq!(removals, 2);
        let restarts = store
            .calls()
            .iter()
            .filter(|c| *c == "restart_spooler")
            .count();
        assert_eq!(restarts, 1);
    }

    #[test]
    fn failed_setting_does_not_block_the_rest() {
        let store = RecordingStore {
            failing_settings: vec!["Color".to_string()],
            ..Default::default()
        };
        let executor = Executor::new(&store, &store, Delays::none());

        let outcome = executor.execute(&sales_printer(), &Action::Reconfigure);
        assert!(!outcome.success);
        let detail = outcome.detail.unwrap();
        assert!(detail.contains("1 of 2 settings failed"), "{detail}");

        // the later duplex setting was still attempted
        assert!(store
            .calls()
            .iter()
            .any(|c| c.contains("DuplexingMode=TwoSidedLongEdge")));
    }

    #[test]
    fn reinstall_reports_stuck_port_even_when_install_succeeds() {
        let store = RecordingStore::default();
        store.port_busy.set(10);
        let executor = Executor::new(&store, &store, Delays::none());

        let action = Action::Reinstall {
            device: "Sales-Printer".into(),
            port: "IP_10.0.0.5".into(),
        };
        let outcome = executor.execute(&sales_printer(), &action);

        // install sequence still ran, best-effort
        assert!(store.calls().iter().any(|c| c.starts_with("create_device:")));
        // but the stuck port surfaces as a failed outcome
        assert!(!outcome.success);
    }
}
