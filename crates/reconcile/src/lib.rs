//! # Reconcile
//!
//! Printer-fleet reconciliation engine: given the devices a manifest
//! declares and the devices actually registered on the machine, compute
//! and execute the minimal set of actions to converge, with bounded
//! retries and partial-failure isolation.
//!
//! ## Core Concepts
//!
//! - **DesiredDevice**: one manifest entry (name, address, driver, feature
//!   defaults, lifecycle)
//! - **StateProber**: three independent lookups (name, port, address) into
//!   the registration store
//! - **PrintStore**: the mutation operations (driver/port/device/feature)
//! - **Action**: what the diff engine decided for one device
//! - **ReconciliationResult**: ordered per-device outcomes plus the
//!   aggregate failure flag
//!
//! Everything external enters through the two traits, so a whole pass runs
//! against an in-memory fake in tests:
//!
//! ```ignore
//! use reconcile::{reconcile, Delays, DesiredDevice, Lifecycle};
//!
//! let manifest = vec![DesiredDevice {
//!     name: "Sales-Printer".into(),
//!     address: "10.0.0.5".into(),
//!     driver: "Generic PCL".into(),
//!     driver_package: String::new(),
//!     feature_defaults: Default::default(),
//!     vendor_modules: Default::default(),
//!     lifecycle: Lifecycle::Install,
//! }];
//!
//! let result = reconcile(&manifest, &prober, &store, Delays::default());
//! if result.any_failure() {
//!     // distinct non-zero exit, marker not persisted
//! }
//! ```
//!
//! The engine is deliberately sequential: the underlying registration
//! store is eventually consistent after mutation, so devices are handled
//! one at a time with settle delays in between. A failure on one device
//! never cancels the rest of the pass.

pub mod device;
pub mod diff;
pub mod engine;
pub mod error;
pub mod executor;
pub mod ops;
pub mod outcome;
pub mod probe;

// Re-export main types at crate root
pub use device::{
    address_matches, driver_matches, normalize_address, DesiredDevice, Lifecycle, MatchResult,
    ObservedDevice,
};
pub use diff::{plan_action, Action};
pub use engine::reconcile;
pub use error::{Error, Result};
pub use executor::{Delays, Executor};
pub use ops::PrintStore;
pub use outcome::{ActionKind, ActionOutcome, ReconciliationResult};
pub use probe::StateProber;
