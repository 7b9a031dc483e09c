//! Reconciliation pass
//!
//! Sequential, single-threaded: removals first as an independent pass,
//! then install-class entries, both in manifest order. Every device is
//! probed fresh (an earlier removal can change what a later probe sees)
//! and a failure on one device never cancels the rest.

use crate::device::{DesiredDevice, Lifecycle};
use crate::diff::plan_action;
use crate::executor::{Delays, Executor};
use crate::ops::PrintStore;
use crate::outcome::{ActionKind, ActionOutcome, ReconciliationResult};
use crate::probe::StateProber;

/// Run one reconciliation pass over the manifest
///
/// The manifest is assumed validated (unique names). Assumes exclusive
/// access to the registration store for the duration of the pass.
pub fn reconcile(
    manifest: &[DesiredDevice],
    prober: &dyn StateProber,
    store: &dyn PrintStore,
    delays: Delays,
) -> ReconciliationResult {
    let executor = Executor::new(prober, store, delays);
    let mut result = ReconciliationResult::default();

    let removals = manifest
        .iter()
        .filter(|d| d.lifecycle == Lifecycle::Remove);
    let installs = manifest
        .iter()
        .filter(|d| d.lifecycle == Lifecycle::Install);

    for desired in removals.chain(installs) {
        run_one(&executor, prober, desired, &mut result);
    }

    result
}

fn run_one(
    executor: &Executor,
    prober: &dyn StateProber,
    desired: &DesiredDevice,
    result: &mut ReconciliationResult,
) {
    let matches = match prober.match_desired(desired) {
        Ok(m) => m,
        Err(e) => {
            // No action can be decided without the initial probe; fatal for
            // this device only, the pass moves on.
            result.record(ActionOutcome::failed(&desired.name, ActionKind::Skip, e));
            return;
        }
    };

    let action = plan_action(desired, &matches);
    log::debug!("{}: planned {:?}", desired.name, ActionKind::from(&action));
    result.record(executor.execute(desired, &action));
}
