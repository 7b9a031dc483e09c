//! Plan command - probe and diff without mutating anything

use anyhow::{Context as AnyhowContext, Result};
use reconcile::{Action, DesiredDevice, Lifecycle, StateProber, plan_action};

use crate::Context;
use crate::cli::ManifestArgs;
use crate::manifest::Manifest;
use crate::ui;
use crate::winprint::WinPrintStore;

pub fn run(_ctx: &Context, args: &ManifestArgs) -> Result<()> {
    let manifest = Manifest::load(&args.manifest)?;
    manifest.validate()?;
    let devices = manifest.to_devices();

    let store = WinPrintStore::new();
    let plan = build_plan(&devices, &store)?;
    ui::display_plan(&plan);

    Ok(())
}

/// Probe every device and classify its action, in pass order
/// (removals first, then installs)
pub fn build_plan(
    devices: &[DesiredDevice],
    prober: &dyn StateProber,
) -> Result<Vec<(String, Action)>> {
    let removals = devices.iter().filter(|d| d.lifecycle == Lifecycle::Remove);
    let installs = devices.iter().filter(|d| d.lifecycle == Lifecycle::Install);

    let mut plan = Vec::with_capacity(devices.len());
    for desired in removals.chain(installs) {
        let matches = prober
            .match_desired(desired)
            .with_context(|| format!("Could not probe {}", desired.name))?;
        plan.push((desired.name.clone(), plan_action(desired, &matches)));
    }

    Ok(plan)
}
