//! Apply command - run one reconciliation pass against the local machine

use anyhow::Result;
use reconcile::reconcile;

use crate::Context;
use crate::cli::ApplyArgs;
use crate::config::Settings;
use crate::manifest::Manifest;
use crate::marker::AppliedMarker;
use crate::ui;
use crate::winprint::WinPrintStore;

pub fn run(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    let settings = Settings::load()?;
    let manifest = Manifest::load(&args.manifest)?;
    manifest.validate()?;
    let devices = manifest.to_devices();

    if devices.is_empty() {
        ui::info("Manifest is empty, nothing to do");
        return Ok(());
    }

    if ctx.verbose > 0 {
        ui::info(&format!(
            "Delays: settle {} ms, verify {} ms",
            settings.settle_ms, settings.verify_ms
        ));
    }

    let store = WinPrintStore::new();

    if args.dry_run {
        let plan = super::plan::build_plan(&devices, &store)?;
        ui::display_plan(&plan);
        println!();
        ui::info("Dry run - no changes made");
        return Ok(());
    }

    if !args.yes && !confirm_proceed(devices.len())? {
        println!();
        ui::error("Aborted");
        return Ok(());
    }

    let result = reconcile(&devices, &store, &store, settings.delays());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        ui::display_outcomes(&result);
    }

    if result.any_failure() {
        // Distinct exit code so callers can tell a partially failed pass
        // from a usage or I/O error. Agreeable changes were still applied.
        std::process::exit(2);
    }

    if let Some(version) = &manifest.version {
        let path = settings.marker_path()?;
        AppliedMarker::record(&path, version)?;
        if !ctx.quiet {
            ui::success(&format!("Marked manifest {version} as applied"));
        }
    }

    Ok(())
}

fn confirm_proceed(count: usize) -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt(format!("Reconcile {count} devices?"))
        .default(true)
        .interact()?;

    Ok(confirmed)
}
