//! Validate command plus the applied-marker query

use anyhow::Result;

use crate::Context;
use crate::cli::ManifestArgs;
use crate::config::Settings;
use crate::manifest::Manifest;
use crate::marker::AppliedMarker;
use crate::ui;

pub fn run(_ctx: &Context, args: &ManifestArgs) -> Result<()> {
    let manifest = Manifest::load(&args.manifest)?;
    manifest.validate()?;

    let version = manifest.version.as_deref().unwrap_or("unversioned");
    ui::success(&format!(
        "{}: valid ({} printers, {} removals, version {})",
        args.manifest.display(),
        manifest.printers.len(),
        manifest.remove.len(),
        version,
    ));

    Ok(())
}

pub fn show_marker(_ctx: &Context) -> Result<()> {
    let settings = Settings::load()?;
    let path = settings.marker_path()?;

    match AppliedMarker::load(&path)? {
        Some(marker) => ui::info(&format!(
            "Last applied manifest: {} at {}",
            marker.version, marker.applied_at
        )),
        None => ui::warn("No manifest has been applied yet"),
    }

    Ok(())
}
