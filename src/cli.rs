use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "printfleet")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Reconcile installed printers against a declarative manifest", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply the manifest: install, reconfigure, and remove printers
    Apply(ApplyArgs),

    /// Show what apply would do, without changing anything
    Plan(ManifestArgs),

    /// Validate a manifest file
    Validate(ManifestArgs),

    /// Show the last applied manifest version
    Marker,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Path to the manifest file
    #[arg(short, long, env = "PRINTFLEET_MANIFEST")]
    pub manifest: PathBuf,

    /// Plan only - show actions without executing them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Emit per-device outcomes as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct ManifestArgs {
    /// Path to the manifest file
    #[arg(short, long, env = "PRINTFLEET_MANIFEST")]
    pub manifest: PathBuf,
}
