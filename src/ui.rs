//! Terminal output for plans and outcomes

use colored::Colorize;
use reconcile::{Action, ActionKind, ReconciliationResult};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

fn action_symbol(kind: ActionKind) -> colored::ColoredString {
    match kind {
        ActionKind::Install => "+".green(),
        ActionKind::Reinstall => "↻".yellow(),
        ActionKind::Reconfigure => "~".yellow(),
        ActionKind::Uninstall => "-".red(),
        ActionKind::Skip => "○".dimmed(),
    }
}

fn action_label(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Install => "install",
        ActionKind::Reinstall => "reinstall",
        ActionKind::Reconfigure => "reconfigure",
        ActionKind::Uninstall => "uninstall",
        ActionKind::Skip => "skip",
    }
}

/// Display the planned action per device
pub fn display_plan(plan: &[(String, Action)]) {
    if plan.is_empty() {
        println!();
        println!("  {} Manifest is empty, nothing to do", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Planned Actions".bold()
    );
    println!("│");

    for (device, action) in plan {
        let kind = ActionKind::from(action);
        let note = match action {
            Action::Reinstall { port, .. } => format!("(tear down {port}, then install)"),
            Action::Uninstall { port, .. } => format!("(remove device and {port})"),
            Action::Skip { reason } => format!("({reason})"),
            _ => String::new(),
        };
        println!(
            "│   {} {:<30} {} {}",
            action_symbol(kind),
            device,
            action_label(kind),
            note.dimmed()
        );
    }

    let mutations = plan.iter().filter(|(_, a)| a.is_mutation()).count();
    println!("│");
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} devices, {} changes",
        plan.len().to_string().bold(),
        mutations.to_string().green()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

/// Display per-device outcomes and the pass summary
pub fn display_outcomes(result: &ReconciliationResult) {
    println!();
    for outcome in result.outcomes() {
        let (symbol, label) = if outcome.success {
            (action_symbol(outcome.action), action_label(outcome.action))
        } else {
            ("✗".red(), action_label(outcome.action))
        };
        let detail = outcome
            .detail
            .as_deref()
            .map(|d| format!("  {}", d.dimmed()))
            .unwrap_or_default();
        println!("  {} {:<30} {}{}", symbol, outcome.device, label, detail);
    }

    println!();
    if result.any_failure() {
        println!(
            "  {} {} of {} devices failed; manifest not marked as applied",
            "⚠".yellow().bold(),
            result.failed_count(),
            result.outcomes().len()
        );
    } else {
        println!(
            "  {} All {} devices converged ({} changed)",
            "✓".green().bold(),
            result.outcomes().len(),
            result.changed_count()
        );
    }
}
