//! Per-device outcomes and the pass-level result

use crate::diff::Action;
use serde::{Deserialize, Serialize};

/// What was done (or attempted) for a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Install,
    Reinstall,
    Reconfigure,
    Uninstall,
    Skip,
}

impl From<&Action> for ActionKind {
    fn from(action: &Action) -> Self {
        match action {
            Action::Install => Self::Install,
            Action::Reinstall { .. } => Self::Reinstall,
            Action::Reconfigure => Self::Reconfigure,
            Action::Uninstall { .. } => Self::Uninstall,
            Action::Skip { .. } => Self::Skip,
        }
    }
}

/// The recorded result for one device, immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub device: String,
    pub action: ActionKind,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ActionOutcome {
    pub fn ok(device: impl Into<String>, action: ActionKind) -> Self {
        Self {
            device: device.into(),
            action,
            success: true,
            detail: None,
        }
    }

    /// A successful outcome with an explanatory note (e.g. skip reason)
    pub fn ok_with(device: impl Into<String>, action: ActionKind, detail: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            action,
            success: true,
            detail: Some(detail.into()),
        }
    }

    pub fn failed(
        device: impl Into<String>,
        action: ActionKind,
        detail: impl ToString,
    ) -> Self {
        Self {
            device: device.into(),
            action,
            success: false,
            detail: Some(detail.to_string()),
        }
    }
}

/// The terminal artifact of a reconciliation pass
///
/// Append-only; this type is the sole writer of the outcome sequence and
/// the contract handed back to the caller.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReconciliationResult {
    outcomes: Vec<ActionOutcome>,
}

impl ReconciliationResult {
    pub fn record(&mut self, outcome: ActionOutcome) {
        if !outcome.success {
            log::warn!(
                "{}: {} failed: {}",
                outcome.device,
                kind_label(outcome.action),
                outcome.detail.as_deref().unwrap_or("unknown error")
            );
        }
        self.outcomes.push(outcome);
    }

    /// Outcomes in the order they were recorded
    pub fn outcomes(&self) -> &[ActionOutcome] {
        &self.outcomes
    }

    /// True when at least one device recorded any failure kind
    pub fn any_failure(&self) -> bool {
        self.outcomes.iter().any(|o| !o.success)
    }

    /// Number of devices that recorded a failure
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success).count()
    }

    /// Number of outcomes that actually changed the store
    pub fn changed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.success && o.action != ActionKind::Skip)
            .count()
    }
}

fn kind_label(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Install => "install",
        ActionKind::Reinstall => "reinstall",
        ActionKind::Reconfigure => "reconfigure",
        ActionKind::Uninstall => "uninstall",
        ActionKind::Skip => "skip",
    }
}
