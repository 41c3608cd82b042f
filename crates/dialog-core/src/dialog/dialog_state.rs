//! Dialog lifecycle states

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a dialog is in its lifecycle
///
/// ```text
/// Initial ──18x with tag──▶ Early ──2xx + ACK──▶ Confirmed ──BYE──▶ Terminated
///    │                        │
///    └──────── final ≥ 300 ───┴──────────────────────────────────▶ Terminated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DialogState {
    /// INVITE sent or received, no tag learned yet
    #[default]
    Initial,
    /// Provisional response carrying a To tag received
    Early,
    /// 2xx to INVITE acknowledged
    Confirmed,
    /// Ended by BYE or by a failed INVITE
    Terminated,
}

impl DialogState {
    pub fn is_terminated(&self) -> bool {
        matches!(self, DialogState::Terminated)
    }

    /// Early or confirmed
    pub fn is_established(&self) -> bool {
        matches!(self, DialogState::Early | DialogState::Confirmed)
    }
}

impl fmt::Display for DialogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DialogState::Initial => "Initial",
            DialogState::Early => "Early",
            DialogState::Confirmed => "Confirmed",
            DialogState::Terminated => "Terminated",
        };
        f.write_str(name)
    }
}
