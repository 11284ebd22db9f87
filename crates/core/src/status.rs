//! Dispatch status values and the server-driven state machine.
//!
//! The client never moves a dispatch between states itself; it only
//! observes transitions reported by the backend. The state machine is
//! used to flag anomalies in what the server reports, not to reject them.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DispatchStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a dispatch as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchStatus {
    NewObject,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl DispatchStatus {
    /// Wire name used by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewObject => "NEW_OBJECT",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parse a wire name. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NEW_OBJECT" => Some(Self::NewObject),
            "RUNNING" => Some(Self::Running),
            "COMPLETED" => Some(Self::Completed),
            "FAILED" => Some(Self::Failed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// `true` once the backend will never move this dispatch again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Human-readable label for list rendering.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NewObject => "New",
            Self::Running => "Running",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Single-glyph status marker. Every status has a distinct glyph.
    pub fn glyph(&self) -> char {
        match self {
            Self::NewObject => '○',
            Self::Running => '▶',
            Self::Completed => '✔',
            Self::Failed => '✖',
            Self::Cancelled => '■',
        }
    }
}

impl std::fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

pub mod state_machine {
    use super::DispatchStatus;

    /// Statuses the backend may move a dispatch to from `from`.
    ///
    /// Terminal statuses return an empty slice.
    pub fn valid_transitions(from: DispatchStatus) -> &'static [DispatchStatus] {
        use DispatchStatus::*;
        match from {
            NewObject => &[Running, Cancelled],
            Running => &[Completed, Failed, Cancelled],
            Completed | Failed | Cancelled => &[],
        }
    }

    /// A report of the same status twice is not a transition and is allowed.
    pub fn can_transition(from: DispatchStatus, to: DispatchStatus) -> bool {
        from == to || valid_transitions(from).contains(&to)
    }

    /// Validate an observed transition, returning an error message for
    /// invalid ones.
    pub fn validate_transition(from: DispatchStatus, to: DispatchStatus) -> Result<(), String> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(format!("Invalid transition: {from} -> {to}"))
        }
    }
}
