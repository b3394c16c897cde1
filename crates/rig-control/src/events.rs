//! Notifications flowing back from a rig session
//!
//! The engine produces [`Notification`]s on the worker thread. The session
//! manager filters them and hands [`SessionEvent`]s to its caller.

use rig_protocol::{RadioState, Resolution};

/// Actual rig state, tagged with the command it reflects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateUpdate {
    /// State as last reported by the rig
    pub state: RadioState,
    /// Sequence number of the last command processed
    pub sequence: u64,
}

/// Output of the control engine for one entry point call or poll cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Rig state, either forced by a command or changed since the last one
    Update(StateUpdate),

    /// Frequency resolution, once per successful start
    Resolution {
        /// Resolution reported by the backend
        resolution: Resolution,
    },

    /// The backend failed and has been taken offline
    Failure {
        /// Diagnostic from the backend
        reason: String,
        /// Sequence number of the command that failed
        sequence: u64,
    },

    /// Shutdown completed; the backend can be released
    Finished {
        /// Sequence number of the stop command
        sequence: u64,
    },
}

impl Notification {
    /// Sequence number this notification is tagged with, if any
    pub fn sequence(&self) -> Option<u64> {
        match self {
            Notification::Update(update) => Some(update.sequence),
            Notification::Failure { sequence, .. } | Notification::Finished { sequence } => {
                Some(*sequence)
            }
            Notification::Resolution { .. } => None,
        }
    }

    /// Check if this is a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Notification::Failure { .. })
    }

    /// Get the state update, if this is one
    pub fn as_update(&self) -> Option<&StateUpdate> {
        match self {
            Notification::Update(update) => Some(update),
            _ => None,
        }
    }
}

/// Event delivered to the caller of the session manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Rig state reflecting the latest request
    Update(StateUpdate),

    /// Rig failed; the session has been closed
    Failure {
        /// Human-readable reason
        reason: String,
    },

    /// A session finished shutting down
    Finished {
        /// Sequence number of the stop command
        sequence: u64,
    },
}
