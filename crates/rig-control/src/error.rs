//! Error types for rig sessions

use rig_protocol::HardwareError;
use thiserror::Error;

/// Errors returned to callers of the session manager
///
/// Backend failures during a running session never surface here; they
/// arrive as failure events. These are the errors a caller can act on
/// synchronously.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No rig session is open
    #[error("no rig session is open")]
    NotOpen,

    /// Request not valid for the configured rig
    #[error("protocol misuse: {0}")]
    ProtocolMisuse(String),

    /// Model not present in the backend registry
    #[error("unknown rig model: {0}")]
    UnknownModel(String),

    /// Worker command queue is full
    #[error("rig command queue full")]
    QueueFull,

    /// Worker thread could not be started
    #[error("failed to spawn rig worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// Backend could not be created
    #[error("backend error: {0}")]
    Backend(#[from] HardwareError),
}
