//! Error types for radio backends

use thiserror::Error;

/// Failure talking to, or misbehaviour of, the physical radio
///
/// Always fatal to the current session: the control engine takes the
/// backend offline and reports the failure.
#[derive(Debug, Error)]
pub enum HardwareError {
    /// Link to the rig could not be opened or was lost
    #[error("link down: {0}")]
    LinkDown(String),

    /// Rig answered with something we did not expect
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Rig refused a command
    #[error("command rejected: {0}")]
    Rejected(String),

    /// Rig did not answer in time
    #[error("communication timeout after {0}ms")]
    Timeout(u64),

    /// I/O error on the underlying port
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_diagnostic() {
        let err = HardwareError::Rejected("FA14074000;".to_string());
        assert_eq!(err.to_string(), "command rejected: FA14074000;");

        let err = HardwareError::Timeout(500);
        assert_eq!(err.to_string(), "communication timeout after 500ms");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "port closed");
        let err: HardwareError = io.into();
        assert!(matches!(err, HardwareError::Io(_)));
        assert!(err.to_string().contains("port closed"));
    }
}
