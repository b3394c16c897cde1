//! Rig session configuration

use std::time::Duration;

use rig_protocol::Mode;
use rig_sim::SimulatedRigConfig;
use serde::{Deserialize, Serialize};

use crate::engine::PTT_SETTLE_DELAY;

/// Default worker command queue capacity
pub const DEFAULT_COMMAND_QUEUE: usize = 64;

/// How split operation is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitMode {
    /// No split; transmit frequency requests are refused
    #[default]
    None,
    /// Rig's own split (second VFO)
    Rig,
    /// Backend emulates split by retuning around transmit
    Emulate,
}

impl SplitMode {
    /// Whether a non-zero transmit frequency may be requested
    pub fn is_enabled(&self) -> bool {
        !matches!(self, SplitMode::None)
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            SplitMode::None => "None",
            SplitMode::Rig => "Rig",
            SplitMode::Emulate => "Fake It",
        }
    }
}

/// Parameters for opening a rig session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigParams {
    /// Model name, looked up in the backend registry
    pub model: String,
    /// Poll interval in milliseconds (0 = rig pushes its own updates)
    pub poll_interval_ms: u64,
    /// Pause after switching PTT, in milliseconds
    pub settle_delay_ms: u64,
    /// Split operation
    pub split_mode: SplitMode,
    /// Mode to enforce with every frequency or PTT request (None = leave alone)
    pub data_mode: Option<Mode>,
    /// Worker command queue capacity
    pub command_queue: usize,
    /// Settings for the simulated models
    pub simulation: SimulatedRigConfig,
}

impl Default for RigParams {
    fn default() -> Self {
        Self {
            model: "None".to_string(),
            poll_interval_ms: 1000,
            settle_delay_ms: PTT_SETTLE_DELAY.as_millis() as u64,
            split_mode: SplitMode::None,
            data_mode: None,
            command_queue: DEFAULT_COMMAND_QUEUE,
            simulation: SimulatedRigConfig::default(),
        }
    }
}

impl RigParams {
    /// Parameters for a model with everything else defaulted
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Poll interval; zero disables polling
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Pause after switching PTT
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Queue capacity, never zero
    pub fn command_queue(&self) -> usize {
        self.command_queue.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = RigParams::default();
        assert_eq!(params.model, "None");
        assert_eq!(params.settle_delay(), Duration::from_millis(100));
        assert_eq!(params.poll_interval(), Duration::from_secs(1));
        assert!(!params.split_mode.is_enabled());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let params: RigParams =
            serde_json::from_str(r#"{"model": "Simulated", "split_mode": "Rig"}"#).unwrap();
        assert_eq!(params.model, "Simulated");
        assert!(params.split_mode.is_enabled());
        assert_eq!(params.command_queue, DEFAULT_COMMAND_QUEUE);
        assert_eq!(params.simulation, SimulatedRigConfig::default());
    }

    #[test]
    fn test_zero_queue_clamped() {
        let params = RigParams {
            command_queue: 0,
            ..Default::default()
        };
        assert_eq!(params.command_queue(), 1);
    }
}
