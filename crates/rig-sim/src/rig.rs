//! Simulated rig backend
//!
//! Behaves like a poll-only CAT rig: commands change the front panel, and the
//! panel is reported back on every call. With `lag_polls > 0` a command only
//! takes effect after that many polls, the way slow rigs confirm a QSY late.

use rig_protocol::{Backend, Frequency, HardwareError, Mode, Reporter, Resolution};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::journal::{BackendCall, Panel, SimHandle};

/// Configuration for creating a simulated rig
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedRigConfig {
    /// Display name/identifier
    pub id: String,
    /// Frequency shown on the panel at power-up
    pub initial_frequency: Frequency,
    /// Mode shown on the panel at power-up
    pub initial_mode: Mode,
    /// Frequency resolution reported at start
    pub resolution: Resolution,
    /// Polls before a command shows up on the panel (0 = immediately)
    pub lag_polls: u32,
}

impl Default for SimulatedRigConfig {
    fn default() -> Self {
        Self {
            id: "Simulated Rig".to_string(),
            initial_frequency: 14_074_000, // 20m FT8
            initial_mode: Mode::Usb,
            resolution: Resolution::Hz1,
            lag_polls: 0,
        }
    }
}

/// Command accepted but not yet visible on the panel
#[derive(Debug, Clone, Copy)]
struct Pending {
    target: Panel,
    remaining: u32,
}

/// A simulated rig implementing the backend contract
#[derive(Debug)]
pub struct SimulatedRig {
    config: SimulatedRigConfig,
    handle: SimHandle,
    online: bool,
    pending: Option<Pending>,
}

impl SimulatedRig {
    /// Create a simulated rig and a handle onto it
    pub fn new(config: SimulatedRigConfig) -> (Self, SimHandle) {
        let handle = SimHandle::new(Panel {
            frequency: config.initial_frequency,
            tx_frequency: 0,
            mode: config.initial_mode,
            ptt: false,
        });
        let rig = Self {
            config,
            handle: handle.clone(),
            online: false,
            pending: None,
        };
        (rig, handle)
    }

    /// Get the configuration this rig was created from
    pub fn config(&self) -> &SimulatedRigConfig {
        &self.config
    }

    /// Whether the link is open
    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Get a handle onto this rig
    pub fn handle(&self) -> SimHandle {
        self.handle.clone()
    }

    /// Journal a call and fire any fault scripted for it
    fn record(&self, call: BackendCall) -> Result<(), String> {
        let mut shared = self.handle.lock();
        shared.calls.push(call);
        let kind = call.kind();
        match shared.faults.iter().position(|(k, _)| *k == kind) {
            Some(index) => {
                let (_, message) = shared.faults.remove(index).unwrap_or((kind, String::new()));
                Err(message)
            }
            None => Ok(()),
        }
    }

    fn ensure_online(&self) -> Result<(), HardwareError> {
        if self.online {
            Ok(())
        } else {
            Err(HardwareError::LinkDown(format!("{} is not started", self.config.id)))
        }
    }

    /// Apply a command to the panel, now or after the configured lag
    fn apply(&mut self, change: impl FnOnce(&mut Panel)) {
        let mut shared = self.handle.lock();
        if shared.unresponsive {
            debug!("Simulated rig {} ignoring command", self.config.id);
            return;
        }
        if self.config.lag_polls == 0 {
            change(&mut shared.panel);
            return;
        }
        let pending = self.pending.get_or_insert(Pending {
            target: shared.panel,
            remaining: 0,
        });
        change(&mut pending.target);
        pending.remaining = self.config.lag_polls;
    }

    /// Report everything the panel shows
    fn report_panel(&self, report: &mut Reporter<'_>) {
        let panel = self.handle.lock().panel;
        report.rx_frequency(panel.frequency);
        report.tx_frequency(panel.tx_frequency);
        report.mode(panel.mode);
        report.ptt(panel.ptt);
    }
}

impl Backend for SimulatedRig {
    fn name(&self) -> &str {
        &self.config.id
    }

    fn start(&mut self, report: &mut Reporter<'_>) -> Result<Resolution, HardwareError> {
        self.record(BackendCall::Start)
            .map_err(HardwareError::LinkDown)?;
        self.online = true;
        self.pending = None;
        info!(
            "Simulated rig {} started ({:?})",
            self.config.id, self.config.resolution
        );
        self.report_panel(report);
        Ok(self.config.resolution)
    }

    fn stop(&mut self) {
        if let Err(e) = self.record(BackendCall::Stop) {
            warn!("Simulated rig {} stop error ignored: {}", self.config.id, e);
        }
        self.online = false;
        self.pending = None;
        info!("Simulated rig {} stopped", self.config.id);
    }

    fn set_frequency(
        &mut self,
        hz: Frequency,
        mode: Mode,
        allow_immediate: bool,
        report: &mut Reporter<'_>,
    ) -> Result<(), HardwareError> {
        self.record(BackendCall::SetFrequency {
            hz,
            mode,
            allow_immediate,
        })
        .map_err(HardwareError::Rejected)?;
        self.ensure_online()?;

        let hz = self.config.resolution.quantize(hz);
        self.apply(|panel| {
            panel.frequency = hz;
            if !mode.is_unknown() {
                panel.mode = mode;
            }
        });
        self.report_panel(report);
        Ok(())
    }

    fn set_tx_frequency(
        &mut self,
        hz: Frequency,
        mode: Mode,
        allow_immediate: bool,
        report: &mut Reporter<'_>,
    ) -> Result<(), HardwareError> {
        self.record(BackendCall::SetTxFrequency {
            hz,
            mode,
            allow_immediate,
        })
        .map_err(HardwareError::Rejected)?;
        self.ensure_online()?;

        let hz = self.config.resolution.quantize(hz);
        self.apply(|panel| {
            panel.tx_frequency = hz;
            if !mode.is_unknown() {
                panel.mode = mode;
            }
        });
        self.report_panel(report);
        Ok(())
    }

    fn set_mode(&mut self, mode: Mode, report: &mut Reporter<'_>) -> Result<(), HardwareError> {
        self.record(BackendCall::SetMode { mode })
            .map_err(HardwareError::Rejected)?;
        self.ensure_online()?;

        if !mode.is_unknown() {
            self.apply(|panel| panel.mode = mode);
        }
        self.report_panel(report);
        Ok(())
    }

    fn set_ptt(&mut self, on: bool, report: &mut Reporter<'_>) -> Result<(), HardwareError> {
        self.record(BackendCall::SetPtt { on })
            .map_err(HardwareError::Rejected)?;
        self.ensure_online()?;

        self.apply(|panel| panel.ptt = on);
        self.report_panel(report);
        Ok(())
    }

    fn poll(&mut self, report: &mut Reporter<'_>) -> Result<(), HardwareError> {
        self.record(BackendCall::Poll)
            .map_err(HardwareError::UnexpectedResponse)?;
        self.ensure_online()?;

        if let Some(mut pending) = self.pending.take() {
            pending.remaining = pending.remaining.saturating_sub(1);
            if pending.remaining == 0 {
                debug!("Simulated rig {} caught up", self.config.id);
                self.handle.lock().panel = pending.target;
            } else {
                self.pending = Some(pending);
            }
        }
        self.report_panel(report);
        Ok(())
    }
}
