//! Call journal and scripting handle for simulated rigs
//!
//! The simulated rig usually lives on a worker thread owned by the control
//! engine. A [`SimHandle`] stays with the test (or the CLI) and shares the
//! rig's journal, fault script and front panel through a mutex.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use rig_protocol::{Frequency, Mode};

/// One call a backend received, in the order received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCall {
    /// Link opened
    Start,
    /// Link closed
    Stop,
    /// Receive frequency set
    SetFrequency {
        hz: Frequency,
        mode: Mode,
        allow_immediate: bool,
    },
    /// Transmit frequency set
    SetTxFrequency {
        hz: Frequency,
        mode: Mode,
        allow_immediate: bool,
    },
    /// Mode set
    SetMode { mode: Mode },
    /// PTT set
    SetPtt { on: bool },
    /// State polled
    Poll,
}

impl BackendCall {
    /// Kind of call, used to target faults
    pub fn kind(&self) -> CallKind {
        match self {
            BackendCall::Start => CallKind::Start,
            BackendCall::Stop => CallKind::Stop,
            BackendCall::SetFrequency { .. } => CallKind::SetFrequency,
            BackendCall::SetTxFrequency { .. } => CallKind::SetTxFrequency,
            BackendCall::SetMode { .. } => CallKind::SetMode,
            BackendCall::SetPtt { .. } => CallKind::SetPtt,
            BackendCall::Poll => CallKind::Poll,
        }
    }

    /// Returns whether this call touches a frequency
    pub fn is_frequency(&self) -> bool {
        matches!(
            self,
            BackendCall::SetFrequency { .. } | BackendCall::SetTxFrequency { .. }
        )
    }
}

/// Kind of backend call, without arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Start,
    Stop,
    SetFrequency,
    SetTxFrequency,
    SetMode,
    SetPtt,
    Poll,
}

/// What the rig's front panel shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Panel {
    pub frequency: Frequency,
    pub tx_frequency: Frequency,
    pub mode: Mode,
    pub ptt: bool,
}

#[derive(Debug)]
pub(crate) struct Shared {
    pub calls: Vec<BackendCall>,
    pub faults: VecDeque<(CallKind, String)>,
    pub unresponsive: bool,
    pub panel: Panel,
}

/// Cloneable handle onto a simulated rig
#[derive(Debug, Clone)]
pub struct SimHandle {
    shared: Arc<Mutex<Shared>>,
}

impl SimHandle {
    pub(crate) fn new(panel: Panel) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                calls: Vec::new(),
                faults: VecDeque::new(),
                unresponsive: false,
                panel,
            })),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Shared> {
        // Poisoning is ignored, the journal stays readable
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All calls received so far
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Calls received so far, excluding polls
    pub fn commands(&self) -> Vec<BackendCall> {
        self.lock()
            .calls
            .iter()
            .copied()
            .filter(|c| *c != BackendCall::Poll)
            .collect()
    }

    /// Number of polls received so far
    pub fn poll_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| **c == BackendCall::Poll)
            .count()
    }

    /// Forget all recorded calls
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Make the next call of `kind` fail with `message`
    ///
    /// Faults queue up and fire in order.
    pub fn fail_next(&self, kind: CallKind, message: impl Into<String>) {
        self.lock().faults.push_back((kind, message.into()));
    }

    /// Accept commands but never act on them
    pub fn set_unresponsive(&self, unresponsive: bool) {
        self.lock().unresponsive = unresponsive;
    }

    /// Turn the rig's dial by hand
    pub fn turn_dial(&self, hz: Frequency) {
        self.lock().panel.frequency = hz;
    }

    /// Set the other VFO by hand, putting the rig into split (0 = leave split)
    pub fn press_split(&self, tx_hz: Frequency) {
        self.lock().panel.tx_frequency = tx_hz;
    }

    /// Change the rig's mode by hand
    pub fn press_mode(&self, mode: Mode) {
        if !mode.is_unknown() {
            self.lock().panel.mode = mode;
        }
    }

    /// Frequency currently shown on the rig
    pub fn panel_frequency(&self) -> Frequency {
        self.lock().panel.frequency
    }

    /// Whether the rig is currently transmitting
    pub fn panel_ptt(&self) -> bool {
        self.lock().panel.ptt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> SimHandle {
        SimHandle::new(Panel {
            frequency: 14_074_000,
            tx_frequency: 0,
            mode: Mode::Usb,
            ptt: false,
        })
    }

    #[test]
    fn test_commands_exclude_polls() {
        let handle = handle();
        {
            let mut shared = handle.lock();
            shared.calls.push(BackendCall::Start);
            shared.calls.push(BackendCall::Poll);
            shared.calls.push(BackendCall::SetPtt { on: true });
        }

        assert_eq!(handle.calls().len(), 3);
        assert_eq!(
            handle.commands(),
            vec![BackendCall::Start, BackendCall::SetPtt { on: true }]
        );
        assert_eq!(handle.poll_count(), 1);

        handle.clear_calls();
        assert!(handle.calls().is_empty());
    }

    #[test]
    fn test_press_mode_ignores_unknown() {
        let handle = handle();
        handle.press_mode(Mode::Unknown);
        assert_eq!(handle.lock().panel.mode, Mode::Usb);
        handle.press_mode(Mode::Cw);
        assert_eq!(handle.lock().panel.mode, Mode::Cw);
    }

    #[test]
    fn test_call_kinds() {
        let call = BackendCall::SetTxFrequency {
            hz: 7_076_000,
            mode: Mode::Unknown,
            allow_immediate: true,
        };
        assert_eq!(call.kind(), CallKind::SetTxFrequency);
        assert!(call.is_frequency());
        assert!(!BackendCall::SetPtt { on: false }.is_frequency());
    }
}
