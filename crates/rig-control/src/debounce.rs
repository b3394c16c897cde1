//! Polling debouncer
//!
//! Rigs that cannot push changes are polled. Right after a command they often
//! still report the old state for a poll or two; signalling that would make
//! the displayed frequency flicker. While a command is outstanding the
//! debouncer holds signals back until the rig reports what was asked for, or
//! [`POLLS_TO_STABILIZE`] polls have passed.

use std::time::Duration;

use rig_protocol::{Frequency, Mode, RadioState};
use tracing::trace;

use crate::engine::UpdatePolicy;

/// Polls to wait for a command to show up before signalling anyway
pub const POLLS_TO_STABILIZE: u32 = 3;

/// Update policy for poll-only rigs
#[derive(Debug, Clone)]
pub struct PollingDebouncer {
    interval: Duration,
    running: bool,
    /// State the rig should settle into
    expected: RadioState,
    retries: u32,
}

impl PollingDebouncer {
    /// Create a debouncer polling every `interval`; zero disables polling
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            running: false,
            expected: RadioState::default(),
            retries: 0,
        }
    }

    /// Configured poll interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Polls left before signalling regardless
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Whether a command is still waiting to show up
    pub fn is_armed(&self) -> bool {
        self.retries > 0
    }

    /// State the rig is expected to settle into
    pub fn expected(&self) -> &RadioState {
        &self.expected
    }

    fn arm(&mut self) {
        trace!("Debouncer armed, expecting {}", self.expected);
        self.retries = POLLS_TO_STABILIZE;
    }
}

impl UpdatePolicy for PollingDebouncer {
    fn started(&mut self) {
        self.running = !self.interval.is_zero();
        if !self.expected.online {
            self.expected.online = true;
            self.arm();
        }
    }

    fn stopped(&mut self) {
        self.running = false;
        self.expected.online = false;
    }

    fn expect_frequency(&mut self, hz: Frequency, mode: Mode) {
        let mode_changed = !mode.is_unknown() && mode != self.expected.mode;
        if hz != self.expected.frequency || mode_changed {
            self.expected.frequency = hz;
            if !mode.is_unknown() {
                self.expected.mode = mode;
            }
            self.arm();
        }
    }

    fn expect_tx_frequency(&mut self, hz: Frequency, _mode: Mode) {
        if hz != self.expected.tx_frequency {
            self.expected.set_tx_frequency(hz);
            self.arm();
        }
    }

    fn expect_mode(&mut self, mode: Mode) {
        if !mode.is_unknown() && mode != self.expected.mode {
            self.expected.mode = mode;
            self.arm();
        }
    }

    fn expect_ptt(&mut self, on: bool) {
        if on != self.expected.ptt {
            self.expected.ptt = on;
            self.arm();
        }
    }

    fn settle(&mut self, actual: &RadioState, last_signalled: &RadioState, force: bool) -> bool {
        let signal = if self.retries > 0 {
            self.retries -= 1;
            force || *actual == self.expected || self.retries == 0
        } else {
            force || actual != last_signalled
        };
        if signal {
            self.retries = 0;
            self.expected = *actual;
        }
        signal
    }

    fn poll_interval(&self) -> Option<Duration> {
        self.running.then_some(self.interval)
    }
}
