//! Backend contract for concrete radio drivers
//!
//! A backend is the only thing that talks to the hardware. It is driven by
//! the control engine, one call at a time, on a dedicated worker thread, so
//! implementations may block on I/O freely.
//!
//! Every operation receives a [`Reporter`]. Backends use it to tell the
//! engine what the rig actually did, which may differ from what was asked
//! (a rig may clamp or round a frequency, or refuse a mode silently).

use tracing::trace;

use crate::error::HardwareError;
use crate::mode::Mode;
use crate::resolution::Resolution;
use crate::state::RadioState;
use crate::Frequency;

/// Operations a concrete radio driver provides
pub trait Backend: Send {
    /// Human-readable name for logging
    fn name(&self) -> &str;

    /// Open the link to the rig and return its frequency resolution
    fn start(&mut self, report: &mut Reporter<'_>) -> Result<Resolution, HardwareError>;

    /// Close the link
    ///
    /// Best effort: implementations swallow their own errors, going offline
    /// always succeeds.
    fn stop(&mut self);

    /// Set the receive frequency, and the mode unless it is `Mode::Unknown`
    ///
    /// `allow_immediate` is true when the engine has already waited for the
    /// rig to settle, so the driver may skip its own pacing.
    fn set_frequency(
        &mut self,
        hz: Frequency,
        mode: Mode,
        allow_immediate: bool,
        report: &mut Reporter<'_>,
    ) -> Result<(), HardwareError>;

    /// Set the transmit frequency; zero leaves split operation
    fn set_tx_frequency(
        &mut self,
        hz: Frequency,
        mode: Mode,
        allow_immediate: bool,
        report: &mut Reporter<'_>,
    ) -> Result<(), HardwareError>;

    /// Set the operating mode
    fn set_mode(&mut self, mode: Mode, report: &mut Reporter<'_>) -> Result<(), HardwareError>;

    /// Key or unkey the transmitter
    fn set_ptt(&mut self, on: bool, report: &mut Reporter<'_>) -> Result<(), HardwareError>;

    /// Re-read the rig's state and report it
    ///
    /// Only used for rigs that cannot push changes. "Nothing changed" is not
    /// an error.
    fn poll(&mut self, report: &mut Reporter<'_>) -> Result<(), HardwareError>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn start(&mut self, report: &mut Reporter<'_>) -> Result<Resolution, HardwareError> {
        (**self).start(report)
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn set_frequency(
        &mut self,
        hz: Frequency,
        mode: Mode,
        allow_immediate: bool,
        report: &mut Reporter<'_>,
    ) -> Result<(), HardwareError> {
        (**self).set_frequency(hz, mode, allow_immediate, report)
    }

    fn set_tx_frequency(
        &mut self,
        hz: Frequency,
        mode: Mode,
        allow_immediate: bool,
        report: &mut Reporter<'_>,
    ) -> Result<(), HardwareError> {
        (**self).set_tx_frequency(hz, mode, allow_immediate, report)
    }

    fn set_mode(&mut self, mode: Mode, report: &mut Reporter<'_>) -> Result<(), HardwareError> {
        (**self).set_mode(mode, report)
    }

    fn set_ptt(&mut self, on: bool, report: &mut Reporter<'_>) -> Result<(), HardwareError> {
        (**self).set_ptt(on, report)
    }

    fn poll(&mut self, report: &mut Reporter<'_>) -> Result<(), HardwareError> {
        (**self).poll(report)
    }
}

/// Update path from a backend into the engine's state caches
///
/// Receive frequency and mode reports also move the requested state, so a
/// knob turned at the rig is not undone by the next command.
pub struct Reporter<'a> {
    actual: &'a mut RadioState,
    requested: &'a mut RadioState,
}

impl<'a> Reporter<'a> {
    /// Create a reporter over the actual and requested caches
    pub fn new(actual: &'a mut RadioState, requested: &'a mut RadioState) -> Self {
        Self { actual, requested }
    }

    /// Rig's receive frequency
    pub fn rx_frequency(&mut self, hz: Frequency) {
        self.actual.frequency = hz;
        self.requested.frequency = hz;
    }

    /// Rig's other (transmit) VFO frequency, zero when not split
    pub fn tx_frequency(&mut self, hz: Frequency) {
        self.actual.set_tx_frequency(hz);
    }

    /// Rig's operating mode; `Mode::Unknown` is ignored
    pub fn mode(&mut self, mode: Mode) {
        if mode.is_unknown() {
            trace!("Ignoring unknown mode report");
            return;
        }
        self.actual.mode = mode;
        self.requested.mode = mode;
    }

    /// Rig's PTT state
    pub fn ptt(&mut self, on: bool) {
        self.actual.ptt = on;
    }

    /// State as reported so far
    pub fn actual(&self) -> &RadioState {
        self.actual
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rx_frequency_tracks_requested() {
        let mut actual = RadioState::default();
        let mut requested = RadioState::default();
        let mut report = Reporter::new(&mut actual, &mut requested);

        report.rx_frequency(14_074_000);

        assert_eq!(actual.frequency, 14_074_000);
        assert_eq!(requested.frequency, 14_074_000);
    }

    #[test]
    fn test_unknown_mode_never_cached() {
        let mut actual = RadioState::tuned(7_074_000, Mode::Usb);
        let mut requested = actual;
        let mut report = Reporter::new(&mut actual, &mut requested);

        report.mode(Mode::Unknown);
        assert_eq!(report.actual().mode, Mode::Usb);

        report.mode(Mode::Cw);
        assert_eq!(actual.mode, Mode::Cw);
        assert_eq!(requested.mode, Mode::Cw);
    }

    #[test]
    fn test_tx_frequency_sets_split_only_on_actual() {
        let mut actual = RadioState::default();
        let mut requested = RadioState::default();
        let mut report = Reporter::new(&mut actual, &mut requested);

        report.tx_frequency(7_076_000);
        report.ptt(true);

        assert!(actual.split);
        assert!(actual.ptt);
        assert!(!requested.split);
        assert!(!requested.ptt);
    }
}
