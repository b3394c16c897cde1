//! Radio state snapshot

use crate::mode::Mode;
use crate::Frequency;

/// One slice of radio state
///
/// Compared by structural equality. Used both as the state a caller wants
/// and as the state the hardware last reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RadioState {
    /// Whether the backend session is logically open
    pub online: bool,
    /// Receive frequency in Hz (0 = unspecified)
    pub frequency: Frequency,
    /// Transmit frequency in Hz when split (0 = not split)
    pub tx_frequency: Frequency,
    /// Operating mode
    pub mode: Mode,
    /// Split operation, true whenever `tx_frequency != 0`
    pub split: bool,
    /// Transmitting
    pub ptt: bool,
}

impl RadioState {
    /// An online state tuned to a frequency and mode, receiving, not split
    pub fn tuned(frequency: Frequency, mode: Mode) -> Self {
        Self {
            online: true,
            frequency,
            mode,
            ..Self::default()
        }
    }

    /// Set the transmit frequency, keeping the split flag consistent
    pub fn set_tx_frequency(&mut self, hz: Frequency) {
        self.tx_frequency = hz;
        self.split = hz != 0;
    }

    /// Builder form of [`RadioState::set_tx_frequency`]
    pub fn with_tx_frequency(mut self, hz: Frequency) -> Self {
        self.set_tx_frequency(hz);
        self
    }

    /// Builder form for the PTT flag
    pub fn with_ptt(mut self, ptt: bool) -> Self {
        self.ptt = ptt;
        self
    }

    /// Format the receive frequency for display
    pub fn frequency_display(&self) -> String {
        format_frequency(self.frequency)
    }

    /// Format the transmit frequency for display
    pub fn tx_frequency_display(&self) -> String {
        format_frequency(self.tx_frequency)
    }
}

fn format_frequency(hz: Frequency) -> String {
    if hz == 0 {
        return "---".to_string();
    }
    let mhz = hz as f64 / 1_000_000.0;
    format!("{:.6} MHz", mhz)
}

impl std::fmt::Display for RadioState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.online {
            return f.write_str("offline");
        }
        write!(f, "{} {}", self.frequency_display(), self.mode)?;
        if self.split {
            write!(f, " split {}", self.tx_frequency_display())?;
        }
        if self.ptt {
            f.write_str(" [TX]")?;
        }
        Ok(())
    }
}
