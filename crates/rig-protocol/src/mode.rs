//! Operating modes

/// Operating modes supported by amateur radio transceivers
///
/// `Unknown` is a wildcard: in a desired state it means "do not change the
/// rig's mode". It is never stored as an observed mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Mode not known or not cared about
    #[default]
    Unknown,
    /// Continuous Wave
    Cw,
    /// CW Reverse
    CwR,
    /// Upper Sideband
    Usb,
    /// Lower Sideband
    Lsb,
    /// Frequency Shift Keying (RTTY)
    Fsk,
    /// FSK Reverse
    FskR,
    /// Digital Upper (USB data)
    DigU,
    /// Digital Lower (LSB data)
    DigL,
    /// Amplitude Modulation
    Am,
    /// Frequency Modulation
    Fm,
    /// Digital FM (FM data)
    DigFm,
}

impl Mode {
    /// All concrete modes, excluding the `Unknown` wildcard
    pub const ALL: [Mode; 11] = [
        Mode::Cw,
        Mode::CwR,
        Mode::Usb,
        Mode::Lsb,
        Mode::Fsk,
        Mode::FskR,
        Mode::DigU,
        Mode::DigL,
        Mode::Am,
        Mode::Fm,
        Mode::DigFm,
    ];

    /// Returns a short name for the mode
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Unknown => "UNK",
            Mode::Cw => "CW",
            Mode::CwR => "CW-R",
            Mode::Usb => "USB",
            Mode::Lsb => "LSB",
            Mode::Fsk => "FSK",
            Mode::FskR => "FSK-R",
            Mode::DigU => "DATA-U",
            Mode::DigL => "DATA-L",
            Mode::Am => "AM",
            Mode::Fm => "FM",
            Mode::DigFm => "DATA-FM",
        }
    }

    /// Look up a mode by name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Mode> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("UNK") || name.eq_ignore_ascii_case("unknown") {
            return Some(Mode::Unknown);
        }
        Mode::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }

    /// Returns whether this is the "don't care" wildcard
    pub fn is_unknown(&self) -> bool {
        *self == Mode::Unknown
    }

    /// Returns whether this is a voice mode
    pub fn is_voice(&self) -> bool {
        matches!(self, Self::Usb | Self::Lsb | Self::Am | Self::Fm)
    }

    /// Returns whether this is a digital/data mode
    pub fn is_digital(&self) -> bool {
        matches!(
            self,
            Self::DigU | Self::DigL | Self::DigFm | Self::Fsk | Self::FskR
        )
    }

    /// Returns whether this is a CW mode
    pub fn is_cw(&self) -> bool {
        matches!(self, Self::Cw | Self::CwR)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trips_for_all_modes() {
        for mode in Mode::ALL {
            assert_eq!(Mode::from_name(mode.name()), Some(mode));
        }
    }

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(Mode::from_name("usb"), Some(Mode::Usb));
        assert_eq!(Mode::from_name(" data-u "), Some(Mode::DigU));
        assert_eq!(Mode::from_name("unknown"), Some(Mode::Unknown));
        assert_eq!(Mode::from_name("SSTV"), None);
    }

    #[test]
    fn test_default_is_unknown() {
        assert!(Mode::default().is_unknown());
        assert!(!Mode::Usb.is_unknown());
    }

    #[test]
    fn test_classification() {
        assert!(Mode::Usb.is_voice());
        assert!(Mode::DigU.is_digital());
        assert!(Mode::CwR.is_cw());
        assert!(!Mode::Unknown.is_voice());
        assert!(!Mode::Unknown.is_digital());
    }
}
