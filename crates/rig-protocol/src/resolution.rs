//! Frequency resolution reported by a rig at start-up

use crate::Frequency;

/// Frequency granularity of a rig
///
/// Wire value is a small signed integer: magnitude selects the step
/// (0 = 1 Hz, 1 = 10 Hz, 2 = 100 Hz), the sign selects rounding (positive)
/// or truncation (negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Resolution {
    /// 1 Hz steps
    #[default]
    Hz1,
    /// 10 Hz steps, rounded
    Hz10Rounded,
    /// 10 Hz steps, truncated
    Hz10Truncated,
    /// 100 Hz steps, rounded
    Hz100Rounded,
    /// 100 Hz steps, truncated
    Hz100Truncated,
}

impl Resolution {
    /// Convert to the signed wire value
    pub fn as_i8(&self) -> i8 {
        match self {
            Resolution::Hz1 => 0,
            Resolution::Hz10Rounded => 1,
            Resolution::Hz10Truncated => -1,
            Resolution::Hz100Rounded => 2,
            Resolution::Hz100Truncated => -2,
        }
    }

    /// Parse the signed wire value
    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            0 => Some(Resolution::Hz1),
            1 => Some(Resolution::Hz10Rounded),
            -1 => Some(Resolution::Hz10Truncated),
            2 => Some(Resolution::Hz100Rounded),
            -2 => Some(Resolution::Hz100Truncated),
            _ => None,
        }
    }

    /// Step size in Hz
    pub fn step_hz(&self) -> Frequency {
        match self {
            Resolution::Hz1 => 1,
            Resolution::Hz10Rounded | Resolution::Hz10Truncated => 10,
            Resolution::Hz100Rounded | Resolution::Hz100Truncated => 100,
        }
    }

    /// Apply this resolution to a frequency, the way the rig would
    pub fn quantize(&self, hz: Frequency) -> Frequency {
        let step = self.step_hz();
        match self {
            Resolution::Hz1 => hz,
            Resolution::Hz10Rounded | Resolution::Hz100Rounded => {
                hz.saturating_add(step / 2) / step * step
            }
            Resolution::Hz10Truncated | Resolution::Hz100Truncated => hz / step * step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_wire_values() {
        for value in -2..=2 {
            let res = Resolution::from_i8(value).unwrap();
            assert_eq!(res.as_i8(), value);
        }
        assert_eq!(Resolution::from_i8(3), None);
        assert_eq!(Resolution::from_i8(-3), None);
    }

    #[test]
    fn test_quantize_rounding_vs_truncation() {
        assert_eq!(Resolution::Hz1.quantize(14_074_567), 14_074_567);
        assert_eq!(Resolution::Hz10Rounded.quantize(14_074_567), 14_074_570);
        assert_eq!(Resolution::Hz10Truncated.quantize(14_074_567), 14_074_560);
        assert_eq!(Resolution::Hz100Rounded.quantize(14_074_567), 14_074_600);
        assert_eq!(Resolution::Hz100Truncated.quantize(14_074_567), 14_074_500);
    }

    #[test]
    fn test_quantize_saturates_near_max() {
        let hz = Resolution::Hz100Rounded.quantize(u64::MAX);
        assert!(hz <= u64::MAX);
        assert_eq!(hz % 100, 0);
    }

    fn resolution() -> impl Strategy<Value = Resolution> {
        prop_oneof![
            Just(Resolution::Hz1),
            Just(Resolution::Hz10Rounded),
            Just(Resolution::Hz10Truncated),
            Just(Resolution::Hz100Rounded),
            Just(Resolution::Hz100Truncated),
        ]
    }

    proptest! {
        #[test]
        fn wire_value_identifies_resolution(res in resolution()) {
            prop_assert_eq!(Resolution::from_i8(res.as_i8()), Some(res));
        }

        #[test]
        fn quantize_lands_on_a_step_nearby(res in resolution(), hz in 0u64..100_000_000_000) {
            let step = res.step_hz();
            let q = res.quantize(hz);
            prop_assert_eq!(q % step, 0);
            prop_assert!(q.abs_diff(hz) < step);
            if res.as_i8() < 0 {
                prop_assert!(q <= hz);
            }
        }
    }
}
