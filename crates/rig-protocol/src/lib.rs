//! Radio State and Backend Contract
//!
//! This crate provides the vocabulary shared by everything that talks to a
//! transceiver:
//!
//! - **RadioState**: one snapshot of frequency, split, mode, PTT and online status
//! - **Mode**: operating modes, including the `Unknown` wildcard used in requests
//! - **Resolution**: the frequency granularity a rig reports when it starts
//! - **Backend**: the operations a concrete radio driver must provide
//!
//! # Requested vs. actual state
//!
//! The same `RadioState` type is used in two directions:
//! - As a *desired* state, `frequency == 0` and `Mode::Unknown` mean "leave it alone"
//! - As an *actual* state, values are whatever the hardware last reported
//!
//! Drivers never write actual state directly. They report what the rig did
//! through a [`Reporter`], which enforces the invariants of the actual cache.
//!
//! # Example
//!
//! ```rust
//! use rig_protocol::{Mode, RadioState};
//!
//! let mut desired = RadioState::tuned(7_074_000, Mode::Usb);
//! desired.set_tx_frequency(7_075_500);
//!
//! assert!(desired.split);
//! assert_eq!(desired.frequency_display(), "7.074000 MHz");
//! ```

pub mod backend;
pub mod error;
pub mod mode;
pub mod resolution;
pub mod state;

pub use backend::{Backend, Reporter};
pub use error::HardwareError;
pub use mode::Mode;
pub use resolution::Resolution;
pub use state::RadioState;

/// Frequency in Hz
pub type Frequency = u64;

/// Frequencies this close to zero or to `u64::MAX` are treated as bogus
/// start-up values when they appear as a transmit frequency
pub const BOGUS_FREQUENCY_MARGIN: Frequency = 10_000;

/// Returns whether a requested transmit frequency may be written to a rig
///
/// Zero (clear split) is always acceptable. Non-zero values must keep clear
/// of the bogus-value margins at both ends of the range.
pub fn is_plausible_tx_frequency(hz: Frequency) -> bool {
    hz == 0 || (hz > BOGUS_FREQUENCY_MARGIN && hz < Frequency::MAX - BOGUS_FREQUENCY_MARGIN)
}
