//! Rig Simulation Library
//!
//! This crate provides a simulated transceiver for exercising rig control
//! without physical hardware. It includes:
//!
//! - **SimulatedRig**: a [`Backend`](rig_protocol::Backend) with configurable
//!   confirmation lag, resolution and fault injection
//! - **SimHandle**: a cloneable handle for inspecting the calls a rig received
//!   and for scripting faults or front-panel changes while it runs elsewhere
//!
//! # Example
//!
//! ```rust
//! use rig_protocol::{Backend, Mode, RadioState, Reporter};
//! use rig_sim::{BackendCall, SimulatedRig, SimulatedRigConfig};
//!
//! let (mut rig, handle) = SimulatedRig::new(SimulatedRigConfig::default());
//!
//! let mut actual = RadioState::default();
//! let mut requested = RadioState::default();
//! let mut report = Reporter::new(&mut actual, &mut requested);
//!
//! rig.start(&mut report).unwrap();
//! rig.set_ptt(true, &mut report).unwrap();
//!
//! assert!(actual.ptt);
//! assert_eq!(handle.calls(), vec![BackendCall::Start, BackendCall::SetPtt { on: true }]);
//! ```

pub mod journal;
pub mod rig;

pub use journal::{BackendCall, CallKind, SimHandle};
pub use rig::{SimulatedRig, SimulatedRigConfig};
