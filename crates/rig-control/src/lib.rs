//! Transceiver control
//!
//! This crate keeps a radio in the state its caller asks for. The caller
//! describes a whole [`RadioState`](rig_protocol::RadioState) and the engine
//! works out which backend calls get the rig there, in a safe order.
//!
//! # Architecture
//!
//! - [`Engine`] reconciles requested state against one backend and buffers
//!   exactly one outcome per command.
//! - [`PollingDebouncer`] suppresses transient reports from poll-only rigs.
//! - The worker runs an engine on its own thread, driving the poll timer.
//! - [`SessionManager`] opens and closes sessions, numbers commands, and
//!   drops stale or superseded notifications.
//!
//! # Example
//!
//! ```rust,no_run
//! use rig_control::{RigParams, SessionEvent, SessionManager};
//!
//! # async fn run() {
//! let mut session = SessionManager::default();
//! session.open(RigParams::for_model("Simulated"));
//! session.set_frequency(7_074_000).unwrap();
//!
//! while let Some(event) = session.next_event().await {
//!     if let SessionEvent::Update(update) = event {
//!         println!("#{} {}", update.sequence, update.state);
//!     }
//! }
//! # }
//! ```

pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod events;
pub mod registry;
pub mod session;
pub mod worker;

pub use config::{RigParams, SplitMode};
pub use debounce::{PollingDebouncer, POLLS_TO_STABILIZE};
pub use engine::{Engine, EngineStatus, Immediate, UpdatePolicy, PTT_SETTLE_DELAY};
pub use error::SessionError;
pub use events::{Notification, SessionEvent, StateUpdate};
pub use registry::{BackendRegistry, NONE_MODEL, SIMULATED_MODEL};
pub use session::SessionManager;
pub use worker::{run_worker, spawn_worker, WorkerCommand, WorkerEvent, WorkerHandle};
