//! Control protocol engine
//!
//! The engine owns one [`Backend`] and reconciles the state a caller asks for
//! against what the rig reports. It runs on the rig worker thread and is
//! strictly sequential: one entry point at a time, each one mapped to a
//! fixed, ordered series of backend calls.
//!
//! # Notifications
//!
//! Like the multiplexer this design grew out of, the engine does not send
//! anything itself. Each entry point buffers its [`Notification`]s and the
//! worker drains them with [`Engine::drain_events`]. Every `start`, `set`
//! and `stop` buffers exactly one outcome: an update (or `Finished` for a
//! stop) on success, a failure otherwise. A successful start additionally
//! reports the rig's frequency resolution first.
//!
//! # Ordering
//!
//! Within a `set`, PTT release comes first, then the receive frequency (or
//! mode), then the transmit frequency, and PTT is keyed last. Nothing is
//! keyed onto a frequency the rig has not been told about yet.

use std::ops::{Deref, DerefMut};
use std::time::Duration;

use rig_protocol::{
    is_plausible_tx_frequency, Backend, Frequency, HardwareError, Mode, RadioState, Reporter,
    Resolution,
};
use tracing::{debug, info, warn};

use crate::events::{Notification, StateUpdate};

/// Pause after switching PTT, for rigs that need time to change over
pub const PTT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Lifecycle of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineStatus {
    /// No link to the rig
    #[default]
    Offline,
    /// Backend start in progress
    Starting,
    /// Link up, commands are forwarded
    Online,
    /// Going offline
    ShuttingDown,
    /// A backend call failed; offline until restarted
    Failed,
}

/// Decides when a change reported by the rig is worth signalling
///
/// The engine tells the policy what it has just asked the rig for, and asks
/// it after every poll whether to signal. The default methods describe a rig
/// that reports its own changes promptly.
pub trait UpdatePolicy: Send {
    /// Backend started
    fn started(&mut self) {}

    /// Backend stopped
    fn stopped(&mut self) {}

    /// Receive frequency (and mode, unless unknown) requested
    fn expect_frequency(&mut self, _hz: Frequency, _mode: Mode) {}

    /// Transmit frequency requested
    fn expect_tx_frequency(&mut self, _hz: Frequency, _mode: Mode) {}

    /// Mode requested
    fn expect_mode(&mut self, _mode: Mode) {}

    /// PTT requested
    fn expect_ptt(&mut self, _on: bool) {}

    /// Whether to signal `actual` after a poll
    fn settle(&mut self, actual: &RadioState, last_signalled: &RadioState, force: bool) -> bool {
        force || actual != last_signalled
    }

    /// Poll period while the rig should be polled, `None` otherwise
    fn poll_interval(&self) -> Option<Duration> {
        None
    }
}

/// Policy for rigs that push their own updates: signal every change at once
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl UpdatePolicy for Immediate {}

/// How an entry point completes when nothing failed
#[derive(Debug, Clone, Copy)]
enum Completion {
    Update,
    Finished,
}

/// Buffers the single outcome of an entry point when it goes out of scope
///
/// Entry points run their body through the guard; early returns and `?` all
/// funnel into [`Drop`], which cannot forget to report.
struct EmitGuard<'a, B: Backend, P: UpdatePolicy> {
    engine: &'a mut Engine<B, P>,
    sequence: u64,
    completion: Completion,
    failure: Option<String>,
}

impl<'a, B: Backend, P: UpdatePolicy> EmitGuard<'a, B, P> {
    fn new(engine: &'a mut Engine<B, P>, sequence: u64, completion: Completion) -> Self {
        Self {
            engine,
            sequence,
            completion,
            failure: None,
        }
    }

    fn fail(&mut self, error: HardwareError) {
        self.failure = Some(error.to_string());
    }
}

impl<B: Backend, P: UpdatePolicy> Deref for EmitGuard<'_, B, P> {
    type Target = Engine<B, P>;

    fn deref(&self) -> &Self::Target {
        self.engine
    }
}

impl<B: Backend, P: UpdatePolicy> DerefMut for EmitGuard<'_, B, P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.engine
    }
}

impl<B: Backend, P: UpdatePolicy> Drop for EmitGuard<'_, B, P> {
    fn drop(&mut self) {
        match self.failure.take() {
            Some(reason) => self.engine.go_offline(reason, self.sequence),
            None => match self.completion {
                Completion::Update => self.engine.signal(true),
                Completion::Finished => self.engine.events.push(Notification::Finished {
                    sequence: self.sequence,
                }),
            },
        }
    }
}

/// Reconciles requested radio state against one backend
pub struct Engine<B, P = Immediate> {
    backend: B,
    policy: P,
    status: EngineStatus,
    /// What the engine believes it has asked the rig for
    requested: RadioState,
    /// What the rig last reported
    actual: RadioState,
    last_signalled: RadioState,
    last_sequence: u64,
    resolution: Option<Resolution>,
    settle_delay: Duration,
    events: Vec<Notification>,
}

impl<B: Backend, P: UpdatePolicy> Engine<B, P> {
    /// Create an engine around a backend that has not been started
    pub fn new(backend: B, policy: P) -> Self {
        Self {
            backend,
            policy,
            status: EngineStatus::Offline,
            requested: RadioState::default(),
            actual: RadioState::default(),
            last_signalled: RadioState::default(),
            last_sequence: 0,
            resolution: None,
            settle_delay: PTT_SETTLE_DELAY,
            events: Vec::new(),
        }
    }

    /// Set the pause after PTT switches
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Get the backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get the backend mutably
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Get the update policy
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Current lifecycle status
    pub fn status(&self) -> EngineStatus {
        self.status
    }

    /// State the rig last reported
    pub fn state(&self) -> &RadioState {
        &self.actual
    }

    /// State the engine believes it has requested
    pub fn requested(&self) -> &RadioState {
        &self.requested
    }

    /// Sequence number of the last command that completed
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Frequency resolution reported at the last start
    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    /// Pause after PTT switches
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Take all buffered notifications
    pub fn drain_events(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.events)
    }

    /// Bring the backend online
    pub fn start(&mut self, sequence: u64) {
        let mut guard = EmitGuard::new(self, sequence, Completion::Update);
        guard.shutdown();
        match guard.startup() {
            Ok(()) => guard.last_sequence = sequence,
            Err(e) => guard.fail(e),
        }
    }

    /// Drive the rig toward `desired`
    pub fn set(&mut self, desired: &RadioState, sequence: u64) {
        debug!("Set #{}: {}", sequence, desired);
        let mut guard = EmitGuard::new(self, sequence, Completion::Update);
        if let Err(e) = guard.reconcile(desired, sequence) {
            guard.fail(e);
        }
    }

    /// Take the backend offline; never fails
    pub fn stop(&mut self, sequence: u64) {
        let mut guard = EmitGuard::new(self, sequence, Completion::Finished);
        guard.shutdown();
        guard.last_sequence = sequence;
    }

    /// Poll the rig and signal if the policy says so
    ///
    /// A forced sync while offline signals the offline state without
    /// touching the backend.
    pub fn sync(&mut self, force_signal: bool) {
        if self.status != EngineStatus::Online {
            if force_signal {
                self.signal(true);
            }
            return;
        }

        let polled = {
            let (backend, mut report) = self.io();
            backend.poll(&mut report)
        };
        match polled {
            Ok(()) => {
                if self
                    .policy
                    .settle(&self.actual, &self.last_signalled, force_signal)
                {
                    self.signal(true);
                }
            }
            Err(e) => {
                let sequence = self.last_sequence;
                self.go_offline(e.to_string(), sequence);
            }
        }
    }

    /// One tick of the poll timer
    pub fn poll_tick(&mut self) {
        self.sync(false);
    }

    fn io(&mut self) -> (&mut B, Reporter<'_>) {
        (
            &mut self.backend,
            Reporter::new(&mut self.actual, &mut self.requested),
        )
    }

    fn mode_differs(&self, mode: Mode) -> bool {
        !mode.is_unknown() && mode != self.requested.mode
    }

    fn settle(&self) {
        if !self.settle_delay.is_zero() {
            std::thread::sleep(self.settle_delay);
        }
    }

    fn reconcile(&mut self, desired: &RadioState, sequence: u64) -> Result<(), HardwareError> {
        let was_online = self.requested.online;
        if !desired.online && was_online {
            self.shutdown();
        } else if desired.online && !was_online {
            self.shutdown();
            self.startup()?;
        }

        if self.requested.online {
            let ptt_on = desired.ptt && !self.requested.ptt;
            let ptt_off = !desired.ptt && self.requested.ptt;

            if ptt_off {
                let (backend, mut report) = self.io();
                backend.set_ptt(false, &mut report)?;
                self.policy.expect_ptt(false);
                self.settle();
            }

            let retune = desired.frequency != self.requested.frequency
                || self.mode_differs(desired.mode)
                || ptt_off;
            if desired.frequency != 0 && retune {
                let (backend, mut report) = self.io();
                backend.set_frequency(desired.frequency, desired.mode, ptt_off, &mut report)?;
                self.policy
                    .expect_frequency(desired.frequency, desired.mode);
                self.requested.frequency = self.actual.frequency;
                self.requested.mode = self.actual.mode;
            } else if desired.frequency == 0 && self.mode_differs(desired.mode) {
                let (backend, mut report) = self.io();
                backend.set_mode(desired.mode, &mut report)?;
                self.policy.expect_mode(desired.mode);
                self.requested.mode = self.actual.mode;
            }

            if is_plausible_tx_frequency(desired.tx_frequency) {
                let retune_tx = desired.tx_frequency != self.requested.tx_frequency
                    || self.mode_differs(desired.mode)
                    || (desired.tx_frequency != 0 && ptt_on);
                if retune_tx {
                    let (backend, mut report) = self.io();
                    backend.set_tx_frequency(
                        desired.tx_frequency,
                        desired.mode,
                        ptt_on,
                        &mut report,
                    )?;
                    self.policy
                        .expect_tx_frequency(desired.tx_frequency, desired.mode);
                    self.requested.set_tx_frequency(self.actual.tx_frequency);
                }
            } else {
                warn!(
                    "Ignoring implausible tx frequency {} Hz",
                    desired.tx_frequency
                );
            }

            if ptt_on {
                let (backend, mut report) = self.io();
                backend.set_ptt(true, &mut report)?;
                self.policy.expect_ptt(true);
                self.settle();
            }

            self.requested.ptt = self.actual.ptt;
        }

        self.last_sequence = sequence;
        Ok(())
    }

    fn startup(&mut self) -> Result<(), HardwareError> {
        self.status = EngineStatus::Starting;
        info!("Starting {}", self.backend.name());

        let resolution = {
            let (backend, mut report) = self.io();
            backend.start(&mut report)?
        };
        debug!("{} resolution {:?}", self.backend.name(), resolution);
        self.resolution = Some(resolution);
        self.events.push(Notification::Resolution { resolution });
        self.policy.started();

        // The rig's own PTT and split state win over stale requests
        self.requested.ptt = self.actual.ptt;
        self.requested.set_tx_frequency(self.actual.tx_frequency);
        self.actual.online = true;
        self.requested.online = true;
        self.status = EngineStatus::Online;
        Ok(())
    }

    /// Release PTT and split, then close the link
    fn shutdown(&mut self) {
        if matches!(self.status, EngineStatus::Offline | EngineStatus::Failed) {
            return;
        }
        self.status = EngineStatus::ShuttingDown;

        if self.requested.online {
            let released = {
                let (backend, mut report) = self.io();
                backend.set_ptt(false, &mut report)
            };
            match released {
                Ok(()) => self.policy.expect_ptt(false),
                Err(e) => warn!("{}: PTT release failed: {}", self.backend.name(), e),
            }

            if self.requested.split {
                let cleared = {
                    let (backend, mut report) = self.io();
                    backend.set_tx_frequency(0, Mode::Unknown, true, &mut report)
                };
                match cleared {
                    Ok(()) => self.policy.expect_tx_frequency(0, Mode::Unknown),
                    Err(e) => warn!("{}: split reset failed: {}", self.backend.name(), e),
                }
            }
        }

        info!("Stopping {}", self.backend.name());
        self.backend.stop();
        self.policy.stopped();
        self.actual.online = false;
        self.requested.online = false;
        self.status = EngineStatus::Offline;
    }

    fn go_offline(&mut self, reason: String, sequence: u64) {
        warn!("{} failed: {}", self.backend.name(), reason);
        self.shutdown();
        self.status = EngineStatus::Failed;
        self.events.push(Notification::Failure { reason, sequence });
    }

    fn signal(&mut self, force: bool) {
        if force || self.actual != self.last_signalled {
            self.last_signalled = self.actual;
            self.events.push(Notification::Update(StateUpdate {
                state: self.actual,
                sequence: self.last_sequence,
            }));
        }
    }
}
