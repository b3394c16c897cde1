//! Session manager
//!
//! The caller-facing side of rig control. The manager owns at most one
//! worker at a time, numbers every command it sends, and filters what comes
//! back:
//!
//! - Notifications from a worker it has since replaced are dropped.
//! - State updates for anything but the latest command are dropped, so a
//!   burst of requests only ever reports forward.
//! - An update that reports the rig offline, or any failure, closes the
//!   session.
//!
//! Requests never block; they are queued to the worker. Results arrive
//! through [`SessionManager::next_event`], and are also published to any
//! subscribers.

use std::collections::VecDeque;

use rig_protocol::{Frequency, Mode, RadioState, Resolution};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::config::RigParams;
use crate::debounce::PollingDebouncer;
use crate::engine::Engine;
use crate::error::SessionError;
use crate::events::{Notification, SessionEvent, StateUpdate};
use crate::registry::BackendRegistry;
use crate::worker::{spawn_worker, WorkerCommand, WorkerEvent, WorkerHandle};

/// Capacity of the worker event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Capacity of the subscriber broadcast channels
const BROADCAST_CAPACITY: usize = 64;

/// Owns the active rig session
pub struct SessionManager {
    registry: BackendRegistry,
    params: Option<RigParams>,
    worker: Option<WorkerHandle>,
    generation: u64,
    /// Last command number issued
    sequence: u64,
    /// Desired state, following what the rig reports
    cached: RadioState,
    resolution: Option<Resolution>,
    pending: VecDeque<SessionEvent>,
    event_tx: mpsc::Sender<WorkerEvent>,
    event_rx: mpsc::Receiver<WorkerEvent>,
    update_tx: broadcast::Sender<StateUpdate>,
    failure_tx: broadcast::Sender<String>,
}

impl SessionManager {
    /// Create a manager with no session open
    pub fn new(registry: BackendRegistry) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (update_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (failure_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            registry,
            params: None,
            worker: None,
            generation: 0,
            sequence: 0,
            cached: RadioState::default(),
            resolution: None,
            pending: VecDeque::new(),
            event_tx,
            event_rx,
            update_tx,
            failure_tx,
        }
    }

    /// Get the backend registry
    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Get the backend registry mutably
    pub fn registry_mut(&mut self) -> &mut BackendRegistry {
        &mut self.registry
    }

    /// Whether a session is open
    pub fn is_open(&self) -> bool {
        self.worker.is_some()
    }

    /// Parameters of the current (or last) session
    pub fn params(&self) -> Option<&RigParams> {
        self.params.as_ref()
    }

    /// Cached rig state
    ///
    /// Online, frequency and mode follow the rig; the tx frequency is the
    /// one last requested.
    pub fn state(&self) -> &RadioState {
        &self.cached
    }

    /// Frequency resolution of the open session, once known
    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    /// Last command number issued
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Current session generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Subscribe to state updates
    pub fn subscribe_updates(&self) -> broadcast::Receiver<StateUpdate> {
        self.update_tx.subscribe()
    }

    /// Subscribe to failure reasons
    pub fn subscribe_failures(&self) -> broadcast::Receiver<String> {
        self.failure_tx.subscribe()
    }

    /// Open a session, unless one with the same parameters is already open
    ///
    /// Returns false if the backend could not be created; the reason is
    /// also reported as a failure event.
    pub fn open(&mut self, params: RigParams) -> bool {
        if self.is_open() && self.params.as_ref() == Some(&params) {
            debug!("Rig session already open for {}", params.model);
            return true;
        }
        self.open_forced(params)
    }

    /// Open a session, replacing any open one
    pub fn open_forced(&mut self, params: RigParams) -> bool {
        self.close();
        let opened = self.launch(&params);
        self.params = Some(params);
        match opened {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to open rig session: {}", e);
                self.pending.push_back(SessionEvent::Failure {
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    fn launch(&mut self, params: &RigParams) -> Result<(), SessionError> {
        let backend = self.registry.create(params)?;
        let policy = PollingDebouncer::new(params.poll_interval());
        let engine = Engine::new(backend, policy).with_settle_delay(params.settle_delay());

        self.generation += 1;
        let worker = spawn_worker(
            engine,
            self.generation,
            params.command_queue(),
            self.event_tx.clone(),
        )?;
        info!(
            "Opened rig session {} for {}",
            self.generation, params.model
        );

        self.cached = RadioState::default();
        self.resolution = None;
        self.sequence += 1;
        worker.send(WorkerCommand::Start {
            sequence: self.sequence,
        })?;
        self.worker = Some(worker);
        Ok(())
    }

    /// Close the open session, if any
    ///
    /// The worker shuts the backend down in the background and reports
    /// `Finished` when done.
    pub fn close(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        self.sequence += 1;
        info!("Closing rig session {}", worker.generation());
        if let Err(e) = worker.send(WorkerCommand::Stop {
            sequence: self.sequence,
        }) {
            // Dropping the handle closes the channel; the worker stops anyway
            debug!("Stop not queued: {}", e);
        }
        self.cached.online = false;
    }

    /// Request a desired rig state
    ///
    /// Returns the command number the resulting update will carry.
    pub fn request(&mut self, desired: RadioState) -> Result<u64, SessionError> {
        if desired.tx_frequency != 0 {
            let split_enabled = self
                .params
                .as_ref()
                .is_some_and(|p| p.split_mode.is_enabled());
            if !split_enabled {
                return Err(SessionError::ProtocolMisuse(format!(
                    "tx frequency {} Hz requested with split disabled",
                    desired.tx_frequency
                )));
            }
        }

        let worker = self.worker.as_ref().ok_or(SessionError::NotOpen)?;
        let sequence = self.sequence + 1;
        worker.send(WorkerCommand::Set { desired, sequence })?;
        self.sequence = sequence;
        debug!("Requested #{}: {}", sequence, desired);
        Ok(sequence)
    }

    /// Ask the worker to poll now
    pub fn sync(&mut self, force: bool) -> Result<(), SessionError> {
        let worker = self.worker.as_ref().ok_or(SessionError::NotOpen)?;
        worker.send(WorkerCommand::Sync { force })
    }

    fn data_mode(&self) -> Mode {
        self.params
            .as_ref()
            .and_then(|p| p.data_mode)
            .unwrap_or(Mode::Unknown)
    }

    /// Tune the receive frequency
    pub fn set_frequency(&mut self, hz: Frequency) -> Result<u64, SessionError> {
        let mut desired = self.cached;
        desired.online = true;
        desired.mode = self.data_mode();
        desired.frequency = hz;
        self.request_cached(desired)
    }

    /// Set the transmit frequency; zero leaves split
    pub fn set_tx_frequency(&mut self, hz: Frequency) -> Result<u64, SessionError> {
        let mut desired = self.cached;
        desired.online = true;
        desired.mode = self.data_mode();
        desired.set_tx_frequency(hz);
        self.request_cached(desired)
    }

    /// Set the operating mode
    pub fn set_mode(&mut self, mode: Mode) -> Result<u64, SessionError> {
        let mut desired = self.cached;
        desired.online = true;
        desired.mode = mode;
        self.request_cached(desired)
    }

    /// Key or unkey the transmitter
    pub fn set_ptt(&mut self, on: bool) -> Result<u64, SessionError> {
        let mut desired = self.cached;
        desired.online = true;
        desired.mode = self.data_mode();
        desired.ptt = on;
        self.request_cached(desired)
    }

    fn request_cached(&mut self, desired: RadioState) -> Result<u64, SessionError> {
        let sequence = self.request(desired)?;
        self.cached = desired;
        Ok(sequence)
    }

    /// Wait for the next event
    ///
    /// Returns `None` only if the event channel is closed, which cannot
    /// happen while the manager exists.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                self.publish(&event);
                return Some(event);
            }
            let event = self.event_rx.recv().await?;
            self.handle_worker_event(event);
        }
    }

    /// Get the next event if one is ready
    pub fn try_next_event(&mut self) -> Option<SessionEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                self.publish(&event);
                return Some(event);
            }
            let event = self.event_rx.try_recv().ok()?;
            self.handle_worker_event(event);
        }
    }

    fn publish(&self, event: &SessionEvent) {
        // Send errors only mean nobody is subscribed
        match event {
            SessionEvent::Update(update) => {
                let _ = self.update_tx.send(*update);
            }
            SessionEvent::Failure { reason } => {
                let _ = self.failure_tx.send(reason.clone());
            }
            SessionEvent::Finished { .. } => {}
        }
    }

    fn handle_worker_event(&mut self, event: WorkerEvent) {
        let WorkerEvent {
            generation,
            notification,
        } = event;

        if let Notification::Finished { sequence } = notification {
            debug!("Rig session {} finished (#{})", generation, sequence);
            self.pending.push_back(SessionEvent::Finished { sequence });
            return;
        }
        if generation != self.generation || !self.is_open() {
            debug!(
                "Dropping {:?} from closed rig session {}",
                notification, generation
            );
            return;
        }

        match notification {
            Notification::Resolution { resolution } => {
                info!("Rig resolution {:?}", resolution);
                self.resolution = Some(resolution);
            }
            Notification::Update(update) => {
                let latest = update.sequence >= self.sequence;
                if latest {
                    self.follow(&update.state);
                }
                if !update.state.online {
                    self.close();
                }
                if latest {
                    self.pending.push_back(SessionEvent::Update(update));
                } else {
                    debug!(
                        "Dropping stale update #{} (latest #{})",
                        update.sequence, self.sequence
                    );
                }
            }
            Notification::Failure { reason, sequence } => {
                warn!("Rig failed at #{}: {}", sequence, reason);
                self.close();
                self.pending.push_back(SessionEvent::Failure { reason });
            }
            Notification::Finished { .. } => {}
        }
    }

    fn follow(&mut self, state: &RadioState) {
        self.cached.online = state.online;
        if state.frequency != 0 {
            self.cached.frequency = state.frequency;
        }
        if !state.mode.is_unknown() {
            self.cached.mode = state.mode;
        }
        // tx frequency stays as last requested; a rig-side split must not
        // leak into later requests
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(BackendRegistry::default())
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("generation", &self.generation)
            .field("sequence", &self.sequence)
            .field("open", &self.is_open())
            .field("cached", &self.cached)
            .finish()
    }
}
