//! Rig worker
//!
//! Each open session runs its engine on a dedicated thread with its own
//! single-threaded runtime. Backend calls block, so they never share a
//! thread with the caller's runtime.
//!
//! # Architecture
//!
//! The worker receives [`WorkerCommand`]s through a bounded channel and sends
//! the engine's notifications back, tagged with the session generation, so
//! the manager can drop anything from a session it has since replaced. The
//! poll timer runs only while the engine's update policy asks for it.

use std::future::pending;
use std::thread::JoinHandle;

use rig_protocol::{Backend, RadioState};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::engine::{Engine, UpdatePolicy};
use crate::error::SessionError;
use crate::events::Notification;

/// Commands sent to a rig worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Bring the backend online
    Start { sequence: u64 },
    /// Reconcile toward a desired state
    Set { desired: RadioState, sequence: u64 },
    /// Poll now, optionally forcing a signal
    Sync { force: bool },
    /// Take the backend offline and exit
    Stop { sequence: u64 },
}

/// Notification tagged with the session it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerEvent {
    /// Session generation
    pub generation: u64,
    /// Engine output
    pub notification: Notification,
}

/// Caller's end of a running worker
#[derive(Debug)]
pub struct WorkerHandle {
    generation: u64,
    cmd_tx: mpsc::Sender<WorkerCommand>,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    /// Session generation this worker serves
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Queue a command without waiting
    pub fn send(&self, cmd: WorkerCommand) -> Result<(), SessionError> {
        self.cmd_tx.try_send(cmd).map_err(|e| match e {
            TrySendError::Full(_) => SessionError::QueueFull,
            TrySendError::Closed(_) => SessionError::NotOpen,
        })
    }

    /// Wait for the worker thread to exit
    ///
    /// Blocks. Only call after the worker has been told to stop, and never
    /// from inside an async task.
    pub fn join(self) {
        let WorkerHandle {
            generation,
            cmd_tx,
            thread,
        } = self;
        drop(cmd_tx);
        if thread.join().is_err() {
            warn!("Rig worker {} panicked", generation);
        }
    }
}

/// Start a worker thread driving `engine`
pub fn spawn_worker<B, P>(
    engine: Engine<B, P>,
    generation: u64,
    capacity: usize,
    event_tx: mpsc::Sender<WorkerEvent>,
) -> Result<WorkerHandle, SessionError>
where
    B: Backend + 'static,
    P: UpdatePolicy + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel(capacity.max(1));
    let thread = std::thread::Builder::new()
        .name(format!("rig-worker-{}", generation))
        .spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build();
            match runtime {
                Ok(runtime) => runtime.block_on(run_worker(engine, generation, cmd_rx, event_tx)),
                Err(e) => {
                    warn!("Rig worker {} has no runtime: {}", generation, e);
                    let failure = WorkerEvent {
                        generation,
                        notification: Notification::Failure {
                            reason: format!("worker runtime: {}", e),
                            sequence: 0,
                        },
                    };
                    if event_tx.blocking_send(failure).is_err() {
                        debug!("Rig worker {}: event receiver dropped", generation);
                    }
                }
            }
        })?;

    Ok(WorkerHandle {
        generation,
        cmd_tx,
        thread,
    })
}

/// Wait for the next poll tick, or forever while polling is off
async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(timer) => {
            timer.tick().await;
        }
        None => pending::<()>().await,
    }
}

/// Forward buffered notifications to the manager
async fn forward<B: Backend, P: UpdatePolicy>(
    engine: &mut Engine<B, P>,
    generation: u64,
    event_tx: &mpsc::Sender<WorkerEvent>,
) {
    for notification in engine.drain_events() {
        let event = WorkerEvent {
            generation,
            notification,
        };
        if event_tx.send(event).await.is_err() {
            debug!("Rig worker {}: event receiver dropped", generation);
        }
    }
}

/// Run the worker loop until stopped or the command channel closes
pub async fn run_worker<B: Backend, P: UpdatePolicy>(
    mut engine: Engine<B, P>,
    generation: u64,
    mut cmd_rx: mpsc::Receiver<WorkerCommand>,
    event_tx: mpsc::Sender<WorkerEvent>,
) {
    info!("Rig worker {} started for {}", generation, engine.backend().name());
    let mut poll_timer: Option<Interval> = None;

    loop {
        match (engine.policy().poll_interval(), poll_timer.is_some()) {
            (Some(period), false) => {
                debug!("Rig worker {}: polling every {:?}", generation, period);
                let mut timer = interval_at(Instant::now() + period, period);
                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                poll_timer = Some(timer);
            }
            (None, true) => {
                debug!("Rig worker {}: polling stopped", generation);
                poll_timer = None;
            }
            _ => {}
        }

        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    info!("Rig worker {}: command channel closed", generation);
                    let sequence = engine.last_sequence();
                    engine.stop(sequence);
                    forward(&mut engine, generation, &event_tx).await;
                    break;
                };
                match cmd {
                    WorkerCommand::Start { sequence } => engine.start(sequence),
                    WorkerCommand::Set { desired, sequence } => engine.set(&desired, sequence),
                    WorkerCommand::Sync { force } => engine.sync(force),
                    WorkerCommand::Stop { sequence } => {
                        engine.stop(sequence);
                        forward(&mut engine, generation, &event_tx).await;
                        break;
                    }
                }
                forward(&mut engine, generation, &event_tx).await;
            }

            _ = next_tick(&mut poll_timer) => {
                engine.poll_tick();
                forward(&mut engine, generation, &event_tx).await;
            }
        }
    }

    info!("Rig worker {} stopped", generation);
}
