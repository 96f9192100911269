//! Door controller — the single authority over one door's hardware.
//!
//! While running, the controller owns two background tasks:
//!
//! - the **command loop** drains a bounded FIFO of [`Command`]s and executes
//!   them one at a time against the adapter;
//! - the **poll loop** samples both sensors at a fixed interval, derives the
//!   [`DoorState`] and broadcasts it to every listener when it changes.
//!
//! The poll loop is the only writer of the cached state (apart from an
//! explicit [`DoorController::reset`]), so readers never race a command.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use garagedoor_domain::command::Command;
use garagedoor_domain::door_state::DoorState;
use garagedoor_domain::error::{AdapterError, ControllerError};
use garagedoor_domain::id::ListenerId;

use crate::listeners::ListenerRegistry;
use crate::ports::{DoorAdapter, StateListener};

/// Default capacity of the command queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;
/// Default interval between two sensor samples.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Default time the toggle output is held on each edge of a pulse.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(250);

/// Timing and sizing of a [`DoorController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Interval between two sensor samples.
    pub poll_interval: Duration,
    /// Delay after raising and after lowering the toggle output.
    pub settle_delay: Duration,
    /// Maximum number of queued commands before producers wait.
    pub queue_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Controller for a single door.
///
/// Construct one per process and share it behind an [`Arc`]. [`start`](Self::start)
/// and [`stop`](Self::stop) may be called any number of times.
pub struct DoorController<A> {
    shared: Arc<Shared<A>>,
    commands: RwLock<Option<mpsc::Sender<Command>>>,
    workers: tokio::sync::Mutex<Option<Workers>>,
}

/// State reachable from both background loops.
struct Shared<A> {
    config: ControllerConfig,
    adapter: Mutex<A>,
    state: RwLock<DoorState>,
    ready: AtomicBool,
    listeners: ListenerRegistry,
}

/// Handles of one running generation of background loops.
struct Workers {
    shutdown: watch::Sender<bool>,
    command_loop: JoinHandle<()>,
    poll_loop: JoinHandle<()>,
}

impl<A> DoorController<A>
where
    A: DoorAdapter + 'static,
{
    /// Create a stopped controller with the default timing.
    #[must_use]
    pub fn new(adapter: A) -> Self {
        Self::with_config(adapter, ControllerConfig::default())
    }

    /// Create a stopped controller with custom timing.
    #[must_use]
    pub fn with_config(adapter: A, mut config: ControllerConfig) -> Self {
        config.queue_capacity = config.queue_capacity.max(1);
        Self {
            shared: Arc::new(Shared {
                config,
                adapter: Mutex::new(adapter),
                state: RwLock::new(DoorState::Unknown),
                ready: AtomicBool::new(false),
                listeners: ListenerRegistry::new(),
            }),
            commands: RwLock::new(None),
            workers: tokio::sync::Mutex::new(None),
        }
    }

    /// The timing this controller was built with.
    #[must_use]
    pub fn config(&self) -> ControllerConfig {
        self.shared.config
    }

    /// Spawn the command and poll loops on the current tokio runtime.
    ///
    /// Every start allocates a fresh command queue.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::AlreadyRunning`] if the loops are already
    /// running; nothing is spawned in that case.
    pub async fn start(&self) -> Result<(), ControllerError> {
        let mut workers = self.workers.lock().await;
        if workers.is_some() {
            return Err(ControllerError::AlreadyRunning);
        }

        let (sender, receiver) = mpsc::channel(self.shared.config.queue_capacity);
        let (shutdown, shutdown_rx) = watch::channel(false);
        self.shared.ready.store(false, Ordering::Release);

        let command_loop = tokio::spawn(command_loop(
            Arc::clone(&self.shared),
            receiver,
            shutdown_rx.clone(),
        ));
        let poll_loop = tokio::spawn(poll_loop(Arc::clone(&self.shared), shutdown_rx));

        *self.write_commands() = Some(sender);
        *workers = Some(Workers {
            shutdown,
            command_loop,
            poll_loop,
        });

        tracing::info!(
            poll_interval_ms = self.shared.config.poll_interval.as_millis(),
            queue_capacity = self.shared.config.queue_capacity,
            "door controller started"
        );
        Ok(())
    }

    /// Signal both loops to exit and wait until they have.
    ///
    /// A no-op on a controller that is not running. Commands still queued
    /// are discarded and producers waiting on a full queue are released with
    /// [`ControllerError::NotRunning`].
    pub async fn stop(&self) {
        let mut workers = self.workers.lock().await;
        let Some(running) = workers.take() else {
            return;
        };

        tracing::info!("stopping door controller");
        self.write_commands().take();
        // both receivers are alive until their loop exits
        let _ = running.shutdown.send(true);

        for (task, handle) in [
            ("command", running.command_loop),
            ("poll", running.poll_loop),
        ] {
            if let Err(err) = handle.await {
                tracing::error!(task, error = %err, "door controller loop terminated abnormally");
            }
        }
        tracing::info!("door controller stopped");
    }

    /// Whether the background loops are running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Return the adapter to its canonical state and forget the cached state.
    ///
    /// The next poll tick re-derives the real state. Meant to be called
    /// before [`start`](Self::start) or after [`stop`](Self::stop).
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Adapter`] with
    /// [`AdapterError::Unsupported`] when the adapter cannot be reset.
    pub fn reset(&self) -> Result<(), ControllerError> {
        let mut adapter = self.shared.lock_adapter();
        adapter.reset()?;
        *self.shared.write_state() = DoorState::Unknown;
        self.shared.ready.store(false, Ordering::Release);
        tracing::info!("door controller reset");
        Ok(())
    }

    /// Queue a toggle pulse.
    ///
    /// Waits only while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::NotRunning`] when the controller is stopped
    /// or stops while waiting for room in the queue.
    pub async fn request_toggle(&self) -> Result<(), ControllerError> {
        self.enqueue(Command::Toggle).await
    }

    /// Queue a broadcast of the cached state to every listener.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::NotRunning`] when the controller is stopped.
    pub async fn request_state(&self) -> Result<(), ControllerError> {
        self.enqueue(Command::QueryState).await
    }

    /// The cached door state.
    #[must_use]
    pub fn state(&self) -> DoorState {
        self.shared.current_state()
    }

    /// The cached door state as `"open"`, `"closed"` or `"unknown"`.
    #[must_use]
    pub fn state_str(&self) -> &'static str {
        self.state().as_str()
    }

    /// Whether the sensors have been read at least once since the last
    /// start or reset.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.shared.ready.load(Ordering::Acquire)
    }

    /// Wait until [`is_ready`](Self::is_ready) holds, for at most `timeout`.
    ///
    /// Returns whether the controller became ready in time.
    pub async fn wait_ready(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let step = self.shared.config.poll_interval.min(Duration::from_millis(100));
        while !self.is_ready() {
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(step).await;
        }
        true
    }

    /// Subscribe to state broadcasts.
    ///
    /// The listener is not called on registration; follow up with
    /// [`request_state`](Self::request_state) to get the current state.
    pub fn add_state_listener(&self, listener: impl StateListener + 'static) -> ListenerId {
        let id = self.shared.listeners.add(listener);
        tracing::debug!(%id, "state listener added");
        id
    }

    /// Unsubscribe a listener. Unknown ids are ignored.
    pub fn remove_state_listener(&self, id: ListenerId) {
        if self.shared.listeners.remove(id) {
            tracing::debug!(%id, "state listener removed");
        } else {
            tracing::debug!(%id, "state listener already removed");
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    async fn enqueue(&self, command: Command) -> Result<(), ControllerError> {
        let sender = self
            .commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ControllerError::NotRunning)?;
        sender
            .send(command)
            .await
            .map_err(|_| ControllerError::NotRunning)?;
        tracing::trace!(%command, "door command queued");
        Ok(())
    }

    fn write_commands(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, Option<mpsc::Sender<Command>>> {
        self.commands
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A: DoorAdapter> Shared<A> {
    fn lock_adapter(&self) -> MutexGuard<'_, A> {
        self.adapter.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_state(&self) -> DoorState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, DoorState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Raise the toggle output, wait, lower it, wait.
    ///
    /// The adapter lock is released during both waits so the poll loop keeps
    /// sampling.
    async fn pulse(&self) -> Result<(), AdapterError> {
        let raised = self.lock_adapter().set_toggle(true);
        if let Err(err) = raised {
            let _ = self.lock_adapter().set_toggle(false);
            return Err(err);
        }
        tokio::time::sleep(self.config.settle_delay).await;
        let lowered = self.lock_adapter().set_toggle(false);
        tokio::time::sleep(self.config.settle_delay).await;
        lowered
    }

    /// Sample both sensors and publish the derived state if it changed.
    fn poll_once(&self) -> Result<(), AdapterError> {
        let changed = {
            let mut adapter = self.lock_adapter();
            let open = adapter.read_open_sensor()?;
            let closed = adapter.read_closed_sensor()?;
            let candidate = DoorState::from_sensors(open, closed);

            let mut state = self.write_state();
            let changed = (*state != candidate).then(|| {
                *state = candidate;
                candidate
            });
            self.ready.store(true, Ordering::Release);
            changed
        };

        if let Some(state) = changed {
            tracing::info!(%state, "door state changed");
            self.listeners.broadcast(state);
        }
        Ok(())
    }
}

async fn command_loop<A: DoorAdapter>(
    shared: Arc<Shared<A>>,
    mut commands: mpsc::Receiver<Command>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let command = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            command = commands.recv() => match command {
                Some(command) => command,
                None => break,
            },
        };

        tracing::debug!(%command, "executing door command");
        match command {
            Command::Toggle => {
                if let Err(err) = shared.pulse().await {
                    tracing::warn!(error = %err, "toggle pulse failed");
                }
            }
            Command::QueryState => {
                let state = shared.current_state();
                let delivered = shared.listeners.broadcast(state);
                tracing::debug!(%state, delivered, "state snapshot broadcast");
            }
        }
    }
    tracing::info!("command loop exiting");
}

async fn poll_loop<A: DoorAdapter>(shared: Arc<Shared<A>>, mut shutdown: watch::Receiver<bool>) {
    let mut failing = false;
    loop {
        match shared.poll_once() {
            Ok(()) if failing => {
                failing = false;
                tracing::info!("door sensors readable again");
            }
            Ok(()) => {}
            Err(err) if !failing => {
                failing = true;
                tracing::warn!(error = %err, "failed to read door sensors, keeping previous state");
            }
            Err(err) => tracing::debug!(error = %err, "door sensors still unreadable"),
        }

        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            () = tokio::time::sleep(shared.config.poll_interval) => {}
        }
    }
    tracing::info!("poll loop exiting");
}
