//! # garagedoor-adapter-mqtt
//!
//! MQTT adapter — exposes the door to Home Assistant as an MQTT cover.
//!
//! ## Topics
//!
//! | Topic | Direction | Content |
//! |-------|-----------|---------|
//! | `{prefix}/cover/{object_id}/action` | subscribed | `open`, `close`, `stop`, `toggle`, `state` |
//! | `{prefix}/cover/{object_id}/state` | published | `open`, `closed`, `unknown` |
//! | `{prefix}/cover/{object_id}/config` | published, retained | discovery payload |
//!
//! ## Connection lifecycle
//! - Every ConnAck (first connection and each reconnection) re-subscribes,
//!   replaces the state listener, waits for the first sensor read, requests
//!   a state snapshot and re-publishes the discovery payload.
//! - A lost connection abandons any unfinished on-connect work and removes
//!   the state listener; rumqttc reconnects on the next poll of its event loop.
//! - Incoming commands are forwarded to the controller by a separate task, so
//!   a full command queue never holds up the event loop.
//!
//! ## Dependency rule
//! Same as other adapters: depends on `garagedoor-app` and `garagedoor-domain`.

mod command;
mod config;
mod discovery;
mod error;
mod session;
mod topics;

pub use config::MqttConfig;
pub use discovery::{DiscoveryDevice, DiscoveryPayload};
pub use error::MqttError;
pub use topics::Topics;

use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Outgoing, Packet};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use garagedoor_app::controller::DoorController;
use garagedoor_app::ports::DoorAdapter;

use session::{Session, forward_commands};

/// Capacity of the rumqttc request channel.
const REQUEST_CAPACITY: usize = 10;
/// Pause after a connection error before rumqttc tries again.
const RECONNECT_DELAY: Duration = Duration::from_secs(3);
/// How long [`MqttBridge::stop`] lets the event loop flush the disconnect.
const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

/// Bridge between the door controller and an MQTT broker.
pub struct MqttBridge<A> {
    controller: Arc<DoorController<A>>,
    config: MqttConfig,
    running: Option<Running<A>>,
}

struct Running<A> {
    session: Arc<Session<A>>,
    shutdown: watch::Sender<bool>,
    event_loop: JoinHandle<()>,
    forwarder: JoinHandle<()>,
}

impl<A> MqttBridge<A>
where
    A: DoorAdapter + 'static,
{
    /// Create a stopped bridge.
    pub fn new(controller: Arc<DoorController<A>>, config: MqttConfig) -> Self {
        Self {
            controller,
            config,
            running: None,
        }
    }

    /// Whether [`start`](Self::start) has been called without a matching stop.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Spawn the event loop. The connection itself is established in the
    /// background and retried until [`stop`](Self::stop).
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::AlreadyStarted`] when running, or
    /// [`MqttError::Payload`] if the discovery payload cannot be serialized.
    pub fn start(&mut self) -> Result<(), MqttError> {
        if self.running.is_some() {
            return Err(MqttError::AlreadyStarted);
        }

        let topics = self.config.topics();
        let discovery = serde_json::to_vec(&DiscoveryPayload::new(&topics, &self.config.object_id))
            .map_err(MqttError::Payload)?;
        let options = self.config.mqtt_options();
        tracing::info!(
            broker = %self.config.broker_host,
            port = self.config.broker_port,
            client_id = %options.client_id(),
            "starting MQTT bridge"
        );

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let (commands, command_rx) = mpsc::unbounded_channel();
        let session = Arc::new(Session::new(
            Arc::clone(&self.controller),
            client,
            topics,
            discovery,
            self.config.ready_timeout(),
            commands,
        ));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let forwarder = tokio::spawn(forward_commands(
            Arc::clone(&self.controller),
            command_rx,
            shutdown_rx.clone(),
        ));
        let event_loop = tokio::spawn(run_event_loop(
            Arc::clone(&session),
            event_loop,
            shutdown_rx,
        ));

        self.running = Some(Running {
            session,
            shutdown,
            event_loop,
            forwarder,
        });
        Ok(())
    }

    /// Remove the state listener, disconnect and wait for the background
    /// tasks. No listener is left on the controller once this returns.
    ///
    /// A no-op when not running.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        running.session.close();
        if let Err(err) = running.session.client().try_disconnect() {
            tracing::debug!(error = %err, "could not queue MQTT disconnect");
        }

        let mut event_loop = running.event_loop;
        let joined = if let Ok(joined) = tokio::time::timeout(DISCONNECT_GRACE, &mut event_loop).await {
            joined
        } else {
            let _ = running.shutdown.send(true);
            event_loop.await
        };
        if let Err(err) = joined {
            tracing::error!(error = %err, "MQTT event loop terminated abnormally");
        }
        let _ = running.shutdown.send(true);
        if let Err(err) = running.forwarder.await {
            tracing::error!(error = %err, "MQTT command forwarder terminated abnormally");
        }
        tracing::info!("MQTT bridge stopped");
    }
}

async fn run_event_loop<A>(
    session: Arc<Session<A>>,
    mut event_loop: EventLoop,
    mut shutdown: watch::Receiver<bool>,
) where
    A: DoorAdapter + 'static,
{
    loop {
        let event = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            event = event_loop.poll() => event,
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                tracing::info!(code = ?ack.code, "connected to MQTT broker");
                session.spawn_on_connected();
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                session.handle_publish(&publish.topic, &publish.payload);
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("broker requested disconnect");
                session.connection_lost();
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "MQTT connection error, reconnecting");
                session.connection_lost();
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    () = tokio::time::sleep(RECONNECT_DELAY) => {}
                }
            }
        }
    }
    tracing::info!("MQTT event loop exiting");
}
