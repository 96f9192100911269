//! Per-bridge state shared by the event loop and the on-connect tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rumqttc::{AsyncClient, QoS};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use garagedoor_app::controller::DoorController;
use garagedoor_app::ports::DoorAdapter;
use garagedoor_domain::command::Command;
use garagedoor_domain::door_state::DoorState;
use garagedoor_domain::id::ListenerId;

use crate::command;
use crate::error::MqttError;
use crate::topics::Topics;

pub(crate) struct Session<A> {
    controller: Arc<DoorController<A>>,
    client: AsyncClient,
    topics: Topics,
    discovery: Vec<u8>,
    ready_timeout: Duration,
    commands: mpsc::UnboundedSender<Command>,
    closed: AtomicBool,
    listener: Mutex<Option<ListenerId>>,
    connect_task: Mutex<Option<JoinHandle<()>>>,
}

impl<A> Session<A>
where
    A: DoorAdapter + 'static,
{
    pub(crate) fn new(
        controller: Arc<DoorController<A>>,
        client: AsyncClient,
        topics: Topics,
        discovery: Vec<u8>,
        ready_timeout: Duration,
        commands: mpsc::UnboundedSender<Command>,
    ) -> Self {
        Self {
            controller,
            client,
            topics,
            discovery,
            ready_timeout,
            commands,
            closed: AtomicBool::new(false),
            listener: Mutex::new(None),
            connect_task: Mutex::new(None),
        }
    }

    pub(crate) fn client(&self) -> &AsyncClient {
        &self.client
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Run [`on_connected`](Self::on_connected) in the background, replacing
    /// the task of a previous connection if it is still going.
    pub(crate) fn spawn_on_connected(self: &Arc<Self>) {
        let mut slot = lock(&self.connect_task);
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        if self.is_closed() {
            return;
        }
        *slot = Some(tokio::spawn(Arc::clone(self).on_connected()));
    }

    /// The connection dropped: abandon the on-connect work and stop
    /// publishing states until the next ConnAck.
    pub(crate) fn connection_lost(&self) {
        if let Some(task) = lock(&self.connect_task).take() {
            task.abort();
        }
        self.detach_listener();
    }

    /// Final teardown. Nothing registers a listener on the controller after
    /// this returns.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.connection_lost();
    }

    /// Everything that follows a ConnAck: subscribe, publish state, announce.
    pub(crate) async fn on_connected(self: Arc<Self>) {
        match self.subscribe().await {
            Ok(()) => tracing::info!(topic = %self.topics.action, "subscribed to MQTT action topic"),
            Err(err) => tracing::error!(
                topic = %self.topics.action,
                error = %err,
                "failed to subscribe, commands will not be received"
            ),
        }

        if !self.attach_listener() {
            return;
        }
        if !self.controller.wait_ready(self.ready_timeout).await {
            tracing::warn!(
                timeout_secs = self.ready_timeout.as_secs(),
                "door sensors not read yet, publishing initial state anyway"
            );
        }
        if self.is_closed() {
            return;
        }
        if let Err(err) = self.controller.request_state().await {
            tracing::warn!(error = %err, "could not request initial door state");
        }

        match self.announce().await {
            Ok(()) => tracing::info!(topic = %self.topics.config, "published discovery payload"),
            Err(err) => tracing::error!(error = %err, "failed to publish discovery payload"),
        }
    }

    async fn subscribe(&self) -> Result<(), MqttError> {
        self.client
            .subscribe(self.topics.action.as_str(), QoS::AtLeastOnce)
            .await
            .map_err(MqttError::Client)
    }

    async fn announce(&self) -> Result<(), MqttError> {
        self.client
            .publish(
                self.topics.config.as_str(),
                QoS::AtLeastOnce,
                true,
                self.discovery.clone(),
            )
            .await
            .map_err(MqttError::Client)
    }

    /// Register a listener publishing every state, replacing the previous one.
    ///
    /// Returns `false`, registering nothing, once the session is closed.
    pub(crate) fn attach_listener(&self) -> bool {
        let mut slot = lock(&self.listener);
        if let Some(previous) = slot.take() {
            self.controller.remove_state_listener(previous);
        }
        // checked under the slot lock so `close` cannot interleave
        if self.is_closed() {
            return false;
        }

        let client = self.client.clone();
        let topic = self.topics.state.clone();
        let id = self.controller.add_state_listener(move |state: DoorState| {
            match client.try_publish(topic.as_str(), QoS::AtLeastOnce, false, state.as_str()) {
                Ok(()) => tracing::trace!(%state, %topic, "door state queued for MQTT"),
                Err(err) => tracing::error!(%state, error = %err, "failed to publish door state"),
            }
        });
        *slot = Some(id);
        tracing::debug!(%id, topic = %self.topics.state, "MQTT state listener registered");
        true
    }

    /// Unregister the state listener, if any.
    pub(crate) fn detach_listener(&self) {
        if let Some(id) = lock(&self.listener).take() {
            self.controller.remove_state_listener(id);
            tracing::debug!(%id, "MQTT state listener removed");
        }
    }

    /// Hand a message received from the broker to the command forwarder.
    ///
    /// Never waits, so a full controller queue cannot stall the event loop.
    pub(crate) fn handle_publish(&self, topic: &str, payload: &[u8]) {
        if topic != self.topics.action {
            tracing::debug!(topic, "ignoring message on unexpected topic");
            return;
        }
        let Some(command) = command::parse(payload) else {
            tracing::warn!(
                payload = %String::from_utf8_lossy(payload),
                "received unknown MQTT command"
            );
            return;
        };
        if self.commands.send(command).is_err() {
            tracing::debug!(%command, "command forwarder gone, dropping MQTT command");
        }
    }
}

/// Forward MQTT commands to the controller in arrival order.
///
/// Runs apart from the event loop: waiting here for room in the controller
/// queue leaves keep-alives and state publishes flowing.
pub(crate) async fn forward_commands<A>(
    controller: Arc<DoorController<A>>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut shutdown: watch::Receiver<bool>,
) where
    A: DoorAdapter + 'static,
{
    loop {
        let command = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            command = commands.recv() => match command {
                Some(command) => command,
                None => break,
            },
        };

        let result = match command {
            Command::Toggle => controller.request_toggle().await,
            Command::QueryState => controller.request_state().await,
        };
        match result {
            Ok(()) => tracing::trace!(%command, "MQTT command queued"),
            Err(err) => tracing::warn!(%command, error = %err, "MQTT command rejected"),
        }
    }
    tracing::debug!("MQTT command forwarder exiting");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use garagedoor_adapter_virtual::VirtualDoor;
    use garagedoor_app::controller::ControllerConfig;
    use rumqttc::{EventLoop, MqttOptions, Request};

    struct Harness {
        session: Arc<Session<VirtualDoor>>,
        controller: Arc<DoorController<VirtualDoor>>,
        event_loop: EventLoop,
        commands: mpsc::UnboundedReceiver<Command>,
    }

    fn harness_with_capacity(capacity: usize) -> Harness {
        let controller = Arc::new(DoorController::with_config(
            VirtualDoor::default(),
            ControllerConfig {
                poll_interval: Duration::from_millis(5),
                settle_delay: Duration::from_millis(5),
                queue_capacity: 10,
            },
        ));
        let (client, event_loop) =
            AsyncClient::new(MqttOptions::new("test", "localhost", 1883), capacity);
        let (sender, commands) = mpsc::unbounded_channel();
        let session = Session::new(
            Arc::clone(&controller),
            client,
            Topics::new("homeassistant", "garagedoor"),
            b"{}".to_vec(),
            Duration::from_millis(100),
            sender,
        );
        Harness {
            session: Arc::new(session),
            controller,
            event_loop,
            commands,
        }
    }

    fn harness() -> Harness {
        harness_with_capacity(10)
    }

    /// Requests queued on the client but never sent to a broker.
    fn queued_requests(event_loop: &mut EventLoop) -> Vec<Request> {
        event_loop.clean();
        event_loop.pending.drain(..).collect()
    }

    async fn wait_for_state(controller: &DoorController<VirtualDoor>, state: DoorState) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while controller.state() != state {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("door never reached expected state");
    }

    #[tokio::test]
    async fn should_keep_single_listener_across_reconnects() {
        let h = harness();
        assert!(h.session.attach_listener());
        assert!(h.session.attach_listener());
        assert_eq!(h.controller.listener_count(), 1);
    }

    #[tokio::test]
    async fn should_remove_listener_on_detach() {
        let h = harness();
        h.session.attach_listener();
        h.session.detach_listener();
        h.session.detach_listener();
        assert_eq!(h.controller.listener_count(), 0);
    }

    #[tokio::test]
    async fn should_subscribe_then_publish_state_and_discovery_on_connect() {
        let mut h = harness();
        h.controller.start().await.unwrap();
        assert!(h.controller.wait_ready(Duration::from_secs(2)).await);

        Arc::clone(&h.session).on_connected().await;
        assert_eq!(h.controller.listener_count(), 1);
        // the snapshot requested on connect is broadcast by the command loop
        tokio::time::sleep(Duration::from_millis(50)).await;

        let requests = queued_requests(&mut h.event_loop);
        let Some(Request::Subscribe(subscribe)) = requests.first() else {
            panic!("first request should be the subscription, got {requests:?}");
        };
        assert_eq!(subscribe.filters[0].path, "homeassistant/cover/garagedoor/action");

        let publishes: Vec<_> = requests
            .iter()
            .filter_map(|request| match request {
                Request::Publish(publish) => Some(publish),
                _ => None,
            })
            .collect();
        let states: Vec<_> = publishes
            .iter()
            .filter(|publish| publish.topic == "homeassistant/cover/garagedoor/state")
            .collect();
        assert!(!states.is_empty(), "no state published: {requests:?}");
        assert!(states.iter().all(|publish| &publish.payload[..] == b"closed"));

        let discovery = publishes
            .iter()
            .find(|publish| publish.topic == "homeassistant/cover/garagedoor/config")
            .expect("discovery payload should be published");
        assert!(discovery.retain);
        assert_eq!(&discovery.payload[..], b"{}");

        h.controller.stop().await;
    }

    #[tokio::test]
    async fn should_announce_even_when_controller_not_ready() {
        let mut h = harness();

        Arc::clone(&h.session).on_connected().await;

        let requests = queued_requests(&mut h.event_loop);
        assert_eq!(requests.len(), 2, "unexpected requests: {requests:?}");
        assert!(matches!(requests[0], Request::Subscribe(_)));
        assert!(matches!(&requests[1], Request::Publish(p) if p.retain));
    }

    #[tokio::test]
    async fn should_not_attach_listener_after_close() {
        let mut h = harness();
        h.session.close();

        Arc::clone(&h.session).on_connected().await;

        assert_eq!(h.controller.listener_count(), 0);
        let requests = queued_requests(&mut h.event_loop);
        assert!(
            !requests.iter().any(|request| matches!(request, Request::Publish(_))),
            "nothing should be published after close: {requests:?}"
        );
    }

    #[tokio::test]
    async fn should_abandon_pending_connect_work_on_close() {
        let mut h = harness_with_capacity(1);
        // fill the request channel so the subscription waits
        h.session
            .client()
            .try_publish("filler", QoS::AtMostOnce, false, "x")
            .unwrap();

        h.session.spawn_on_connected();
        tokio::time::sleep(Duration::from_millis(20)).await;
        h.session.close();

        // free the channel; an orphaned task would now go on to attach
        queued_requests(&mut h.event_loop);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(h.controller.listener_count(), 0);
        assert!(queued_requests(&mut h.event_loop).is_empty());
    }

    #[tokio::test]
    async fn should_forward_action_message_as_command() {
        let mut h = harness();
        h.session
            .handle_publish("homeassistant/cover/garagedoor/action", b"open");
        h.session
            .handle_publish("homeassistant/cover/garagedoor/action", b"state");
        assert_eq!(h.commands.recv().await, Some(Command::Toggle));
        assert_eq!(h.commands.recv().await, Some(Command::QueryState));
    }

    #[tokio::test]
    async fn should_ignore_messages_on_other_topics() {
        let mut h = harness();
        h.session.handle_publish("somewhere/else", b"toggle");
        assert!(h.commands.try_recv().is_err());
    }

    #[tokio::test]
    async fn should_ignore_unknown_command() {
        let mut h = harness();
        h.session
            .handle_publish("homeassistant/cover/garagedoor/action", b"explode");
        assert!(h.commands.try_recv().is_err());
    }

    #[tokio::test]
    async fn should_toggle_door_through_forwarder() {
        let h = harness();
        let (_shutdown, shutdown_rx) = watch::channel(false);
        let forwarder = tokio::spawn(forward_commands(
            Arc::clone(&h.controller),
            h.commands,
            shutdown_rx,
        ));
        h.controller.start().await.unwrap();
        wait_for_state(&h.controller, DoorState::Closed).await;

        h.session
            .handle_publish("homeassistant/cover/garagedoor/action", b"open");
        wait_for_state(&h.controller, DoorState::Open).await;

        h.controller.stop().await;
        forwarder.abort();
    }

    #[tokio::test]
    async fn should_keep_forwarding_after_rejected_command() {
        let h = harness();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let forwarder = tokio::spawn(forward_commands(
            Arc::clone(&h.controller),
            h.commands,
            shutdown_rx,
        ));

        // rejected with NotRunning, the forwarder carries on
        h.session
            .handle_publish("homeassistant/cover/garagedoor/action", b"toggle");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!forwarder.is_finished());
        assert_eq!(h.controller.state(), DoorState::Unknown);

        shutdown.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), forwarder)
            .await
            .unwrap()
            .unwrap();
    }
}
