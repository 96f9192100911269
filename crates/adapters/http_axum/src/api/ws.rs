//! WebSocket channel: pushes every broadcast state and accepts commands.
//!
//! Outgoing frames are `{"result":"ok","state":...}`. Incoming frames are
//! `{"command":"toggle"}` or `{"command":"state"}`; unknown commands are
//! ignored and a frame that is not valid JSON ends the session.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use serde::Deserialize;

use garagedoor_app::controller::DoorController;
use garagedoor_app::ports::{ChannelListener, DoorAdapter};
use garagedoor_domain::door_state::DoorState;

use super::StateResponse;
use crate::state::AppState;

/// Incoming command frame.
#[derive(Debug, Deserialize)]
pub struct CommandMessage {
    pub command: String,
}

/// `GET /ws` — upgrade to a WebSocket session.
pub async fn upgrade<A>(State(state): State<AppState<A>>, ws: WebSocketUpgrade) -> Response
where
    A: DoorAdapter + 'static,
{
    ws.on_upgrade(move |socket| session(state.controller, socket))
}

async fn session<A>(controller: Arc<DoorController<A>>, mut socket: WebSocket)
where
    A: DoorAdapter + 'static,
{
    let (listener, mut states) = ChannelListener::channel();
    let id = controller.add_state_listener(listener);
    tracing::info!(%id, "websocket client connected");

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let message = match incoming {
                    Some(Ok(message)) => message,
                    Some(Err(err)) => {
                        tracing::warn!(%id, error = %err, "websocket receive failed");
                        break;
                    }
                    None => break,
                };
                match message {
                    Message::Text(text) => {
                        if !dispatch(&controller, text.as_str()).await {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(state) = states.recv() => {
                if let Err(err) = push_state(&mut socket, state).await {
                    tracing::warn!(%id, error = %err, "websocket send failed");
                    break;
                }
            }
        }
    }

    controller.remove_state_listener(id);
    let _ = socket.send(Message::Close(None)).await;
    tracing::info!(%id, "websocket client disconnected");
}

async fn push_state(socket: &mut WebSocket, state: DoorState) -> Result<(), axum::Error> {
    let json = serde_json::to_string(&StateResponse::ok(state)).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}

/// Run one incoming frame. Returns `false` when the session must end.
async fn dispatch<A>(controller: &DoorController<A>, text: &str) -> bool
where
    A: DoorAdapter + 'static,
{
    let message: CommandMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(err) => {
            tracing::error!(error = %err, "malformed websocket message, closing");
            return false;
        }
    };

    let result = match message.command.as_str() {
        "toggle" => controller.request_toggle().await,
        "state" => controller.request_state().await,
        other => {
            tracing::warn!(command = other, "unknown websocket command");
            return true;
        }
    };
    if let Err(err) = result {
        tracing::warn!(command = %message.command, error = %err, "websocket command rejected");
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use garagedoor_adapter_virtual::VirtualDoor;
    use garagedoor_app::controller::ControllerConfig;
    use std::time::Duration;

    fn controller() -> DoorController<VirtualDoor> {
        DoorController::with_config(
            VirtualDoor::default(),
            ControllerConfig {
                poll_interval: Duration::from_millis(5),
                settle_delay: Duration::from_millis(5),
                queue_capacity: 10,
            },
        )
    }

    #[tokio::test]
    async fn should_end_session_on_malformed_json() {
        let controller = controller();
        assert!(!dispatch(&controller, "{not json").await);
    }

    #[tokio::test]
    async fn should_keep_session_on_unknown_command() {
        let controller = controller();
        assert!(dispatch(&controller, r#"{"command":"open_sesame"}"#).await);
    }

    #[tokio::test]
    async fn should_keep_session_when_controller_stopped() {
        let controller = controller();
        assert!(dispatch(&controller, r#"{"command":"toggle"}"#).await);
    }

    #[tokio::test]
    async fn should_toggle_door_from_command() {
        let controller = controller();
        controller.start().await.unwrap();
        assert!(controller.wait_ready(Duration::from_secs(2)).await);

        assert!(dispatch(&controller, r#"{"command":"toggle"}"#).await);
        tokio::time::timeout(Duration::from_secs(2), async {
            while controller.state() != DoorState::Open {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        controller.stop().await;
    }
}
