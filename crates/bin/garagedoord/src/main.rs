//! # garagedoord — garage door daemon
//!
//! Composition root that wires the door controller to its adapters.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialise `tracing`
//! - Select the door adapter from the configured mode
//! - Start the door controller and, when enabled, the MQTT bridge
//! - Build the axum router and serve it
//! - Handle graceful shutdown (SIGTERM/SIGINT): MQTT bridge first, then the
//!   HTTP server, then the controller
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod door;

use std::sync::Arc;

use anyhow::Context;
use garagedoor_adapter_http_axum::auth::ApiKeys;
use garagedoor_adapter_http_axum::router;
use garagedoor_adapter_http_axum::state::AppState;
use garagedoor_adapter_mqtt::MqttBridge;
use garagedoor_app::controller::DoorController;
use tracing_subscriber::EnvFilter;

use config::{Config, DEFAULT_LOG_FILTER};
use door::Door;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.logging.filter);
    tracing::info!(mode = %config.mode, "starting garagedoord");

    // Door
    let door = Door::for_mode(config.mode, &config.gpio)
        .context("failed to initialise the door adapter")?;
    let controller = Arc::new(DoorController::with_config(door, config.controller_config()));
    controller.start().await?;

    // MQTT
    let mut bridge = config
        .mqtt
        .enabled
        .then(|| MqttBridge::new(Arc::clone(&controller), config.mqtt.clone()));
    if let Some(bridge) = bridge.as_mut() {
        bridge.start().context("failed to start the MQTT bridge")?;
    }

    // HTTP
    let state = AppState::new(
        Arc::clone(&controller),
        ApiKeys::new(config.api_keys.iter().cloned()),
    );
    let app = router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "garagedoord listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            if let Some(mut bridge) = bridge {
                bridge.stop().await;
            }
        })
        .await;

    controller.stop().await;
    served.context("HTTP server failed")?;
    tracing::info!("garagedoord stopped");
    Ok(())
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter `{filter}` ({err}), using `{DEFAULT_LOG_FILTER}`");
        EnvFilter::new(DEFAULT_LOG_FILTER)
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
