//! Liveness and readiness probes. Neither requires an API key.

use axum::Json;
use axum::extract::State;

use garagedoor_app::ports::DoorAdapter;
use garagedoor_domain::error::ControllerError;

use super::SimpleResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /healthz` — the process is up.
pub async fn healthz() -> Json<SimpleResponse> {
    Json(SimpleResponse {
        result: "OK".to_string(),
    })
}

/// `GET /readyz` — the door controller is running.
///
/// # Errors
///
/// `503` while the controller is stopped.
pub async fn readyz<A>(State(state): State<AppState<A>>) -> Result<Json<SimpleResponse>, ApiError>
where
    A: DoorAdapter + 'static,
{
    if state.controller.is_running() {
        Ok(Json(SimpleResponse {
            result: "OK".to_string(),
        }))
    } else {
        Err(ControllerError::NotRunning.into())
    }
}
