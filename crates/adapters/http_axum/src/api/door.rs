//! Toggle and state endpoints.

use axum::Json;
use axum::extract::State;

use garagedoor_app::ports::DoorAdapter;

use super::{SimpleResponse, StateResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// `POST /toggle` — queue a toggle pulse.
///
/// Answers once the command is queued, not once the door has moved.
///
/// # Errors
///
/// `503` when the controller is stopped.
pub async fn toggle<A>(State(state): State<AppState<A>>) -> Result<Json<SimpleResponse>, ApiError>
where
    A: DoorAdapter + 'static,
{
    state.controller.request_toggle().await?;
    Ok(Json(SimpleResponse::ok()))
}

/// `GET /state` — the cached door state.
pub async fn state<A>(State(state): State<AppState<A>>) -> Json<StateResponse>
where
    A: DoorAdapter + 'static,
{
    Json(StateResponse::ok(state.controller.state()))
}
