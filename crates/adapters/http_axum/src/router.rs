//! Axum router assembly.

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use garagedoor_app::ports::DoorAdapter;

use crate::api::{door, health, ws};
use crate::auth::require_api_key;
use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// The probes are public; `/toggle`, `/state` and `/ws` sit behind the
/// API-key middleware. Includes a [`TraceLayer`] that logs each HTTP
/// request/response at the `DEBUG` level.
pub fn build<A>(state: AppState<A>) -> Router
where
    A: DoorAdapter + 'static,
{
    let protected = Router::new()
        .route("/toggle", post(door::toggle::<A>))
        .route("/state", get(door::state::<A>))
        .route("/ws", get(ws::upgrade::<A>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key::<A>,
        ));

    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz::<A>))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
