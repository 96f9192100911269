//! Shared application state for axum handlers.

use std::sync::Arc;

use garagedoor_app::controller::DoorController;
use garagedoor_app::ports::DoorAdapter;

use crate::auth::ApiKeys;

/// Application state shared across all axum handlers.
///
/// Generic over the door adapter to avoid dynamic dispatch. `Clone` is
/// implemented manually so the adapter itself does not need to be `Clone`.
pub struct AppState<A> {
    /// The door controller, shared with the other transports.
    pub controller: Arc<DoorController<A>>,
    /// Accepted API key digests.
    pub api_keys: Arc<ApiKeys>,
}

impl<A> Clone for AppState<A> {
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
            api_keys: Arc::clone(&self.api_keys),
        }
    }
}

impl<A> AppState<A>
where
    A: DoorAdapter + 'static,
{
    /// Create the state from a shared controller and the configured keys.
    pub fn new(controller: Arc<DoorController<A>>, api_keys: ApiKeys) -> Self {
        Self {
            controller,
            api_keys: Arc::new(api_keys),
        }
    }
}
