//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the controller and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod door_adapter;
pub mod state_listener;

pub use door_adapter::DoorAdapter;
pub use state_listener::{ChannelListener, StateListener};
