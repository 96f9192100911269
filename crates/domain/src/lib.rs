//! # garagedoor-domain
//!
//! Pure domain model for a single sensor-tracked, relay-driven door.
//!
//! ## Responsibilities
//! - Define the logical [`DoorState`](door_state::DoorState) and how it is
//!   derived from the two end-stop sensors
//! - Define the [`Command`](command::Command) intents accepted by the controller
//! - Define [`ListenerId`](id::ListenerId), the handle returned when
//!   subscribing to state changes
//! - Define the error types shared across the workspace
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod command;
pub mod door_state;
pub mod error;
pub mod id;
