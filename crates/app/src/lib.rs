//! # garagedoor-app
//!
//! Application layer — the door controller and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement:
//!   - `DoorAdapter` — drive the toggle output, read the two end-stop sensors
//!   - `StateListener` — receive door state broadcasts
//! - Provide the `DoorController`: serialized command queue, sensor polling
//!   loop and listener fan-out
//! - Orchestrate domain objects without knowing *how* the hardware works
//!
//! ## Dependency rule
//! Depends on `garagedoor-domain` only (plus `tokio` for tasks and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod controller;
pub mod listeners;
pub mod ports;
