//! # garagedoor-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Routes
//!
//! | Method | Path | Auth | Purpose |
//! |--------|------|------|---------|
//! | `GET` | `/healthz` | no | liveness |
//! | `GET` | `/readyz` | no | `503` until the controller runs |
//! | `POST` | `/toggle` | `x-api-key` | queue a toggle pulse |
//! | `GET` | `/state` | `x-api-key` | cached door state |
//! | `GET` | `/ws` | `x-api-key` | state push and commands over WebSocket |
//!
//! Every body is JSON with a `result` field (`"ok"` / `"nok"`).
//!
//! ## Dependency rule
//! Depends on `garagedoor-app` (controller and ports) and `garagedoor-domain`.
//! Never leaks axum types into the domain.

pub mod api;
pub mod auth;
pub mod error;
pub mod router;
pub mod state;
