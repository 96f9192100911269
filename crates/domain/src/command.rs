//! Command — an intent queued for the door controller.

/// An intent executed by the controller's command loop, one at a time.
///
/// Commands describe *what* the caller wants, not how the hardware is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Pulse the toggle output once.
    Toggle,
    /// Re-broadcast the cached state to every listener.
    QueryState,
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Toggle => f.write_str("toggle"),
            Self::QueryState => f.write_str("query_state"),
        }
    }
}
