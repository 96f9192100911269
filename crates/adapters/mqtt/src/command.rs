//! Mapping of action-topic payloads to door commands.

use garagedoor_domain::command::Command;

/// Parse a payload received on the action topic.
///
/// The door has a single relay, so `open`, `close`, `stop` and `toggle` all
/// pulse it. Returns `None` for anything else.
#[must_use]
pub fn parse(payload: &[u8]) -> Option<Command> {
    match std::str::from_utf8(payload).ok()?.trim() {
        "open" | "close" | "stop" | "toggle" => Some(Command::Toggle),
        "state" => Some(Command::QueryState),
        _ => None,
    }
}
