//! State listener port — receivers of door state broadcasts.

use tokio::sync::mpsc;

use garagedoor_domain::door_state::DoorState;

/// Receives the door state whenever it changes or a snapshot is requested.
///
/// Listeners are invoked synchronously from the controller's loops, so an
/// implementation must return quickly and hand any slow work (network I/O)
/// off to its own task.
pub trait StateListener: Send + Sync {
    /// Called with the state being broadcast.
    fn state_changed(&self, state: DoorState);
}

impl<F> StateListener for F
where
    F: Fn(DoorState) + Send + Sync,
{
    fn state_changed(&self, state: DoorState) {
        self(state);
    }
}

/// Listener that forwards every broadcast into an unbounded channel.
///
/// Sending never blocks; once the receiver is dropped, broadcasts are
/// silently discarded until the listener is removed.
pub struct ChannelListener {
    sender: mpsc::UnboundedSender<DoorState>,
}

impl ChannelListener {
    /// Create a listener together with the receiving half of its channel.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DoorState>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl StateListener for ChannelListener {
    fn state_changed(&self, state: DoorState) {
        // fails only once the receiver is gone
        let _ = self.sender.send(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn should_invoke_closure_listener() {
        let seen = Mutex::new(Vec::new());
        let listener = |state: DoorState| seen.lock().unwrap().push(state);
        listener.state_changed(DoorState::Open);
        assert_eq!(*seen.lock().unwrap(), vec![DoorState::Open]);
    }

    #[test]
    fn should_forward_state_into_channel() {
        let (listener, mut rx) = ChannelListener::channel();
        listener.state_changed(DoorState::Closed);
        assert_eq!(rx.try_recv().unwrap(), DoorState::Closed);
    }

    #[test]
    fn should_ignore_dropped_receiver() {
        let (listener, rx) = ChannelListener::channel();
        drop(rx);
        listener.state_changed(DoorState::Unknown);
    }
}
