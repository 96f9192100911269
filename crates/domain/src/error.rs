//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into these at the
//! port boundary via `From`.

/// Errors reported by a physical door adapter.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// Reading or driving a line failed (bus fault, GPIO unavailable, …).
    #[error("door I/O failure")]
    Io(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The adapter does not implement the requested operation.
    #[error("operation `{0}` is not supported by this adapter")]
    Unsupported(&'static str),
}

/// Errors returned by the door controller's public operations.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The controller is stopped; the command was not queued.
    #[error("door controller is not running")]
    NotRunning,

    /// `start` was called on a controller that is already running.
    #[error("door controller is already running")]
    AlreadyRunning,

    /// The adapter rejected the operation.
    #[error("door adapter error")]
    Adapter(#[from] AdapterError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_unsupported_operation() {
        let err = AdapterError::Unsupported("reset");
        assert_eq!(
            err.to_string(),
            "operation `reset` is not supported by this adapter"
        );
    }

    #[test]
    fn should_keep_io_source() {
        let io = std::io::Error::other("bus fault");
        let err = AdapterError::Io(Box::new(io));
        assert_eq!(err.to_string(), "door I/O failure");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "bus fault");
    }

    #[test]
    fn should_display_not_running_error() {
        assert_eq!(
            ControllerError::NotRunning.to_string(),
            "door controller is not running"
        );
    }

    #[test]
    fn should_convert_adapter_error_into_controller_error() {
        let err: ControllerError = AdapterError::Unsupported("reset").into();
        assert!(matches!(
            err,
            ControllerError::Adapter(AdapterError::Unsupported("reset"))
        ));
    }
}
