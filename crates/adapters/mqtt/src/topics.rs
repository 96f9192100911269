//! Topic layout of the Home Assistant cover.

/// The three topics of one cover, under `{prefix}/cover/{object_id}/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    /// Commands from Home Assistant (subscribed).
    pub action: String,
    /// Door state updates (published).
    pub state: String,
    /// Discovery payload (published, retained).
    pub config: String,
}

impl Topics {
    #[must_use]
    pub fn new(prefix: &str, object_id: &str) -> Self {
        let base = format!("{prefix}/cover/{object_id}");
        Self {
            action: format!("{base}/action"),
            state: format!("{base}/state"),
            config: format!("{base}/config"),
        }
    }
}
