use std::time::Duration;

/// Failures surfaced by the editor bridge, split into the three classes
/// callers need to tell apart.
///
/// `Connection` and `Timeout` tear the underlying socket down before they
/// are returned, so the next call starts from a clean slate. `Command`
/// leaves the socket untouched.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// The editor is unreachable, the socket faulted mid-request, or the
    /// response frame was malformed. The connection has been invalidated.
    #[error("editor connection error: {0}")]
    Connection(String),

    /// No response arrived within the configured window. The connection has
    /// been invalidated — a late reply must not be misattributed to the
    /// next request on the channel.
    #[error("editor did not respond within {0:?}")]
    Timeout(Duration),

    /// The editor itself reported a failure for this command, surfaced
    /// verbatim. The connection stays healthy.
    #[error("{0}")]
    Command(String),
}

impl EditorError {
    /// Whether a caller may blindly retry the command.
    ///
    /// Connection-class failures never reached the editor in a completed
    /// form, so a retry is safe once it is back. A timed-out command may
    /// already have executed, and commands are not idempotent (packing a
    /// pallet twice is two packs) — the caller must decide. Command-class
    /// errors fail the same way again until the inputs change.
    pub fn is_retriable(&self) -> bool {
        matches!(self, EditorError::Connection(_))
    }

    /// Short class label for structured reporting ("connection", "timeout",
    /// "command").
    pub fn class(&self) -> &'static str {
        match self {
            EditorError::Connection(_) => "connection",
            EditorError::Timeout(_) => "timeout",
            EditorError::Command(_) => "command",
        }
    }
}
