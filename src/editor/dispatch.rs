//! `send_command` — the one entry point every tool handler calls.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::codec::{self, EditorReply};
use super::connection::ConnectionManager;
use super::error::EditorError;

/// Forwards named commands to the editor and normalizes the outcome.
///
/// Logically synchronous: each call returns only after the full round trip
/// completes or definitively fails. Concurrent callers are serialized by the
/// connection lock — the dispatcher keeps no queue and never batches or
/// pipelines.
pub struct CommandDispatcher {
    manager: Arc<ConnectionManager>,
    timeout: Duration,
}

impl CommandDispatcher {
    pub fn new(manager: Arc<ConnectionManager>, timeout: Duration) -> Self {
        Self { manager, timeout }
    }

    /// The connection manager behind this dispatcher (startup and shutdown
    /// hooks go through it).
    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    /// Send one named command and wait for its response.
    ///
    /// Command names are opaque keys in an open namespace; `params` is a
    /// schema-less mapping. Never retries internally: a timed-out or faulted
    /// command may already have executed on the editor side, and commands
    /// are not idempotent.
    pub async fn send_command(
        &self,
        command: &str,
        params: Option<Map<String, Value>>,
    ) -> Result<Value, EditorError> {
        let frame = codec::encode_request(command, params.as_ref());

        let mut guard = self.manager.acquire().await?;
        debug!(command, connection = guard.id(), "sending editor command");

        let outcome = tokio::time::timeout(self.timeout, async {
            guard.write_frame(&frame).await?;
            guard.read_frame().await
        })
        .await;

        let body = match outcome {
            Ok(Ok(body)) => body,
            // Channel fault mid-request; the guard already tore it down.
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                // The channel now holds an unanswered request; a late reply
                // would be misattributed to whoever sends next.
                guard.invalidate("request timed out");
                warn!(command, timeout = ?self.timeout, "editor command timed out");
                return Err(EditorError::Timeout(self.timeout));
            }
        };

        match codec::decode_response(&body) {
            Ok(EditorReply::Success(result)) => Ok(result),
            Ok(EditorReply::Error(message)) => {
                // The editor answered in good order; the channel is fine.
                debug!(command, "editor returned an error payload");
                Err(EditorError::Command(message))
            }
            Err(e) => {
                guard.invalidate("malformed response");
                Err(e)
            }
        }
    }
}
