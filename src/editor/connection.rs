//! Connection lifecycle for the editor bridge.
//!
//! `ConnectionManager` owns the one TCP session to the editor process. It is
//! demand-driven: nothing dials until a caller needs the channel, there is no
//! background thread or keepalive loop, and a dead connection is only
//! replaced when the next caller asks for one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::codec::{self, FRAME_HEADER_LEN};
use super::error::EditorError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Connection ──────────────────────────────────────────────────────────────

/// One live TCP session to the editor.
///
/// At most one instance exists per manager. An instance that faults is
/// dropped, never repaired — the manager dials a fresh one on the next
/// acquire.
pub struct Connection {
    id: u64,
    stream: TcpStream,
    last_activity: Instant,
}

impl Connection {
    /// Process-unique identifier, distinguishing this instance from any
    /// earlier or later connection to the same endpoint.
    pub fn id(&self) -> u64 {
        self.id
    }

    async fn write_frame(&mut self, frame: &[u8]) -> std::io::Result<()> {
        self.stream.write_all(frame).await?;
        self.stream.flush().await?;
        self.last_activity = Instant::now();
        Ok(())
    }

    async fn read_frame(&mut self) -> Result<Vec<u8>, EditorError> {
        let mut header = [0u8; FRAME_HEADER_LEN];
        self.stream.read_exact(&mut header).await.map_err(io_fault)?;
        let len = codec::frame_len(header)?;
        let mut body = vec![0u8; len];
        self.stream.read_exact(&mut body).await.map_err(io_fault)?;
        self.last_activity = Instant::now();
        Ok(body)
    }

    /// How long ago the channel last carried bytes in either direction.
    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }
}

fn io_fault(e: std::io::Error) -> EditorError {
    EditorError::Connection(format!("editor channel fault: {e}"))
}

// ─── ConnectionManager ───────────────────────────────────────────────────────

/// Owns the single editor connection.
///
/// All access funnels through one async mutex. The caller holding the guard
/// is the only one talking to the socket, which both serializes requests
/// (no pipelining, no interleaved bytes) and collapses racing connect
/// attempts into one — latecomers wait on the lock and find the connection
/// the winner established, or hit the same closed slot and dial themselves
/// if the winner failed.
pub struct ConnectionManager {
    host: String,
    port: u16,
    slot: Mutex<Option<Connection>>,
    next_id: AtomicU64,
}

impl ConnectionManager {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            slot: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// The `host:port` this manager dials.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Exclusive access to the live connection, establishing one if none
    /// exists. Connect failure surfaces a connection-class error and leaves
    /// the slot empty — never a partially-initialized connection.
    pub async fn acquire(&self) -> Result<ConnectionGuard<'_>, EditorError> {
        let mut slot = self.slot.lock().await;
        if slot.is_none() {
            *slot = Some(self.open_connection().await?);
        }
        // Freshly checked above; read the id before handing the slot over.
        let id = slot.as_ref().map(Connection::id).unwrap_or_default();
        Ok(ConnectionGuard { slot, id })
    }

    /// Best-effort startup connect. Failure is logged and swallowed — the
    /// first real command retries from scratch.
    pub async fn connect_eager(&self) {
        match self.acquire().await {
            Ok(_guard) => info!("connected to editor on startup"),
            Err(e) => warn!(err = %e, "could not connect to editor on startup — will retry on first command"),
        }
    }

    /// Mark the current connection dead and close its socket. Idempotent —
    /// calling with no live connection is a no-op.
    pub async fn invalidate(&self, reason: &str) {
        let mut slot = self.slot.lock().await;
        drop_connection(&mut slot, reason);
    }

    /// Explicit teardown at shutdown. A later `acquire` dials fresh — the
    /// manager is never permanently poisoned.
    pub async fn disconnect(&self) {
        let mut slot = self.slot.lock().await;
        if let Some(conn) = slot.take() {
            info!(connection = conn.id, "disconnected from editor");
        }
    }

    async fn open_connection(&self) -> Result<Connection, EditorError> {
        let addr = self.endpoint();
        debug!(addr = %addr, "dialing editor");
        let stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&addr))
            .await
            .map_err(|_| {
                EditorError::Connection(format!(
                    "editor at {addr} did not accept within {CONNECT_TIMEOUT:?}"
                ))
            })?
            .map_err(|e| EditorError::Connection(format!("editor unreachable at {addr}: {e}")))?;
        // One small frame per round trip; don't let Nagle sit on it.
        stream.set_nodelay(true).ok();

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        info!(addr = %addr, connection = id, "editor connection established");
        Ok(Connection {
            id,
            stream,
            last_activity: Instant::now(),
        })
    }
}

fn drop_connection(slot: &mut Option<Connection>, reason: &str) {
    if let Some(conn) = slot.take() {
        warn!(connection = conn.id, reason, "invalidating editor connection");
    }
}

// ─── ConnectionGuard ─────────────────────────────────────────────────────────

/// Exclusive access to the connection for the duration of one request.
///
/// Holding the guard holds the manager's lock, so a second caller's request
/// waits here rather than sharing the channel. Fault paths close the
/// connection under the held lock, before the error propagates — no caller
/// ever observes a half-open channel.
pub struct ConnectionGuard<'a> {
    slot: MutexGuard<'a, Option<Connection>>,
    id: u64,
}

impl ConnectionGuard<'_> {
    /// Identifier of the connection this guard wraps.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Write one request frame. A fault invalidates before returning.
    pub async fn write_frame(&mut self, frame: &[u8]) -> Result<(), EditorError> {
        let conn = match self.slot.as_mut() {
            Some(c) => c,
            None => return Err(already_closed()),
        };
        match conn.write_frame(frame).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let err = io_fault(e);
                self.invalidate("write fault");
                Err(err)
            }
        }
    }

    /// Read one response frame body. A fault (including a corrupt length
    /// prefix) invalidates before returning.
    pub async fn read_frame(&mut self) -> Result<Vec<u8>, EditorError> {
        let conn = match self.slot.as_mut() {
            Some(c) => c,
            None => return Err(already_closed()),
        };
        match conn.read_frame().await {
            Ok(body) => Ok(body),
            Err(e) => {
                self.invalidate("read fault");
                Err(e)
            }
        }
    }

    /// Drop the connection under the held lock. Idempotent.
    pub fn invalidate(&mut self, reason: &str) {
        drop_connection(&mut self.slot, reason);
    }
}

fn already_closed() -> EditorError {
    EditorError::Connection("connection already invalidated".to_string())
}
