//! Integration tests for the editor bridge.
//! Spins up a fake editor on an OS-assigned port and exercises the dispatcher
//! round trip, fault handling, timeout policy, and reconnect behavior.

use std::sync::Arc;
use std::time::{Duration, Instant};

use marrowd::editor::{codec, CommandDispatcher, ConnectionManager, EditorError};
use serde_json::{json, Map, Value};
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tokio::net::{TcpListener, TcpStream};

// ─── Fake editor helpers ─────────────────────────────────────────────────────

async fn read_request(stream: &mut TcpStream) -> Value {
    let mut header = [0u8; codec::FRAME_HEADER_LEN];
    stream.read_exact(&mut header).await.unwrap();
    let len = u32::from_be_bytes(header) as usize;
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn write_reply(stream: &mut TcpStream, body: Value) {
    let bytes = body.to_string().into_bytes();
    stream
        .write_all(&(bytes.len() as u32).to_be_bytes())
        .await
        .unwrap();
    stream.write_all(&bytes).await.unwrap();
    stream.flush().await.unwrap();
}

async fn start_listener() -> (TcpListener, Arc<ConnectionManager>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let manager = Arc::new(ConnectionManager::new(addr.ip().to_string(), addr.port()));
    (listener, manager)
}

fn params(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Split a raw byte log back into frame bodies; panics on any malformed or
/// partial frame.
fn split_frames(mut log: &[u8]) -> Vec<Value> {
    let mut frames = Vec::new();
    while !log.is_empty() {
        assert!(log.len() >= codec::FRAME_HEADER_LEN, "dangling frame header");
        let len = u32::from_be_bytes(log[..codec::FRAME_HEADER_LEN].try_into().unwrap()) as usize;
        let rest = &log[codec::FRAME_HEADER_LEN..];
        assert!(rest.len() >= len, "dangling frame body");
        frames.push(serde_json::from_slice(&rest[..len]).unwrap());
        log = &rest[len..];
    }
    frames
}

// ─── Round trip ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn send_command_round_trips_nested_params() {
    let (listener, manager) = start_listener().await;
    let dispatcher = CommandDispatcher::new(manager, Duration::from_secs(5));

    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let req = read_request(&mut sock).await;
        assert_eq!(req["type"], "MARROW_CREATE_PALLET");
        write_reply(
            &mut sock,
            json!({"status": "success", "result": {"echo": req["params"]}}),
        )
        .await;
    });

    let sent = json!({
        "pallet_name": "MyMod",
        "pallet_author": "someone",
        "nested": {"tags": ["a", "b"], "count": 3, "ratio": 0.5, "flag": true, "none": null}
    });
    let result = dispatcher
        .send_command("MARROW_CREATE_PALLET", params(sent.clone()))
        .await
        .unwrap();
    assert_eq!(result["echo"], sent);
}

// ─── Error passthrough ───────────────────────────────────────────────────────

#[tokio::test]
async fn editor_error_payload_is_command_class_and_connection_survives() {
    let (listener, manager) = start_listener().await;
    let dispatcher = CommandDispatcher::new(manager.clone(), Duration::from_secs(5));

    // One accepted socket serves both requests; a reconnect would stall the
    // second call and fail the test.
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let _ = read_request(&mut sock).await;
        write_reply(&mut sock, json!({"status": "error", "message": "not found"})).await;
        let _ = read_request(&mut sock).await;
        write_reply(&mut sock, json!({"status": "success", "result": "ok"})).await;
    });

    let err = dispatcher
        .send_command("GET_X", params(json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, EditorError::Command(_)));
    assert!(err.to_string().contains("not found"));
    assert!(!err.is_retriable());

    // The channel stayed healthy — the follow-up reuses the same connection.
    let result = dispatcher.send_command("GET_Y", None).await.unwrap();
    assert_eq!(result, json!("ok"));
    assert_eq!(manager.acquire().await.unwrap().id(), 1);
}

// ─── Timeout ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn timeout_is_bounded_and_forces_a_reconnect() {
    let (listener, manager) = start_listener().await;
    let dispatcher = CommandDispatcher::new(manager, Duration::from_secs(1));

    tokio::spawn(async move {
        let (mut s1, _) = listener.accept().await.unwrap();
        let _ = read_request(&mut s1).await;
        // Never reply; keep the socket open so only the timeout can fire.
        let (mut s2, _) = listener.accept().await.unwrap();
        let _ = read_request(&mut s2).await;
        write_reply(&mut s2, json!({"status": "success", "result": "pong"})).await;
        drop(s1);
    });

    let start = Instant::now();
    let err = dispatcher.send_command("X", params(json!({}))).await.unwrap_err();
    let elapsed = start.elapsed();
    assert!(matches!(err, EditorError::Timeout(_)));
    assert!(
        elapsed >= Duration::from_millis(900) && elapsed <= Duration::from_millis(1500),
        "timeout fired after {elapsed:?}"
    );

    // The stalled channel was invalidated; the next call dials fresh.
    let result = dispatcher.send_command("PING", None).await.unwrap();
    assert_eq!(result, json!("pong"));
}

// ─── Mid-request I/O fault ───────────────────────────────────────────────────

#[tokio::test]
async fn io_fault_invalidates_and_next_acquire_is_a_new_connection() {
    let (listener, manager) = start_listener().await;
    let dispatcher = CommandDispatcher::new(manager.clone(), Duration::from_secs(5));

    tokio::spawn(async move {
        let (mut s1, _) = listener.accept().await.unwrap();
        let _ = read_request(&mut s1).await;
        drop(s1); // hang up instead of replying
        let (mut s2, _) = listener.accept().await.unwrap();
        let _ = read_request(&mut s2).await;
        write_reply(&mut s2, json!({"status": "success", "result": 1})).await;
    });

    let err = dispatcher.send_command("X", None).await.unwrap_err();
    assert!(matches!(err, EditorError::Connection(_)));
    assert!(err.is_retriable());

    // A brand-new connection instance, not the faulted one.
    let guard = manager.acquire().await.unwrap();
    assert_eq!(guard.id(), 2);
    drop(guard);

    let result = dispatcher.send_command("Y", None).await.unwrap();
    assert_eq!(result, json!(1));
}

// ─── Serialization under concurrency ─────────────────────────────────────────

#[tokio::test]
async fn concurrent_callers_never_interleave_bytes() {
    const CALLERS: usize = 4;

    let (listener, manager) = start_listener().await;
    let dispatcher = Arc::new(CommandDispatcher::new(manager, Duration::from_secs(5)));

    // The fake editor reads arbitrary chunks (not frame-at-a-time) and keeps
    // the raw byte log, so interleaved writes would corrupt the stream and
    // fail the frame scan below.
    let server = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut log: Vec<u8> = Vec::new();
        let mut consumed = 0usize;
        let mut replied = 0usize;
        while replied < CALLERS {
            let mut buf = [0u8; 4096];
            let n = sock.read(&mut buf).await.unwrap();
            assert!(n > 0, "editor saw EOF before all requests arrived");
            log.extend_from_slice(&buf[..n]);

            // Answer every complete frame sitting in the buffer.
            loop {
                let pending = &log[consumed..];
                if pending.len() < codec::FRAME_HEADER_LEN {
                    break;
                }
                let len =
                    u32::from_be_bytes(pending[..codec::FRAME_HEADER_LEN].try_into().unwrap())
                        as usize;
                if pending.len() < codec::FRAME_HEADER_LEN + len {
                    break;
                }
                let body: Value =
                    serde_json::from_slice(&pending[codec::FRAME_HEADER_LEN..][..len]).unwrap();
                consumed += codec::FRAME_HEADER_LEN + len;
                write_reply(
                    &mut sock,
                    json!({"status": "success", "result": {"echo": body["type"]}}),
                )
                .await;
                replied += 1;
            }
        }
        log
    });

    let mut handles = Vec::new();
    for i in 0..CALLERS {
        let dispatcher = dispatcher.clone();
        handles.push(tokio::spawn(async move {
            let command = format!("CMD_{i}");
            let result = dispatcher
                .send_command(&command, params(json!({"caller": i})))
                .await
                .unwrap();
            assert_eq!(result["echo"], json!(command));
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // The transport's raw byte log re-parses as exactly CALLERS well-formed
    // frames in some serial order.
    let log = server.await.unwrap();
    let frames = split_frames(&log);
    assert_eq!(frames.len(), CALLERS);
    for frame in &frames {
        assert!(frame["type"].as_str().unwrap().starts_with("CMD_"));
    }
}

// ─── Explicit disconnect ─────────────────────────────────────────────────────

#[tokio::test]
async fn disconnect_is_not_permanent() {
    let (listener, manager) = start_listener().await;
    let dispatcher = CommandDispatcher::new(manager.clone(), Duration::from_secs(5));

    tokio::spawn(async move {
        for _ in 0..2 {
            let (mut sock, _) = listener.accept().await.unwrap();
            let _ = read_request(&mut sock).await;
            write_reply(&mut sock, json!({"status": "success", "result": "ok"})).await;
        }
    });

    dispatcher.send_command("A", None).await.unwrap();
    manager.disconnect().await;

    // acquire after disconnect dials a fresh connection on demand.
    let result = dispatcher.send_command("B", None).await.unwrap();
    assert_eq!(result, json!("ok"));
    assert_eq!(manager.acquire().await.unwrap().id(), 2);
}

// ─── Startup with no editor ──────────────────────────────────────────────────

#[tokio::test]
async fn unreachable_editor_at_startup_is_nonfatal() {
    // Reserve a port, then close it so the eager connect is refused.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let manager = Arc::new(ConnectionManager::new(addr.ip().to_string(), addr.port()));
    // Logs a warning and returns; must not abort or poison the manager.
    manager.connect_eager().await;

    // The editor comes up later on the same endpoint.
    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let _ = read_request(&mut sock).await;
        write_reply(&mut sock, json!({"status": "success", "result": "up"})).await;
    });

    let dispatcher = CommandDispatcher::new(manager, Duration::from_secs(5));
    let result = dispatcher.send_command("PING", None).await.unwrap();
    assert_eq!(result, json!("up"));
}

// ─── Invalidate idempotence ──────────────────────────────────────────────────

#[tokio::test]
async fn invalidate_is_idempotent() {
    let (listener, manager) = start_listener().await;

    tokio::spawn(async move {
        let (_sock, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let guard = manager.acquire().await.unwrap();
    assert_eq!(guard.id(), 1);
    drop(guard);

    manager.invalidate("test teardown").await;
    manager.invalidate("test teardown, again").await;

    // Nothing live; acquire dials fresh.
    let guard = manager.acquire().await.unwrap();
    assert_eq!(guard.id(), 2);
}
