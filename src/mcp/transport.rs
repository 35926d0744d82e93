//! JSON-RPC 2.0 plumbing for the MCP surface.
//!
//! MCP clients talk to `marrowd` over stdio: one JSON object per line in
//! each direction. Protocol version 2024-11-05. The serve loop is generic
//! over its byte streams so tests can drive it through in-memory pipes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::debug;

use crate::AppContext;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

// ─── JSON-RPC 2.0 types ──────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RpcRequest {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

#[derive(Serialize)]
struct RpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Serialize)]
struct RpcError {
    code: i32,
    message: String,
}

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// A failed method call, carrying the JSON-RPC error code to report.
///
/// Handlers return this instead of throwing, so every call site has to say
/// what a failure maps to on the wire.
#[derive(Debug)]
pub struct RpcFailure {
    pub code: i32,
    pub message: String,
}

impl RpcFailure {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }
}

// ─── Serve loop ──────────────────────────────────────────────────────────────

/// Run the MCP serve loop until the peer closes its end.
///
/// `main` passes stdin/stdout; tests pass the halves of a duplex pipe.
pub async fn serve<R, W>(reader: R, mut writer: W, ctx: Arc<AppContext>) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = dispatch_line(&line, &ctx).await {
            writer.write_all(response.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }
    debug!("mcp client closed the stream");
    Ok(())
}

/// Handle one incoming JSON-RPC line. Returns `None` for notifications —
/// they get no response, even on failure.
pub(crate) async fn dispatch_line(text: &str, ctx: &AppContext) -> Option<String> {
    let req: RpcRequest = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(_) => return Some(error_response(Value::Null, PARSE_ERROR, "Parse error")),
    };

    if req.jsonrpc != "2.0" {
        return Some(error_response(
            req.id.unwrap_or(Value::Null),
            INVALID_REQUEST,
            "Invalid Request",
        ));
    }

    let is_notification = req.id.is_none();
    let id = req.id.unwrap_or(Value::Null);
    let params = req.params.unwrap_or(Value::Null);

    debug!(method = %req.method, "mcp dispatch");

    let result = match req.method.as_str() {
        "initialize" => Ok(handle_initialize(&params)),
        "notifications/initialized" | "initialized" => {
            debug!("mcp client initialized");
            return None;
        }
        "ping" => Ok(json!({})),
        "tools/list" => Ok(super::tools::handle_tools_list()),
        "tools/call" => super::dispatch::handle_tools_call(params, ctx).await,
        "prompts/list" => Ok(super::prompts::handle_prompts_list()),
        "prompts/get" => super::prompts::handle_prompts_get(&params),
        other => Err(RpcFailure::new(
            METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
        )),
    };

    if is_notification {
        return None;
    }

    Some(match result {
        Ok(value) => ok_response(id, value),
        Err(f) => error_response(id, f.code, &f.message),
    })
}

fn handle_initialize(params: &Value) -> Value {
    let client = params
        .get("clientInfo")
        .and_then(|c| c.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    debug!(client, "mcp initialize");

    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {},
            "prompts": {}
        },
        "serverInfo": {
            "name": "marrowd",
            "version": env!("CARGO_PKG_VERSION")
        },
        "instructions": "Drives a running Unity editor: Marrow pallet and crate authoring over the editor bridge."
    })
}

fn ok_response(id: Value, result: Value) -> String {
    let resp = RpcResponse {
        jsonrpc: "2.0",
        id,
        result: Some(result),
        error: None,
    };
    serde_json::to_string(&resp).unwrap_or_default()
}

fn error_response(id: Value, code: i32, message: &str) -> String {
    let resp = RpcResponse {
        jsonrpc: "2.0",
        id,
        result: None,
        error: Some(RpcError {
            code,
            message: message.to_string(),
        }),
    };
    serde_json::to_string(&resp).unwrap_or_default()
}
