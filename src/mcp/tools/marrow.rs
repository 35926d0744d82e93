//! Marrow tool handlers.
//!
//! Each handler is a thin adapter: it validates its own expected argument
//! shape (the bridge is schema-less by design, so validation happens here at
//! the boundary), builds the command's parameter mapping, and forwards
//! through `CommandDispatcher::send_command`.
//!
//! Editor outcomes — success payloads and all three error classes — come
//! back as MCP tool results rather than JSON-RPC errors, so clients always
//! see a structured result for a well-formed call.

use serde_json::{json, Map, Value};

use crate::editor::EditorError;
use crate::mcp::transport::RpcFailure;
use crate::AppContext;

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `create_pallet` — create a Marrow pallet, returning its barcode.
pub async fn create_pallet(ctx: &AppContext, args: &Value) -> Result<Value, RpcFailure> {
    let pallet_name = require_str(args, "pallet_name")?;
    let pallet_author = require_str(args, "pallet_author")?;

    let mut params = Map::new();
    params.insert("pallet_name".into(), json!(pallet_name));
    params.insert("pallet_author".into(), json!(pallet_author));
    run(ctx, "MARROW_CREATE_PALLET", Some(params)).await
}

/// `create_monodisc` — a MonoDisc datacard is a scannable of type `MONODISC`
/// wrapping an AudioClip.
pub async fn create_monodisc(ctx: &AppContext, args: &Value) -> Result<Value, RpcFailure> {
    let pallet_barcode = require_str(args, "pallet_barcode")?;
    let name = require_str(args, "name")?;
    let audio_path = require_str(args, "audio_path")?;

    let mut params = Map::new();
    params.insert("pallet_barcode".into(), json!(pallet_barcode));
    params.insert("name".into(), json!(name));
    params.insert("type".into(), json!("MONODISC"));
    params.insert("asset_path".into(), json!(audio_path));
    run(ctx, "MARROW_CREATE_SCANNABLE", Some(params)).await
}

/// `create_spawnable` — a Spawnable crate is a scannable of type `SPAWNABLE`
/// wrapping a prefab.
pub async fn create_spawnable(ctx: &AppContext, args: &Value) -> Result<Value, RpcFailure> {
    let pallet_barcode = require_str(args, "pallet_barcode")?;
    let name = require_str(args, "name")?;
    let prefab_path = require_str(args, "prefab_path")?;

    let mut params = Map::new();
    params.insert("pallet_barcode".into(), json!(pallet_barcode));
    params.insert("name".into(), json!(name));
    params.insert("type".into(), json!("SPAWNABLE"));
    params.insert("asset_path".into(), json!(prefab_path));
    run(ctx, "MARROW_CREATE_SCANNABLE", Some(params)).await
}

/// `pack_pallet` — pack a pallet into a distributable mod.
pub async fn pack_pallet(ctx: &AppContext, args: &Value) -> Result<Value, RpcFailure> {
    let pallet_barcode = require_str(args, "pallet_barcode")?;

    let mut params = Map::new();
    params.insert("pallet_barcode".into(), json!(pallet_barcode));
    run(ctx, "MARROW_PACK_PALLET", Some(params)).await
}

/// `get_pallet_list` — barcodes of every pallet in the project.
pub async fn get_pallet_list(ctx: &AppContext, _args: &Value) -> Result<Value, RpcFailure> {
    run(ctx, "MARROW_GET_PALLETS", None).await
}

/// `get_pallet_info` — properties of one pallet.
pub async fn get_pallet_info(ctx: &AppContext, args: &Value) -> Result<Value, RpcFailure> {
    let pallet_barcode = require_str(args, "pallet_barcode")?;

    let mut params = Map::new();
    params.insert("pallet_barcode".into(), json!(pallet_barcode));
    run(ctx, "MARROW_GET_PALLET_INFO", Some(params)).await
}

// ─── Shared plumbing ─────────────────────────────────────────────────────────

fn require_str<'a>(args: &'a Value, field: &str) -> Result<&'a str, RpcFailure> {
    args.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            RpcFailure::invalid_params(format!("missing required string field '{field}'"))
        })
}

/// Forward one command to the editor and shape the outcome as a tool result.
///
/// A malformed *call* (bad arguments, unknown tool) is a JSON-RPC error; a
/// failed *command* is a tool result with `isError: true` so the caller can
/// read the error class and decide about retries itself.
async fn run(
    ctx: &AppContext,
    command: &str,
    params: Option<Map<String, Value>>,
) -> Result<Value, RpcFailure> {
    match ctx.dispatcher.send_command(command, params).await {
        Ok(result) => Ok(success_result(&result)),
        Err(e) => Ok(failure_result(&e)),
    }
}

fn success_result(result: &Value) -> Value {
    // Editor payloads are opaque; hand them to the client as text.
    let text = match result {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": false
    })
}

fn failure_result(err: &EditorError) -> Value {
    json!({
        "content": [{ "type": "text", "text": err.to_string() }],
        "isError": true,
        "_meta": {
            "errorClass": err.class(),
            "retriable": err.is_retriable()
        }
    })
}
