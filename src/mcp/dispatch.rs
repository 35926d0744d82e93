/// MCP `tools/call` dispatcher — routes tool invocations to the marrow
/// handlers.
///
/// The bridge itself treats command names as opaque keys in an open
/// namespace; the catalogue check here only guards the *tool* surface, so a
/// typo'd tool name fails fast instead of reaching the editor.
use serde_json::{json, Value};
use tracing::{info, warn};

use super::tools::{self, marrow};
use super::transport::RpcFailure;
use crate::AppContext;

/// Dispatch a `tools/call` invocation.
///
/// `params` is the JSON-RPC params object: `{"name": ..., "arguments": {...}}`.
pub async fn handle_tools_call(params: Value, ctx: &AppContext) -> Result<Value, RpcFailure> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcFailure::invalid_params("missing required field 'name'"))?;
    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

    // Verify the tool is in our catalogue first.
    let known = tools::marrowd_tools().into_iter().any(|t| t.name == name);
    if !known {
        warn!(tool = name, "mcp unknown tool");
        return Err(RpcFailure::invalid_params(format!("unknown tool: {name}")));
    }

    let result = match name {
        "create_pallet" => marrow::create_pallet(ctx, &arguments).await?,
        "create_monodisc" => marrow::create_monodisc(ctx, &arguments).await?,
        "create_spawnable" => marrow::create_spawnable(ctx, &arguments).await?,
        "pack_pallet" => marrow::pack_pallet(ctx, &arguments).await?,
        "get_pallet_list" => marrow::get_pallet_list(ctx, &arguments).await?,
        "get_pallet_info" => marrow::get_pallet_info(ctx, &arguments).await?,
        other => {
            // Should not reach here — already checked above.
            return Err(RpcFailure::invalid_params(format!("unknown tool: {other}")));
        }
    };

    info!(tool = name, "mcp tool executed");
    Ok(result)
}
