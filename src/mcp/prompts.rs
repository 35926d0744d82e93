//! MCP prompts — the Marrow authoring guide.

use serde_json::{json, Value};

use super::transport::RpcFailure;

const ASSET_CREATION_STRATEGY: &str = "\
Marrow authoring workflow:

1. **Start with a pallet**
   - `create_pallet(pallet_name, pallet_author)` — every mod lives in a pallet.
   - Keep the returned barcode; all later calls take it.

2. **Fill the pallet**
   - `create_spawnable(pallet_barcode, name, prefab_path)` — wrap a prefab in a Spawnable crate.
   - `create_monodisc(pallet_barcode, name, audio_path)` — wrap an AudioClip in a MonoDisc datacard.
   - Use project-relative asset paths (e.g. 'Assets/Prefabs/Crate.prefab').

3. **Pack**
   - `pack_pallet(pallet_barcode)` — packs the pallet into a distributable mod.
   - Packing is not idempotent: if a pack times out, check the editor before packing again.

4. **Verify**
   - `get_pallet_list()` — barcodes of every pallet in the project.
   - `get_pallet_info(pallet_barcode)` — properties of one pallet.

Pallets, crates, and datacards are all identified by barcode. Use meaningful
names — barcodes are derived from them and cannot be changed later.";

/// Handle a MCP `prompts/list` request.
pub fn handle_prompts_list() -> Value {
    json!({
        "prompts": [
            {
                "name": "asset_creation_strategy",
                "description": "Guide for authoring Marrow pallets and crates in the Unity editor."
            }
        ]
    })
}

/// Handle a MCP `prompts/get` request.
pub fn handle_prompts_get(params: &Value) -> Result<Value, RpcFailure> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcFailure::invalid_params("missing required field 'name'"))?;

    if name != "asset_creation_strategy" {
        return Err(RpcFailure::invalid_params(format!("unknown prompt: {name}")));
    }

    Ok(json!({
        "description": "Guide for authoring Marrow pallets and crates in the Unity editor.",
        "messages": [
            {
                "role": "user",
                "content": { "type": "text", "text": ASSET_CREATION_STRATEGY }
            }
        ]
    }))
}
