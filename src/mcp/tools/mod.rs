/// MCP `tools/list` handler — exposes the Marrow authoring tools as MCP tool
/// definitions.
///
/// Each definition follows the JSON Schema convention for `inputSchema`.
/// Clients call `tools/list` to discover the tools, then invoke them via
/// `tools/call` (routed by `mcp::dispatch`). The handlers themselves live in
/// `tools::marrow`.
pub mod marrow;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ─── Tool definition type ─────────────────────────────────────────────────────

/// A single MCP tool definition, as returned in `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl McpToolDef {
    fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

// ─── Tool catalogue ───────────────────────────────────────────────────────────

/// Returns all Marrow tools available via MCP.
///
/// Defined as a function (not a static) because `serde_json::json!` produces
/// a non-`const` `Value`. The list is small and cheap to allocate.
pub fn marrowd_tools() -> Vec<McpToolDef> {
    vec![
        // ── create_pallet ─────────────────────────────────────────────────────
        McpToolDef::new(
            "create_pallet",
            "Create a Marrow pallet with the given name and author. Returns the pallet barcode.",
            json!({
                "type": "object",
                "required": ["pallet_name", "pallet_author"],
                "properties": {
                    "pallet_name": {
                        "type": "string",
                        "description": "Name of the pallet to create."
                    },
                    "pallet_author": {
                        "type": "string",
                        "description": "Author the pallet is attributed to."
                    }
                },
                "additionalProperties": false
            }),
        ),

        // ── create_monodisc ───────────────────────────────────────────────────
        McpToolDef::new(
            "create_monodisc",
            "Create a Marrow MonoDisc datacard from an AudioClip and add it to a pallet. Returns the MonoDisc barcode.",
            json!({
                "type": "object",
                "required": ["pallet_barcode", "name", "audio_path"],
                "properties": {
                    "pallet_barcode": {
                        "type": "string",
                        "description": "Barcode of the pallet the MonoDisc is added to."
                    },
                    "name": {
                        "type": "string",
                        "description": "Name of the MonoDisc."
                    },
                    "audio_path": {
                        "type": "string",
                        "description": "Project-relative path of the AudioClip asset, e.g. 'Assets/Audio/track.wav'."
                    }
                },
                "additionalProperties": false
            }),
        ),

        // ── create_spawnable ──────────────────────────────────────────────────
        McpToolDef::new(
            "create_spawnable",
            "Create a Marrow Spawnable crate from a prefab and add it to a pallet. Returns the Spawnable barcode.",
            json!({
                "type": "object",
                "required": ["pallet_barcode", "name", "prefab_path"],
                "properties": {
                    "pallet_barcode": {
                        "type": "string",
                        "description": "Barcode of the pallet the Spawnable is added to."
                    },
                    "name": {
                        "type": "string",
                        "description": "Name of the Spawnable."
                    },
                    "prefab_path": {
                        "type": "string",
                        "description": "Project-relative path of the prefab asset, e.g. 'Assets/Prefabs/Crate.prefab'."
                    }
                },
                "additionalProperties": false
            }),
        ),

        // ── pack_pallet ───────────────────────────────────────────────────────
        McpToolDef::new(
            "pack_pallet",
            "Pack the given pallet into a Marrow mod. Packing is not idempotent — do not retry a timed-out pack blindly.",
            json!({
                "type": "object",
                "required": ["pallet_barcode"],
                "properties": {
                    "pallet_barcode": {
                        "type": "string",
                        "description": "Barcode of the pallet to pack."
                    }
                },
                "additionalProperties": false
            }),
        ),

        // ── get_pallet_list ───────────────────────────────────────────────────
        McpToolDef::new(
            "get_pallet_list",
            "List the barcodes of all pallets in the open project.",
            json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        ),

        // ── get_pallet_info ───────────────────────────────────────────────────
        McpToolDef::new(
            "get_pallet_info",
            "Get the properties of a specific pallet.",
            json!({
                "type": "object",
                "required": ["pallet_barcode"],
                "properties": {
                    "pallet_barcode": {
                        "type": "string",
                        "description": "Barcode of the pallet to inspect."
                    }
                },
                "additionalProperties": false
            }),
        ),
    ]
}

// ─── tools/list handler ───────────────────────────────────────────────────────

/// Handle a MCP `tools/list` request.
pub fn handle_tools_list() -> Value {
    let tools = marrowd_tools();
    json!({ "tools": tools })
}
