//! Model Context Protocol (MCP) surface for `marrowd`.
//!
//! `marrowd` is an MCP server: it exposes the Marrow authoring tools to MCP
//! clients over stdio and forwards every invocation to the editor bridge.
//!
//! ## Protocol version
//! MCP 2024-11-05.
//!
//! ## Submodules
//!
//! | Module | Role |
//! |--------|------|
//! | `transport` | JSON-RPC wire types, stdio serve loop, lifecycle handlers |
//! | `tools` | `tools/list` response — the 6 Marrow tool definitions |
//! | `tools::marrow` | per-tool handlers: validate args, call the dispatcher |
//! | `dispatch` | `tools/call` dispatcher — routes to `tools::marrow` |
//! | `prompts` | `prompts/list` / `prompts/get` — the authoring guide |

pub mod dispatch;
pub mod prompts;
pub mod tools;
pub mod transport;

// ─── Flat re-exports ──────────────────────────────────────────────────────────

pub use dispatch::handle_tools_call;
pub use tools::{handle_tools_list, marrowd_tools, McpToolDef};
pub use transport::{
    serve, RpcFailure, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND,
    PARSE_ERROR, PROTOCOL_VERSION,
};
