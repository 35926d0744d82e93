pub mod config;
pub mod editor;
pub mod mcp;

use std::sync::Arc;

use config::HostConfig;
use editor::{CommandDispatcher, ConnectionManager};

/// Shared application state passed to every MCP handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<HostConfig>,
    /// The editor bridge. Injected everywhere rather than living in a
    /// process-wide global, so tests can stand up one fake editor per
    /// context.
    pub dispatcher: Arc<CommandDispatcher>,
    pub started_at: std::time::Instant,
}

impl AppContext {
    /// Wire a context from resolved configuration.
    pub fn new(config: HostConfig) -> Self {
        let manager = Arc::new(ConnectionManager::new(
            config.editor_host.clone(),
            config.editor_port,
        ));
        let dispatcher = Arc::new(CommandDispatcher::new(manager, config.timeout));
        Self {
            config: Arc::new(config),
            dispatcher,
            started_at: std::time::Instant::now(),
        }
    }
}
