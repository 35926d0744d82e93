use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::error;

const DEFAULT_EDITOR_HOST: &str = "localhost";
const DEFAULT_EDITOR_PORT: u16 = 6400;
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_LOG: &str = "info";
const DEFAULT_LOG_FORMAT: &str = "pretty";

// ─── TOML config file ─────────────────────────────────────────────────────────

/// `config.toml` — all fields are optional overrides.
/// Priority: CLI / env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// Hostname the editor bridge listens on (default: "localhost").
    editor_host: Option<String>,
    /// TCP port of the editor bridge (default: 6400).
    editor_port: Option<u16>,
    /// Per-command response timeout in seconds (default: 15).
    timeout_secs: Option<u64>,
    /// Log level filter string, e.g. "debug", "info,marrowd=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default, human-readable) | "json" (structured).
    log_format: Option<String>,
}

fn load_toml(path: &Path) -> Option<TomlConfig> {
    let contents = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── HostConfig ───────────────────────────────────────────────────────────────

/// Resolved host configuration, shared read-only across the process.
///
/// The core consumes these as plain values — the editor bridge takes a host,
/// a port, and a timeout, not a config object.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Hostname of the editor bridge.
    pub editor_host: String,
    /// TCP port of the editor bridge.
    pub editor_port: u16,
    /// How long `send_command` waits for a response before giving up.
    pub timeout: Duration,
    /// Log filter string for `EnvFilter`.
    pub log: String,
    /// "pretty" | "json".
    pub log_format: String,
}

impl HostConfig {
    /// Resolve configuration from CLI-supplied overrides plus an optional
    /// TOML file. Every `None` falls through to the TOML value, then to the
    /// built-in default.
    pub fn new(
        config_file: Option<&Path>,
        host: Option<String>,
        port: Option<u16>,
        timeout_secs: Option<u64>,
        log: Option<String>,
        log_format: Option<String>,
    ) -> Self {
        let toml = config_file.and_then(load_toml).unwrap_or_default();

        Self {
            editor_host: host
                .or(toml.editor_host)
                .unwrap_or_else(|| DEFAULT_EDITOR_HOST.to_string()),
            editor_port: port.or(toml.editor_port).unwrap_or(DEFAULT_EDITOR_PORT),
            timeout: Duration::from_secs(
                timeout_secs.or(toml.timeout_secs).unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            log: log.or(toml.log).unwrap_or_else(|| DEFAULT_LOG.to_string()),
            log_format: log_format
                .or(toml.log_format)
                .unwrap_or_else(|| DEFAULT_LOG_FORMAT.to_string()),
        }
    }

    /// The `host:port` endpoint string of the editor bridge.
    pub fn editor_addr(&self) -> String {
        format!("{}:{}", self.editor_host, self.editor_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn defaults_apply_when_nothing_is_given() {
        let cfg = HostConfig::new(None, None, None, None, None, None);
        assert_eq!(cfg.editor_host, "localhost");
        assert_eq!(cfg.editor_port, 6400);
        assert_eq!(cfg.timeout, Duration::from_secs(15));
        assert_eq!(cfg.log, "info");
        assert_eq!(cfg.log_format, "pretty");
    }

    #[test]
    fn toml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "editor_port = 7777\ntimeout_secs = 3\nlog = \"debug\"").unwrap();

        let cfg = HostConfig::new(Some(&path), None, None, None, None, None);
        assert_eq!(cfg.editor_port, 7777);
        assert_eq!(cfg.timeout, Duration::from_secs(3));
        assert_eq!(cfg.log, "debug");
        // Untouched fields still default.
        assert_eq!(cfg.editor_host, "localhost");
    }

    #[test]
    fn cli_beats_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "editor_port = 7777\n").unwrap();

        let cfg = HostConfig::new(Some(&path), None, Some(9000), None, None, None);
        assert_eq!(cfg.editor_port, 9000);
    }

    #[test]
    fn unparseable_toml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "editor_port = [not toml").unwrap();

        let cfg = HostConfig::new(Some(&path), None, None, None, None, None);
        assert_eq!(cfg.editor_port, 6400);
    }

    #[test]
    fn editor_addr_joins_host_and_port() {
        let cfg = HostConfig::new(None, Some("10.0.0.5".into()), Some(6401), None, None, None);
        assert_eq!(cfg.editor_addr(), "10.0.0.5:6401");
    }
}
