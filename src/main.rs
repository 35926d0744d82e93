use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use marrowd::config::HostConfig;
use marrowd::{mcp, AppContext};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "marrowd",
    about = "Marrow MCP host — drives a running Unity editor over a framed TCP bridge",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Hostname of the editor bridge
    #[arg(long, env = "MARROWD_HOST")]
    host: Option<String>,

    /// TCP port of the editor bridge
    #[arg(long, env = "MARROWD_PORT")]
    port: Option<u16>,

    /// Per-command response timeout in seconds
    #[arg(long, env = "MARROWD_TIMEOUT")]
    timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "MARROWD_LOG")]
    log: Option<String>,

    /// Log output format: "pretty" | "json"
    #[arg(long, env = "MARROWD_LOG_FORMAT")]
    log_format: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "MARROWD_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Path to a config.toml holding the same settings
    #[arg(long, env = "MARROWD_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve MCP over stdio (default when no subcommand given).
    ///
    /// Reads JSON-RPC from stdin and writes responses to stdout; all log
    /// output goes to stderr or the log file.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = HostConfig::new(
        args.config.as_deref(),
        args.host,
        args.port,
        args.timeout,
        args.log,
        args.log_format,
    );
    let _log_guard = init_tracing(&config, args.log_file.as_deref());

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
    }
}

async fn serve(config: HostConfig) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        editor = %config.editor_addr(),
        "marrowd starting up"
    );
    let ctx = Arc::new(AppContext::new(config));

    // Best-effort startup connection; the editor may not be running yet.
    ctx.dispatcher.manager().connect_eager().await;

    let transport = mcp::serve(tokio::io::stdin(), tokio::io::stdout(), ctx.clone());
    tokio::pin!(transport);
    let shutdown = make_shutdown_future();
    tokio::pin!(shutdown);

    tokio::select! {
        res = &mut transport => {
            if let Err(e) = res {
                warn!(err = %e, "mcp transport error");
            }
        }
        _ = &mut shutdown => {
            info!("shutdown signal received");
        }
    }

    // Unconditional teardown. If the process dies before reaching this line
    // the socket still closes — the connection is owned, not global.
    ctx.dispatcher.manager().disconnect().await;
    info!("marrowd shut down");
    Ok(())
}

/// Returns a future that resolves when a shutdown signal is received.
///
/// On Unix we listen for SIGTERM *and* Ctrl-C.
/// On other platforms we listen for Ctrl-C only.
async fn make_shutdown_future() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
}

/// Initialise the tracing subscriber.
///
/// stdout carries the MCP protocol, so console logs go to stderr. With
/// `--log-file`, logs go to a daily-rotated file instead; the returned guard
/// must stay alive for the non-blocking writer to flush.
fn init_tracing(
    config: &HostConfig,
    log_file: Option<&Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "marrowd.log".to_string());
        let appender = tracing_appender::rolling::daily(dir, file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        if config.log_format == "json" {
            tracing_subscriber::registry()
                .with(EnvFilter::new(&config.log))
                .with(fmt::layer().json().with_writer(writer).with_ansi(false))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(&config.log))
                .with(fmt::layer().compact().with_writer(writer).with_ansi(false))
                .init();
        }
        Some(guard)
    } else {
        if config.log_format == "json" {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(EnvFilter::new(&config.log))
                .with_writer(std::io::stderr)
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new(&config.log))
                .with_writer(std::io::stderr)
                .compact()
                .init();
        }
        None
    }
}
