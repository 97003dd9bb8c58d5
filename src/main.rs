//! Kubernetes MCP server core.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml ─┐
//!   config.d/*.toml ─┼─▶ ConfigLoader ──▶ ReloadCoordinator ──▶ subscribers
//!   MCP_* env ───┤                           ▲      │            ├─ SafetyGate (mode)
//!   CLI flags ───┘          SIGHUP / notify ─┘      │            └─ log filter
//!                           POST /admin/reload      ▼
//!                                             EffectiveConfig
//!
//!   tool call ──▶ ToolDispatcher ──▶ SafetyGate::check ──▶ handler ──▶ StatsCollector
//! ```
//!
//! Tool bodies are registered by the embedding MCP transport; this binary wires
//! up the shared services around an empty registry.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use kube_mcp_gate::admin;
use kube_mcp_gate::config::watcher::ConfigWatcher;
use kube_mcp_gate::config::{CliOverrides, ConfigLoader, ConfigPaths};
use kube_mcp_gate::lifecycle::{signals, ServerContext, Shutdown};
use kube_mcp_gate::observability::{logging, metrics};
use kube_mcp_gate::safety::SafetyMode;
use kube_mcp_gate::ToolRegistry;

#[derive(Parser, Debug)]
#[command(name = "kube-mcp-gate", version)]
#[command(about = "Kubernetes MCP server with a safety gate and live config reload", long_about = None)]
struct Args {
    /// Config file to use instead of the platform default
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ignore MCP_* and related environment variables
    #[arg(long)]
    no_env: bool,

    /// Block every write operation
    #[arg(long, conflicts_with_all = ["disable_destructive", "safety_mode"])]
    read_only: bool,

    /// Block destructive operations, allow other writes
    #[arg(long, conflicts_with = "safety_mode")]
    disable_destructive: bool,

    /// normal, read-only or disable-destructive
    #[arg(long)]
    safety_mode: Option<SafetyMode>,

    #[arg(long)]
    transport: Option<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn cli_mode(&self) -> Option<SafetyMode> {
        if self.read_only {
            Some(SafetyMode::ReadOnly)
        } else if self.disable_destructive {
            Some(SafetyMode::DisableDestructive)
        } else {
            self.safety_mode
        }
    }

    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            transport: self.transport.clone(),
            host: self.host.clone(),
            port: self.port,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let cli_mode = args.cli_mode();

    let loader = ConfigLoader::new(ConfigPaths::standard())
        .with_explicit_path(args.config.clone())
        .skip_env(args.no_env)
        .with_overrides(args.overrides());

    // Logging needs the config, so the first load happens before the subscriber exists.
    let initial = loader.load()?;
    let log_handle = logging::init_logging(&initial)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "kube-mcp-gate starting");

    // The recorder must exist before the gate records its initial mode.
    if initial.metrics.enabled {
        metrics::start_exporter(&initial.metrics);
    }

    let watched = loader.watched_dirs();
    let ctx = ServerContext::bootstrap(loader, cli_mode, ToolRegistry::new())?;
    ctx.reload.register(logging::log_level_subscriber(log_handle));

    let config = ctx.config();

    let shutdown = Shutdown::new();
    ctx.set_reload_signal(signals::spawn_reload_listener(ctx.reload.clone(), shutdown.subscribe()));

    let _watcher = if config.server.watch_config {
        match ConfigWatcher::new(watched, ctx.reload.clone()).run() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(error = %e, "Config watcher not started");
                None
            }
        }
    } else {
        None
    };

    let admin_task = if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        Some(tokio::spawn(admin::serve(ctx.clone(), listener, shutdown.subscribe())))
    } else {
        None
    };

    tracing::info!(
        safety_mode = %ctx.gate.mode(),
        transport = %config.server.transport,
        reload = ctx.reload_signal().describe(),
        "Server ready"
    );

    signals::wait_for_shutdown_signal().await;
    shutdown.trigger();

    if let Some(task) = admin_task {
        match task.await {
            Ok(Err(e)) => tracing::error!(error = %e, "Admin API stopped with error"),
            Err(e) => tracing::error!(error = %e, "Admin API task failed"),
            Ok(Ok(())) => {}
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
