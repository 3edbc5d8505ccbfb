//! panes-server: WebSocket backend for agent panes.
//!
//! Serves a PTY shell per session key on `/ws-shell/{key}` and line-oriented
//! agent sessions on `/ws/{agent}`. Payloads are raw text in both directions.

mod agent;
mod agent_store;
mod connection;
mod pty;
mod shell;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use panes_config::schema::AgentMode;
use panes_config::PanesConfig;

use crate::agent_store::AgentStore;
use crate::connection::{handle_connection, ServerContext};
use crate::shell::ShellStore;

const REAPER_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "panes-server", about = "WebSocket backend for agent panes")]
struct Args {
    /// Config file (defaults to the platform config directory).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface to bind, overriding `[server] host`.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overriding `[server] port`.
    #[arg(short, long)]
    port: Option<u16>,

    /// Log filter directive, e.g. `panes_server=debug`.
    #[arg(long)]
    log_level: Option<String>,
}

fn load_config(path: Option<&std::path::Path>) -> PanesConfig {
    match panes_config::load_config(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            PanesConfig::default()
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_directive = args.log_level.as_deref().unwrap_or("panes_server=info");
    let directive = log_directive
        .parse::<Directive>()
        .or_else(|_| "panes_server=info".parse::<Directive>());
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = directive {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = load_config(args.config.as_deref());
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let capacity = config.server.output_capacity as usize;
    let store = ShellStore::new(config.shell.clone(), capacity);
    let agent_processes = AgentStore::new(config.agents.command.clone(), capacity);
    let ctx = ServerContext {
        shells: store.clone(),
        agents: Arc::new(config.agents.clone()),
        agent_processes: agent_processes.clone(),
        allowed_agents: config.server.allowed_agents.clone().into(),
        http: reqwest::Client::new(),
    };

    let addr = config.server.bind_addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "failed to bind TCP listener");
            std::process::exit(1);
        }
    };

    tracing::info!("panes-server v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);

    if config.agents.mode == AgentMode::Local {
        let started = agent_processes.start_all(&config.server.allowed_agents).await;
        tracing::info!(started, "local agents started");
    }

    // Idle shell reaper.
    let reaper_store = store.clone();
    let ttl = Duration::from_secs(u64::from(config.server.session_ttl_secs));
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(REAPER_INTERVAL).await;
            let reaped = reaper_store.reap_idle(ttl).await;
            let count = reaper_store.count().await;
            tracing::debug!(reaped, sessions = count, "Reaper tick");
        }
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    tokio::pin!(ctrl_c);

    // Accept loop.
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tokio::spawn(handle_connection(
                        stream,
                        peer,
                        ctx.clone(),
                        shutdown_rx.clone(),
                    ));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "TCP accept error");
                }
            },

            _ = &mut ctrl_c => break,
        }
    }

    tracing::info!("shutting down");
    let _ = shutdown_tx.send(true);
    store.kill_all().await;
    agent_processes.kill_all().await;
    // Let connection tasks flush their close frames and reap agent children.
    tokio::time::sleep(Duration::from_millis(200)).await;
}
