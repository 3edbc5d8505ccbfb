//! panes-agent: HTTP sidecar that runs an agent CLI per request.

mod execute;

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use panes_config::PanesConfig;

#[derive(Parser)]
#[command(name = "panes-agent", about = "Agent execution sidecar (POST /execute)")]
struct Args {
    /// Config file (defaults to the platform config directory).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding `[execute] port`.
    #[arg(short, long)]
    port: Option<u16>,

    /// Agent program, overriding `[execute] program`.
    #[arg(long)]
    program: Option<String>,

    /// Log filter directive, e.g. `panes_agent=debug`.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_directive = args.log_level.as_deref().unwrap_or("panes_agent=info");
    let directive = log_directive
        .parse::<Directive>()
        .or_else(|_| "panes_agent=info".parse::<Directive>());
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = directive {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match panes_config::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            PanesConfig::default()
        }
    }
    .execute;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(program) = args.program {
        config.program = program;
    }

    let addr = config.bind_addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "failed to bind TCP listener");
            std::process::exit(1);
        }
    };

    tracing::info!(program = %config.program, "agent sidecar ready on {}", addr);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    if let Err(e) = axum::serve(listener, execute::router(config))
        .with_graceful_shutdown(shutdown)
        .await
    {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
