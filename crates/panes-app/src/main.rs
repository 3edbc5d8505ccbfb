//! panes: command-line client for agent panes.

mod attach;
mod cli;
mod commands;

use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use panes_config::{resolve_theme_mode, PanesConfig, SettingsStore, TerminalTheme};

use crate::attach::AttachOptions;
use crate::cli::Command;

fn load_settings(path: Option<&std::path::Path>) -> SettingsStore {
    let loaded = match path {
        Some(path) => SettingsStore::load(path),
        None => SettingsStore::load_default(),
    };
    loaded.unwrap_or_else(|e| {
        tracing::warn!("Settings load failed, starting empty: {e}");
        SettingsStore::in_memory()
    })
}

#[tokio::main]
async fn main() {
    let args = cli::parse();

    // Logs go to stderr; stdout belongs to the pane.
    let log_directive = args.log_level.as_deref().unwrap_or("panes_app=info");
    let directive = log_directive
        .parse::<Directive>()
        .or_else(|_| "panes_app=info".parse::<Directive>());
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = directive {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = panes_config::load_config(args.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        PanesConfig::default()
    });
    let mut settings = load_settings(args.settings.as_deref());

    match args.command {
        Command::Attach {
            session,
            backend,
            raw,
        } => {
            let key = match attach::session_key(&config, session.as_deref()) {
                Ok(key) => key,
                Err(e) => {
                    eprintln!("panes: {e}");
                    std::process::exit(2);
                }
            };
            let theme = TerminalTheme::for_mode(resolve_theme_mode(&config, &settings));
            let options = AttachOptions {
                key,
                backend_url: backend.unwrap_or_else(|| config.client.backend_url.clone()),
                raw,
                theme,
            };
            attach::run(&config, options).await;
        }
        Command::Panes => print!("{}", commands::list_panes(&config)),
        Command::Settings { action } => {
            match commands::run_settings(action, &mut settings, &config) {
                Ok(out) if out.ends_with('\n') || out.is_empty() => print!("{out}"),
                Ok(out) => println!("{out}"),
                Err(e) => {
                    eprintln!("panes: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
