use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// panes: run an agent pane in this terminal and manage client settings.
#[derive(Parser, Debug)]
#[command(name = "panes", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Settings file path override.
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Log level override (debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Attach one pane to a backend session.
    Attach {
        /// Session key (defaults to the first configured pane).
        #[arg(short, long)]
        session: Option<String>,

        /// Backend base URL, e.g. `ws://localhost:8000`.
        #[arg(short, long)]
        backend: Option<String>,

        /// Pass stdin through the surface's input path instead of
        /// submitting lines.
        #[arg(long)]
        raw: bool,
    },

    /// List the configured panes.
    Panes,

    /// Read or change stored settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Print one value.
    Get { key: String },
    /// Store a value.
    Set { key: String, value: String },
    /// Delete a value.
    Unset { key: String },
    /// Print every stored key (credentials masked).
    List,
    /// Show or set the display mode flag.
    DarkMode { value: Option<bool> },
}

pub fn parse() -> Args {
    Args::parse()
}
