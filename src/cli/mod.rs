use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::App;
use crate::catalog::SystemClock;
use crate::config::{ConfigLoader, CONFIG_ENV};

pub mod commands;

use self::commands::{PresetsArgs, RangeArgs};

#[derive(Parser, Debug)]
#[command(
    name = "rangepick",
    version,
    about = "Pick a date range from presets or a calendar"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over RANGEPICK_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive picker (default)
    Tui,
    /// List every preset with its range for the current time
    Presets(PresetsArgs),
    /// Print the range for a single preset key
    Range(RangeArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var(CONFIG_ENV, path);
    }

    init_tracing(&cli.log_level)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;
    let loader = ConfigLoader::discover()?;
    let config = Arc::new(loader.load_or_init()?);
    tracing::debug!(path = %loader.paths().config_file.display(), "configuration loaded");

    let command = cli.command.unwrap_or(Commands::Tui);
    match command {
        Commands::Tui => {
            let mut app = App::new(config, Box::new(SystemClock));
            commands::run_tui(&mut app)
        }
        Commands::Presets(args) => commands::list_presets(&SystemClock, args),
        Commands::Range(args) => commands::show_range(&SystemClock, args),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
