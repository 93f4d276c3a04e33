//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod batch;
mod generate;
mod session;
mod stats;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::loader::CliOverrides;
use crate::output::MAX_SCALE;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Charagen - Generate layered pixel-art characters with rarity grades
#[derive(Parser)]
#[command(name = "charagen")]
#[command(about = "Charagen - Generate layered pixel-art characters with rarity grades")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Use this config file instead of searching for charagen.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Seed the random generator for reproducible output
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate one character and write it as a PNG
    Generate {
        /// Output file (default: <out>/character_<timestamp>.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Generate many characters as individual PNGs in a new directory
    Batch {
        /// Number of characters to generate
        count: usize,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Generate a grid of characters as a single PNG
    Tile {
        /// Number of columns
        cols: u32,

        /// Number of rows
        rows: u32,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Show or reset generation statistics
    Stats {
        /// Clear all counters
        #[arg(long)]
        reset: bool,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,

        /// Stats file (default from config)
        #[arg(long)]
        stats: Option<PathBuf>,
    },
}

/// Flags shared by every command that renders characters
#[derive(Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// Integer upscale factor, 1-64 (default: 10)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_SCALE as i64))]
    pub scale: Option<u32>,

    /// Background color as hex, e.g. "#f8f9fa"
    #[arg(long = "bg")]
    pub background: Option<String>,

    /// Render onto a transparent background
    #[arg(short, long)]
    pub transparent: bool,

    /// Leave out layers whose image is missing instead of failing
    #[arg(long)]
    pub skip_missing: bool,

    /// Do not update the stats file
    #[arg(long)]
    pub no_stats: bool,

    /// Resource descriptor JSON
    #[arg(long)]
    pub resources: Option<PathBuf>,

    /// Root directory of the part images
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Output directory
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Stats file
    #[arg(long)]
    pub stats: Option<PathBuf>,
}

impl RenderArgs {
    pub(crate) fn overrides(&self) -> CliOverrides {
        CliOverrides {
            scale: self.scale,
            background: self.background.clone(),
            transparent: self.transparent.then_some(true),
            resources: self.resources.clone(),
            assets: self.assets.clone(),
            out: self.out.clone(),
            stats: self.stats.clone(),
        }
    }
}

/// Global options passed to every command
pub(crate) struct GlobalOpts {
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("charagen={level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let global = GlobalOpts {
        config: cli.config,
        seed: cli.seed,
    };

    match cli.command {
        Commands::Generate { output, json, render } => {
            generate::run_generate(&global, &render, output.as_deref(), json)
        }
        Commands::Batch { count, render } => batch::run_batch(&global, &render, count),
        Commands::Tile { cols, rows, render } => batch::run_tile(&global, &render, cols, rows),
        Commands::Stats { reset, json, stats } => stats::run_stats(&global, stats.as_deref(), reset, json),
    }
}
