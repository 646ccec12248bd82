//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::commands;
use contexture::output::OutputConfig;

/// Contexture - Resolve and render AI-assistant rules from Git repositories
#[derive(Parser, Debug)]
#[command(name = "contexture")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a fresh project manifest in the current directory
    Init(commands::init::InitArgs),

    /// Add a rule to the project manifest
    Add(commands::add::AddArgs),

    /// Remove a rule from the project manifest
    Remove(commands::remove::RemoveArgs),

    /// List manifest rules and output formats
    Ls(commands::ls::LsArgs),

    /// Render every rule into the enabled output formats
    Build(commands::build::BuildArgs),

    /// Check rules for upstream changes and record them
    Update(commands::update::UpdateArgs),

    /// Show or change the enabled output formats
    Formats(commands::formats::FormatsArgs),

    /// Inspect or clear the repository cache
    Cache(commands::cache::CacheArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let output = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Init(args) => commands::init::execute(args, &output),
            Commands::Add(args) => commands::add::execute(args, &output),
            Commands::Remove(args) => commands::remove::execute(args, &output),
            Commands::Ls(args) => commands::ls::execute(args, &output),
            Commands::Build(args) => commands::build::execute(args, &output),
            Commands::Update(args) => commands::update::execute(args, &output),
            Commands::Formats(args) => commands::formats::execute(args, &output),
            Commands::Cache(args) => commands::cache::execute(args, &output),
        }
    }
}

/// Initialize env_logger from the `--log-level` flag; `RUST_LOG` still
/// wins when set so existing habits keep working.
fn init_logging(level: &str) {
    let filter = match level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Warn,
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(filter);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    let _ = builder.try_init();
}
