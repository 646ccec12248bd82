//! Formats command implementation
//!
//! Shows and mutates the enabled output formats. Disabling is refused when
//! it would leave no format enabled.

use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

use contexture::error::Error;
use contexture::manifest::FormatName;
use contexture::output::OutputConfig;
use contexture::suggestions;

/// Arguments for the formats command
#[derive(Args, Debug)]
pub struct FormatsArgs {
    #[command(subcommand)]
    pub action: FormatsAction,

    /// Path to the project manifest
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum FormatsAction {
    /// List formats and whether each is enabled
    List,

    /// Enable an output format
    Enable {
        /// Format name (cursor, claude, copilot)
        name: String,
    },

    /// Disable an output format
    Disable {
        /// Format name (cursor, claude, copilot)
        name: String,
    },
}

/// Execute the formats command
pub fn execute(args: FormatsArgs, output: &OutputConfig) -> Result<()> {
    let (path, mut manifest) = super::load_manifest(args.config)?;

    match args.action {
        FormatsAction::List => {
            for format in &manifest.formats {
                let state = if format.enabled { "enabled" } else { "disabled" };
                println!("{} {}", format.name, output.dim(state));
            }
            Ok(())
        }
        FormatsAction::Enable { name } => {
            let format = parse_format(&name)?;
            manifest.set_format_enabled(format, true)?;
            manifest.save(&path)?;
            println!("{} enabled {}", output.ok_marker(), format);
            Ok(())
        }
        FormatsAction::Disable { name } => {
            let format = parse_format(&name)?;
            manifest.set_format_enabled(format, false)?;
            manifest.save(&path)?;
            println!("{} disabled {}", output.ok_marker(), format);
            Ok(())
        }
    }
}

fn parse_format(name: &str) -> Result<FormatName> {
    FormatName::from_str(name).map_err(|e| match e {
        Error::InvalidFlagValue { .. } => suggestions::unknown_format(name),
        other => other.into(),
    })
}
