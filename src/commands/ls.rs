//! Ls command implementation
//!
//! Lists manifest entries with their resolved source and ref, and the
//! state of each output format.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use contexture::output::OutputConfig;
use contexture::rule::rule_id;

/// Arguments for the ls command
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Path to the project manifest
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Emit the manifest contents as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the ls command
pub fn execute(args: LsArgs, output: &OutputConfig) -> Result<()> {
    let (_, manifest) = super::load_manifest(args.config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
        return Ok(());
    }

    if manifest.rules.is_empty() {
        println!("No rules configured.");
    } else {
        println!("Rules:");
        for entry in &manifest.rules {
            match entry.reference() {
                Ok(reference) => println!(
                    "  {} {}",
                    rule_id(&reference.path),
                    output.dim(&format!(
                        "({}, {})",
                        reference.repository_url, reference.r#ref
                    ))
                ),
                Err(_) => println!("  {} {}", entry.rule, output.failed_marker()),
            }
        }
    }

    println!();
    println!("Formats:");
    for format in &manifest.formats {
        let state = if format.enabled { "enabled" } else { "disabled" };
        println!("  {} {}", format.name, output.dim(state));
    }
    Ok(())
}
