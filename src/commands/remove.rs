//! Remove command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use contexture::output::OutputConfig;
use contexture::reference;
use contexture::suggestions;

/// Arguments for the remove command
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Rule identifier: a plain path or '[contexture(<source>):<path>,<ref>]'
    #[arg(value_name = "RULE")]
    pub token: String,

    /// Source repository (URL, owner/repo shorthand, or alias)
    #[arg(long, value_name = "SOURCE")]
    pub source: Option<String>,

    /// Git ref (branch, tag, or commit)
    #[arg(long, value_name = "REF")]
    pub r#ref: Option<String>,

    /// Path to the project manifest
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the remove command
pub fn execute(args: RemoveArgs, output: &OutputConfig) -> Result<()> {
    let (path, mut manifest) = super::load_manifest(args.config)?;

    let reference =
        reference::parse(&args.token, args.source.as_deref(), args.r#ref.as_deref())
            .map_err(|e| suggestions::malformed_rule_token(&args.token, &e.to_string()))?;

    let removed = manifest.remove_rule(&reference)?;
    manifest.save(&path)?;

    if !args.quiet {
        println!("{} removed {}", output.ok_marker(), removed.rule);
    }
    Ok(())
}
