//! Init command implementation
//!
//! Writes a fresh project manifest with the default repository source and
//! every output format enabled.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use contexture::defaults::MANIFEST_FILENAME;
use contexture::manifest::ProjectManifest;
use contexture::output::OutputConfig;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (defaults to current directory)
    #[arg(long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Overwrite an existing manifest
    #[arg(short, long)]
    pub force: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the init command
pub fn execute(args: InitArgs, output: &OutputConfig) -> Result<()> {
    let dir = match args.dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let path = dir.join(MANIFEST_FILENAME);

    if path.exists() && !args.force {
        anyhow::bail!(
            "Manifest already exists: {}\n\n\
             hint: Use --force to overwrite it",
            path.display()
        );
    }

    std::fs::create_dir_all(&dir)?;
    let manifest = ProjectManifest::default();
    manifest.save(&path)?;

    if !args.quiet {
        println!(
            "{} created {}",
            output.ok_marker(),
            output.dim(&path.display().to_string())
        );
    }
    Ok(())
}
