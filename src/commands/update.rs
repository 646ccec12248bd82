//! Update command implementation
//!
//! Checks every manifest rule against its upstream repository and, after
//! confirmation, records the new fingerprints. `--dry-run` reports without
//! touching the manifest; a declined prompt leaves every change pending.

use anyhow::Result;
use clap::Args;
use dialoguer::Confirm;
use std::path::PathBuf;

use contexture::output::OutputConfig;
use contexture::update::{self, UpdateStatus};

/// Arguments for the update command
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Report changes without modifying the manifest
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Apply changes without prompting
    #[arg(short, long)]
    pub yes: bool,

    /// Emit the check reports as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to the project manifest
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Cache root directory
    #[arg(long, value_name = "PATH", env = "CONTEXTURE_CACHE")]
    pub cache_root: Option<PathBuf>,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the update command
pub fn execute(args: UpdateArgs, output: &OutputConfig) -> Result<()> {
    let (path, mut manifest) = super::load_manifest(args.config)?;
    let cache = super::cache_store(args.cache_root);

    let reports = update::check_updates(&manifest, &cache, manifest.update.offline_fallback)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else if !args.quiet {
        for report in &reports {
            match &report.status {
                UpdateStatus::Unchanged => {
                    println!("{} {}", output.dim("unchanged"), report.rule)
                }
                UpdateStatus::Changed { .. } => {
                    println!("{} {}", output.changed_marker(), report.rule)
                }
                UpdateStatus::Failed { message, .. } => {
                    println!("{} {}: {}", output.failed_marker(), report.rule, message)
                }
            }
        }
    }

    let changed = reports.iter().filter(|r| r.is_changed()).count();
    if changed == 0 || args.dry_run {
        if !args.quiet && !args.json {
            let suffix = if args.dry_run && changed > 0 {
                " (dry run, nothing recorded)"
            } else {
                ""
            };
            println!("{changed} rule(s) changed{suffix}");
        }
        return Ok(());
    }

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Record {changed} changed rule(s)?"))
            .default(false)
            .interact()?;
        if !confirmed {
            if !args.quiet {
                println!("Skipped; changes stay pending.");
            }
            return Ok(());
        }
    }

    let applied = update::apply(&mut manifest, &reports);
    manifest.save(&path)?;

    if !args.quiet && !args.json {
        println!(
            "{} recorded {applied} update(s); run 'contexture build' to refresh outputs",
            output.ok_marker()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contexture::manifest::ProjectManifest;
    use tempfile::TempDir;

    #[test]
    fn test_dry_run_on_empty_manifest() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".contexture.yaml");
        ProjectManifest::default().save(&path).unwrap();

        let args = UpdateArgs {
            dry_run: true,
            yes: false,
            json: false,
            config: Some(path.clone()),
            cache_root: Some(temp.path().join("cache")),
            quiet: true,
        };
        execute(args, &OutputConfig::without_color()).unwrap();

        // Nothing recorded.
        let manifest = ProjectManifest::from_file(&path).unwrap();
        assert!(manifest.rules.is_empty());
    }
}
