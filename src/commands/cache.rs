//! Cache command implementation
//!
//! Inspects and clears the shared repository cache. Clearing is never
//! implicit: `clean` requires an explicit filter.

use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

use contexture::output::OutputConfig;
use contexture::suggestions;

/// Arguments for the cache command
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,

    /// Cache root directory
    #[arg(long, global = true, value_name = "PATH", env = "CONTEXTURE_CACHE")]
    pub cache_root: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show the cache root and its checkouts
    Info,

    /// Remove cached checkouts
    Clean {
        /// Remove every cached checkout
        #[arg(long)]
        all: bool,
    },
}

/// Execute the cache command
pub fn execute(args: CacheArgs, output: &OutputConfig) -> Result<()> {
    let cache = super::cache_store(args.cache_root);

    match args.action {
        CacheAction::Info => {
            println!("Cache root: {}", cache.root().display());
            let entries = cache.entry_paths()?;
            if entries.is_empty() {
                println!("No cached checkouts.");
            } else {
                println!("{} cached checkout(s):", entries.len());
                for entry in entries {
                    let name = entry
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    println!("  {}", output.dim(&name));
                }
            }
            Ok(())
        }
        CacheAction::Clean { all } => {
            if !all {
                return Err(suggestions::cache_clean_no_filter());
            }
            let count = cache.entry_paths()?.len();
            cache.clear_all()?;
            println!("{} removed {count} checkout(s)", output.ok_marker());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_clean_requires_filter() {
        let temp = TempDir::new().unwrap();
        let args = CacheArgs {
            action: CacheAction::Clean { all: false },
            cache_root: Some(temp.path().to_path_buf()),
        };

        let err = execute(args, &OutputConfig::without_color()).unwrap_err();
        assert!(err.to_string().contains("--all"));
    }

    #[test]
    fn test_clean_all_removes_entries() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("cache");
        fs::create_dir_all(root.join("github.com_acme_rules-main")).unwrap();

        let args = CacheArgs {
            action: CacheAction::Clean { all: true },
            cache_root: Some(root.clone()),
        };
        execute(args, &OutputConfig::without_color()).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn test_info_on_empty_cache() {
        let temp = TempDir::new().unwrap();
        let args = CacheArgs {
            action: CacheAction::Info,
            cache_root: Some(temp.path().join("missing")),
        };
        execute(args, &OutputConfig::without_color()).unwrap();
    }
}
