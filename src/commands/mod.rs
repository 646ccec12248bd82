//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `contexture` command-line tool. Each subcommand is defined in its own
//! file to keep the logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and
//!   options, derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the output
//!   configuration and performs the command's logic.
//!
//! Manifest-reading commands share the lookup logic below: an explicit
//! `--config` path wins, otherwise the well-known manifest locations in the
//! current directory are tried in order.

pub mod add;
pub mod build;
pub mod cache;
pub mod formats;
pub mod init;
pub mod ls;
pub mod remove;
pub mod update;

use std::path::PathBuf;

use anyhow::Result;

use contexture::cache::CacheStore;
use contexture::defaults;
use contexture::manifest::{self, ProjectManifest};
use contexture::suggestions;

/// Resolve the manifest path for a manifest-reading command.
pub(crate) fn manifest_path(config: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = config {
        if !path.exists() {
            anyhow::bail!("Manifest not found: {}", path.display());
        }
        return Ok(path);
    }

    let cwd = std::env::current_dir()?;
    manifest::find_manifest(&cwd).ok_or_else(|| suggestions::manifest_not_found(&cwd))
}

/// Load the manifest for a command; `from_file` validates on read.
pub(crate) fn load_manifest(config: Option<PathBuf>) -> Result<(PathBuf, ProjectManifest)> {
    let path = manifest_path(config)?;
    let manifest = ProjectManifest::from_file(&path)?;
    Ok((path, manifest))
}

/// Build the cache store from `--cache-root`/`CONTEXTURE_CACHE`, falling
/// back to the platform cache directory.
pub(crate) fn cache_store(cache_root: Option<PathBuf>) -> CacheStore {
    CacheStore::new(cache_root.unwrap_or_else(defaults::default_cache_root))
}
