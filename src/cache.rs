//! # On-Disk Repository Cache
//!
//! This module owns the local checkouts that rule resolution reads from. A
//! `(repository URL, ref)` pair maps to a stable, human-readable directory
//! under the cache root, cloning on miss and optionally pulling on hit.
//!
//! ## Design
//!
//! - **Deterministic keys**: `cache_key` normalizes SSH and HTTPS forms of
//!   the same repository to the same `host_owner_repo-ref` key, so a repo
//!   referenced both ways shares one checkout.
//! - **Availability over freshness on warm entries**: a failed pull on a
//!   valid entry logs a warning and returns the existing checkout. A failed
//!   clone on a cold key is fatal for that reference and leaves no residue.
//! - **Per-key serialization**: concurrent `ensure` calls for the same key
//!   take a per-key mutex, so simultaneous builds never race to clone into
//!   the same path while distinct keys proceed in parallel.
//! - **Injectable root**: the cache root is a constructor argument (exposed
//!   as `--cache-root` / `CONTEXTURE_CACHE` at the CLI), so tests run
//!   against isolated, ephemeral roots.
//!
//! Git operations sit behind the [`GitOperations`] trait so tests can mock
//! clone and pull behavior without touching the network.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::warn;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Clones a repository at a specific Git reference (branch, tag, or
    /// commit) into `target_dir`. Expected to be a shallow clone.
    fn clone_at_ref(&self, url: &str, ref_name: &str, target_dir: &Path) -> Result<()>;

    /// Updates an existing checkout to the latest state of `ref_name`,
    /// restricted to that single ref.
    fn update_checkout(&self, url: &str, ref_name: &str, checkout_dir: &Path) -> Result<()>;

    /// Whether `dir` contains a working checkout.
    fn is_checkout(&self, dir: &Path) -> bool;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command to perform real Git operations.
pub struct DefaultGitOperations;

impl GitOperations for DefaultGitOperations {
    fn clone_at_ref(&self, url: &str, ref_name: &str, target_dir: &Path) -> Result<()> {
        crate::git::clone_at_ref(url, ref_name, target_dir)
    }

    fn update_checkout(&self, url: &str, ref_name: &str, checkout_dir: &Path) -> Result<()> {
        crate::git::update_checkout(url, ref_name, checkout_dir)
    }

    fn is_checkout(&self, dir: &Path) -> bool {
        crate::git::is_checkout(dir)
    }
}

/// Compute the cache key for a `(repository URL, ref)` pair.
///
/// The key is deterministic, human-readable, and filesystem-safe, shaped
/// as `host_owner_repo-ref`. SSH (`git@host:owner/repo.git`) and HTTPS
/// (`https://host/owner/repo.git`) spellings of the same repository
/// normalize to the same key.
///
/// Sanitization is lossy (`feature/x` and `feature_x` both read
/// `feature_x`), so whenever it altered a segment or the ref, a short
/// digest of the unsanitized parts is appended to keep distinct inputs
/// on distinct keys.
pub fn cache_key(repository_url: &str, ref_name: &str) -> String {
    let (host, path) = split_repo_url(repository_url);

    let mut altered = false;
    let mut segments: Vec<String> = Vec::new();
    if !host.is_empty() {
        let clean = sanitize_segment(&host);
        altered |= clean != host;
        segments.push(clean);
    }
    for part in path.split('/') {
        let part = part.trim_end_matches(".git");
        if !part.is_empty() {
            let clean = sanitize_segment(part);
            altered |= clean != part;
            segments.push(clean);
        }
    }

    let clean_ref = sanitize_segment(ref_name);
    altered |= clean_ref != ref_name;

    let mut key = format!("{}-{}", segments.join("_"), clean_ref);
    if altered {
        // Hash the normalized-but-unsanitized parts, so the SSH and HTTPS
        // spellings of one repository still share a key.
        let mut hasher = Sha256::new();
        for part in [host.as_str(), path.trim_end_matches(".git"), ref_name] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        let digest = format!("{:x}", hasher.finalize());
        key.push('-');
        key.push_str(&digest[..8]);
    }
    key
}

/// Split a repository URL into `(host, path)`, covering SSH scp-like
/// syntax, scheme URLs, and bare paths.
fn split_repo_url(repository_url: &str) -> (String, String) {
    // scp-like SSH syntax: git@host:owner/repo.git
    if let Some(rest) = repository_url.strip_prefix("git@") {
        if let Some((host, path)) = rest.split_once(':') {
            return (host.to_string(), path.to_string());
        }
        return (rest.to_string(), String::new());
    }

    // Scheme URLs: https://, ssh://, git://, file://
    if let Ok(parsed) = url::Url::parse(repository_url) {
        if parsed.has_host() || parsed.scheme() == "file" {
            let host = parsed.host_str().unwrap_or_default().to_string();
            let path = parsed.path().trim_start_matches('/').to_string();
            return (host, path);
        }
    }

    (String::new(), repository_url.to_string())
}

/// Replace characters that are unsafe in directory names.
fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| match c {
            c if c.is_alphanumeric() || c == '.' || c == '-' => c,
            _ => '_',
        })
        .collect()
}

/// On-disk cache of repository checkouts, keyed by `(URL, ref)`.
pub struct CacheStore {
    root: PathBuf,
    git_ops: Box<dyn GitOperations>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CacheStore {
    /// Creates a cache store rooted at `root`, using the system git binary.
    pub fn new(root: PathBuf) -> Self {
        Self::with_git_ops(root, Box::new(DefaultGitOperations))
    }

    /// Creates a cache store with custom git operations, used by tests to
    /// mock clone/pull behavior.
    pub fn with_git_ops(root: PathBuf, git_ops: Box<dyn GitOperations>) -> Self {
        Self {
            root,
            git_ops,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensure a local checkout exists for `(repository_url, ref_name)` and
    /// return its path.
    ///
    /// With `update` set, a valid entry is pulled first; a pull failure
    /// degrades to the existing checkout with a warning. A cold miss clones;
    /// a clone failure removes any partial directory and propagates.
    pub fn ensure(&self, repository_url: &str, ref_name: &str, update: bool) -> Result<PathBuf> {
        let key = cache_key(repository_url, ref_name);
        let entry = self.root.join(&key);

        let lock = self.key_lock(&key)?;
        let _guard = lock.lock().map_err(|_| Error::LockPoisoned {
            context: format!("cache key {}", key),
        })?;

        if self.git_ops.is_checkout(&entry) {
            if update {
                if let Err(e) = self.git_ops.update_checkout(repository_url, ref_name, &entry) {
                    warn!(
                        "pull failed for {}@{}, using cached checkout: {}",
                        repository_url, ref_name, e
                    );
                }
            }
            return Ok(entry);
        }

        // Cold miss: create-if-absent is concurrency-safe across distinct keys.
        fs::create_dir_all(&self.root)?;

        if let Err(e) = self.git_ops.clone_at_ref(repository_url, ref_name, &entry) {
            // A partial clone must not survive to be mistaken for valid.
            if entry.exists() {
                let _ = fs::remove_dir_all(&entry);
            }
            return Err(e);
        }

        Ok(entry)
    }

    /// Ensure a checkout with a pull failure treated as fatal.
    ///
    /// Used by the update resolver when the manifest disables the
    /// stale-fallback behavior: a valid entry whose pull fails produces a
    /// network error instead of the cached path.
    pub fn ensure_fresh(&self, repository_url: &str, ref_name: &str) -> Result<PathBuf> {
        let key = cache_key(repository_url, ref_name);
        let entry = self.root.join(&key);

        let lock = self.key_lock(&key)?;
        let _guard = lock.lock().map_err(|_| Error::LockPoisoned {
            context: format!("cache key {}", key),
        })?;

        if self.git_ops.is_checkout(&entry) {
            self.git_ops
                .update_checkout(repository_url, ref_name, &entry)
                .map_err(|e| Error::GitFetch {
                    url: repository_url.to_string(),
                    r#ref: ref_name.to_string(),
                    message: e.to_string(),
                })?;
            return Ok(entry);
        }

        fs::create_dir_all(&self.root)?;
        if let Err(e) = self.git_ops.clone_at_ref(repository_url, ref_name, &entry) {
            if entry.exists() {
                let _ = fs::remove_dir_all(&entry);
            }
            return Err(e);
        }

        Ok(entry)
    }

    /// Paths of all current cache entries, sorted for stable display.
    pub fn entry_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut entries: Vec<PathBuf> = fs::read_dir(&self.root)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        entries.sort();
        Ok(entries)
    }

    /// Remove every cache entry. There is no automatic eviction; this is
    /// the manual control the `cache clean` command exposes.
    pub fn clear_all(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }

    fn key_lock(&self, key: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self.locks.lock().map_err(|_| Error::LockPoisoned {
            context: "cache lock table".to_string(),
        })?;
        Ok(Arc::clone(
            locks.entry(key.to_string()).or_default(),
        ))
    }
}
