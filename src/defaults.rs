//! Default values for contexture configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// The default rules repository used when a rule identifier carries no
/// explicit source.
pub const DEFAULT_REPOSITORY_URL: &str = "https://github.com/contexture-dev/rules";

/// The default branch used when a rule identifier carries no explicit ref.
pub const DEFAULT_BRANCH: &str = "main";

/// Well-known alias for the default repository, usable as a source in
/// bracketed rule identifiers.
pub const DEFAULT_SOURCE_ALIAS: &str = "default";

/// The project manifest filename.
pub const MANIFEST_FILENAME: &str = ".contexture.yaml";

/// Candidate manifest locations relative to the project root, checked in
/// order.
pub const MANIFEST_CANDIDATES: &[&str] = &[".contexture.yaml", ".config/.contexture.yaml"];

/// Returns the default cache root directory.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/contexture` (XDG Base Directory)
/// - macOS: `~/Library/Caches/contexture`
/// - Windows: `{FOLDERID_LocalAppData}\contexture`
///
/// Falls back to `.contexture-cache` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `--cache-root` CLI flag or the
/// `CONTEXTURE_CACHE` environment variable.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".contexture-cache"))
        .join("contexture")
}
