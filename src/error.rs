//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `contexture` application. It uses the `thiserror` library to create a
//! comprehensive `Error` enum that covers all anticipated failure modes,
//! providing clear and descriptive error messages.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum that represents all possible errors that can
//!   occur within the application. Each variant corresponds to a specific
//!   type of error and includes contextual information to aid in debugging.
//!
//! - **`ErrorKind`**: A closed classification of failures. The presentation
//!   layer maps kinds to exit codes and user messages; the core only tags
//!   failures with the correct kind and never formats them for a terminal.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`, used
//!   throughout the application to simplify function signatures.

use thiserror::Error;

/// Classification of every failure the core can produce.
///
/// The CLI layer maps each kind to an exit code and display style. Kinds
/// are deliberately coarse: callers react to the kind (retry, fix input,
/// give up), not to individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced rule, manifest entry, or file does not exist.
    NotFound,
    /// User-supplied input (token, flag, variable) is malformed.
    Validation,
    /// A network operation (clone, pull) failed.
    Network,
    /// The project manifest could not be loaded or saved.
    Config,
    /// Rule metadata could not be parsed.
    Format,
    /// A repository checkout is broken or a git command failed locally.
    Repository,
    /// An operation exceeded its deadline.
    Timeout,
    /// The operation was canceled by an explicit signal.
    Canceled,
}

impl ErrorKind {
    /// Whether a caller may reasonably retry the failed operation as-is.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Network | ErrorKind::Timeout)
    }

    /// Exit code the presentation layer uses for this kind.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Validation => 2,
            ErrorKind::NotFound => 3,
            ErrorKind::Network => 4,
            ErrorKind::Config => 5,
            ErrorKind::Format => 6,
            ErrorKind::Repository => 7,
            ErrorKind::Timeout => 8,
            ErrorKind::Canceled => 130,
        }
    }

    /// Stable lowercase name, used in machine-readable result output.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not-found",
            ErrorKind::Validation => "validation",
            ErrorKind::Network => "network",
            ErrorKind::Config => "config",
            ErrorKind::Format => "format",
            ErrorKind::Repository => "repository",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for contexture operations
#[derive(Error, Debug)]
pub enum Error {
    /// A user-supplied rule identifier token could not be parsed.
    ///
    /// Always names the offending token so the user can see exactly what
    /// was rejected.
    #[error("Invalid rule identifier '{token}': {message}")]
    InvalidRuleId { token: String, message: String },

    /// A user-supplied flag value (`--var`, `--data`) is malformed.
    #[error("Invalid flag value '{value}': {message}")]
    InvalidFlagValue { value: String, message: String },

    /// An error occurred while loading or saving the project manifest.
    ///
    /// Includes the specific issue and optionally a hint about how to fix it.
    #[error("Manifest error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Manifest {
        message: String,
        /// Optional hint for how to fix the manifest issue
        hint: Option<String>,
    },

    /// A rule file was not found at its resolved path.
    ///
    /// The repository field is named `repo` because thiserror reserves
    /// `source` for error chaining.
    #[error("Rule not found: {path} (from {repo} @ {r#ref})")]
    RuleNotFound {
        path: String,
        repo: String,
        r#ref: String,
    },

    /// Rule front matter could not be parsed.
    #[error("Invalid rule metadata in {path}: {message}")]
    RuleFormat { path: String, message: String },

    /// An error occurred while cloning a Git repository.
    ///
    /// Includes the repository URL, ref (branch/tag), error message, and an
    /// optional hint for resolution.
    #[error("Git clone error for {url}@{r#ref}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    GitClone {
        url: String,
        r#ref: String,
        message: String,
        /// Optional hint for how to resolve the clone issue
        hint: Option<String>,
    },

    /// A fetch of an existing checkout failed while freshness was required.
    #[error("Git fetch error for {url}@{r#ref}: {message}")]
    GitFetch {
        url: String,
        r#ref: String,
        message: String,
    },

    /// An error occurred while executing a Git command.
    #[error("Git command failed for {url}: {command} - {stderr}")]
    GitCommand {
        command: String,
        url: String,
        stderr: String,
    },

    /// An error occurred with a cache operation.
    #[error("Cache operation error: {message}")]
    Cache { message: String },

    /// An error occurred during rendering.
    #[error("Render error for rule '{rule}' ({format}): {message}")]
    Render {
        rule: String,
        format: String,
        message: String,
    },

    /// An operation exceeded its deadline.
    #[error("Operation timed out: {operation}")]
    Timeout { operation: String },

    /// The operation was canceled before completion.
    #[error("Operation canceled: {operation}")]
    Canceled { operation: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON parsing error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },
}

impl Error {
    /// Classify this error into the closed [`ErrorKind`] set.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidRuleId { .. } | Error::InvalidFlagValue { .. } => ErrorKind::Validation,
            Error::Manifest { .. } | Error::Yaml(_) => ErrorKind::Config,
            Error::RuleNotFound { .. } => ErrorKind::NotFound,
            Error::RuleFormat { .. } | Error::Json(_) | Error::Glob(_) => ErrorKind::Format,
            Error::GitClone { .. } | Error::GitFetch { .. } => ErrorKind::Network,
            Error::GitCommand { .. } => ErrorKind::Repository,
            Error::Cache { .. } | Error::LockPoisoned { .. } => ErrorKind::Repository,
            Error::Render { .. } => ErrorKind::Format,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Canceled { .. } => ErrorKind::Canceled,
            Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            Error::Io(_) => ErrorKind::Repository,
            Error::UrlParse(_) => ErrorKind::Validation,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
