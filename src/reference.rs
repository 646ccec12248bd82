//! # Rule Identifier Parsing
//!
//! This module converts user-supplied rule identifier tokens into structured
//! [`RuleReference`] values. Two token forms are recognized:
//!
//! 1. **Bracketed form**: `[contexture(<source>):<path>,<ref>]` where
//!    `(<source>)` and `,<ref>` are both optional. The source may be a full
//!    URL, a GitHub `owner/repo` shorthand, or a known alias.
//! 2. **Bare path form**: `path/to/rule`, equivalent to the bracketed form
//!    with no source or ref.
//!
//! Explicit `--source`/`--ref` flags override whatever the token carries:
//! flags win over bracket contents, bracket contents win over defaults.
//!
//! Parsing is pure and side-effect-free; it performs no I/O. Malformed
//! tokens fail with a validation error naming the offending token.

use std::fmt;

use crate::defaults::{DEFAULT_BRANCH, DEFAULT_REPOSITORY_URL, DEFAULT_SOURCE_ALIAS};
use crate::error::{Error, Result};

/// A fully resolved reference to a rule: where it lives and which version.
///
/// Immutable once constructed. The [`fmt::Display`] form is canonical:
/// re-parsing it reproduces an equal `RuleReference`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleReference {
    /// The source alias or shorthand as the user wrote it, when one was
    /// given. `None` when the source was a full URL or absent entirely.
    pub source_alias: Option<String>,
    /// The resolved repository URL.
    pub repository_url: String,
    /// The Git reference (branch, tag, or commit) pinning the content.
    pub r#ref: String,
    /// The rule path within the repository.
    pub path: String,
}

impl RuleReference {
    /// Returns true when this reference points at the default repository.
    pub fn is_default_source(&self) -> bool {
        self.repository_url == DEFAULT_REPOSITORY_URL
    }
}

impl fmt::Display for RuleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[contexture")?;
        if let Some(alias) = &self.source_alias {
            write!(f, "({})", alias)?;
        } else if !self.is_default_source() {
            write!(f, "({})", self.repository_url)?;
        }
        write!(f, ":{}", self.path)?;
        if self.r#ref != DEFAULT_BRANCH {
            write!(f, ",{}", self.r#ref)?;
        }
        write!(f, "]")
    }
}

/// Parse a rule identifier token into a [`RuleReference`].
///
/// `flag_source` and `flag_ref` are the values of the `--source` and
/// `--ref` CLI flags; when present they override the token's own source
/// and ref.
pub fn parse(token: &str, flag_source: Option<&str>, flag_ref: Option<&str>) -> Result<RuleReference> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(invalid(token, "empty token"));
    }

    let (bracket_source, path, bracket_ref) = if trimmed.starts_with('[') {
        parse_bracketed(token, trimmed)?
    } else {
        if trimmed.contains('[') || trimmed.contains(']') {
            return Err(invalid(token, "unbalanced brackets"));
        }
        (None, trimmed.to_string(), None)
    };

    if path.is_empty() {
        return Err(invalid(token, "empty rule path"));
    }
    // A comma in the path would be indistinguishable from the ref
    // separator when the canonical form is re-parsed.
    if path.contains(',') {
        return Err(invalid(token, "rule path must not contain ','"));
    }

    // Flags win over bracket contents; bracket contents win over defaults.
    let source = flag_source
        .map(|s| s.to_string())
        .or(bracket_source);
    let r#ref = flag_ref
        .map(|r| r.to_string())
        .or(bracket_ref)
        .unwrap_or_else(|| DEFAULT_BRANCH.to_string());

    let (source_alias, repository_url) = match source {
        Some(src) => resolve_source(&src),
        None => (None, DEFAULT_REPOSITORY_URL.to_string()),
    };

    Ok(RuleReference {
        source_alias,
        repository_url,
        r#ref,
        path,
    })
}

/// Split a bracketed token into its (source, path, ref) parts.
fn parse_bracketed(
    original: &str,
    trimmed: &str,
) -> Result<(Option<String>, String, Option<String>)> {
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| invalid(original, "unbalanced brackets"))?;

    let rest = inner
        .strip_prefix("contexture")
        .ok_or_else(|| invalid(original, "expected 'contexture' after '['"))?;

    // Optional "(<source>)" segment.
    let (source, rest) = if let Some(after_paren) = rest.strip_prefix('(') {
        let close = after_paren
            .find(')')
            .ok_or_else(|| invalid(original, "unclosed source parenthesis"))?;
        let source = after_paren[..close].trim();
        if source.is_empty() {
            return Err(invalid(original, "empty source"));
        }
        (Some(source.to_string()), &after_paren[close + 1..])
    } else {
        (None, rest)
    };

    let rest = rest
        .strip_prefix(':')
        .ok_or_else(|| invalid(original, "expected ':' before rule path"))?;

    // Optional ",<ref>" suffix after the path.
    let (path, r#ref) = match rest.rsplit_once(',') {
        Some((path, r#ref)) => {
            let r#ref = r#ref.trim();
            if r#ref.is_empty() {
                return Err(invalid(original, "empty ref after ','"));
            }
            (path.trim(), Some(r#ref.to_string()))
        }
        None => (rest.trim(), None),
    };

    Ok((source, path.to_string(), r#ref))
}

/// Resolve a user-written source into `(alias, repository URL)`.
///
/// Accepts full URLs as-is, expands GitHub `owner/repo` shorthand, and maps
/// the well-known `default` alias onto the default repository.
fn resolve_source(source: &str) -> (Option<String>, String) {
    if source == DEFAULT_SOURCE_ALIAS {
        return (Some(source.to_string()), DEFAULT_REPOSITORY_URL.to_string());
    }

    // Full URLs pass through untouched.
    if source.starts_with("https://")
        || source.starts_with("http://")
        || source.starts_with("git@")
        || source.starts_with("ssh://")
        || source.starts_with("file://")
    {
        return (None, source.to_string());
    }

    // GitHub shorthand: owner/repo -> https://github.com/owner/repo
    if source.contains('/') && !source.contains(':') {
        return (
            Some(source.to_string()),
            format!("https://github.com/{}", source),
        );
    }

    (None, source.to_string())
}

fn invalid(token: &str, message: &str) -> Error {
    Error::InvalidRuleId {
        token: token.to_string(),
        message: message.to_string(),
    }
}
