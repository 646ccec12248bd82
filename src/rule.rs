//! # Rule Model and Loading
//!
//! A rule is a markdown document with optional YAML front matter, sourced
//! from a path inside a cached repository checkout. This module defines the
//! [`Rule`] record and the loader that produces it.
//!
//! The loader stamps `id`, `source`, `ref` and `file_path` from the
//! resolution inputs rather than the document itself, so display and
//! re-resolution always reflect where the content actually came from. A
//! missing file is a not-found error; malformed front matter is a format
//! error. The two are distinct kinds so callers can react differently
//! (retry versus fix-and-retry).
//!
//! A loaded `Rule` is never mutated; a re-fetch produces a new one.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::reference::RuleReference;
use crate::variables::VarMap;

/// When and how a rendered rule is surfaced to the target assistant.
///
/// Carried through to rendering untouched; each output format maps it onto
/// its own activation mechanism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trigger {
    /// Always active in the assistant context.
    Always,
    /// Only activated when the user explicitly invokes the rule.
    Manual,
    /// The assistant model decides based on the rule description.
    Model,
    /// Active when files matching the patterns are in scope.
    Glob {
        #[serde(rename = "globs")]
        patterns: Vec<String>,
    },
}

/// Front matter metadata as written in the rule document.
#[derive(Debug, Clone, Default, Deserialize)]
struct RuleMetadata {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    frameworks: Vec<String>,
    #[serde(default)]
    languages: Vec<String>,
    #[serde(default)]
    trigger: Option<Trigger>,
    #[serde(default)]
    variables: VarMap,
}

/// A resolved, parsed rule document.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Stable identifier derived from the rule path.
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub frameworks: Vec<String>,
    pub languages: Vec<String>,
    /// Repository URL the content was loaded from.
    pub source: String,
    /// Git ref the content was loaded at.
    pub r#ref: String,
    /// File path of the document inside the checkout.
    pub file_path: PathBuf,
    pub trigger: Option<Trigger>,
    /// Default variables declared by the document, the lowest-precedence
    /// source during variable resolution.
    pub default_variables: VarMap,
    /// Markdown body, without front matter.
    pub body: String,
}

/// Derive a rule id from its repository path.
///
/// `go/testing.md` becomes `go-testing`: path separators flatten to dashes
/// and the markdown extension is dropped.
pub fn rule_id(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    let without_ext = trimmed.strip_suffix(".md").unwrap_or(trimmed);
    without_ext.replace('/', "-")
}

/// Load and parse the rule a reference resolves to, reading from the
/// checkout at `checkout_root`.
pub fn load(reference: &RuleReference, checkout_root: &Path) -> Result<Rule> {
    let file_path = locate(reference, checkout_root)?;

    let content = fs::read_to_string(&file_path).map_err(|_| not_found(reference))?;
    let (metadata, body) = split_front_matter(&content, &reference.path)?;

    if let Some(Trigger::Glob { patterns }) = &metadata.trigger {
        for pattern in patterns {
            glob::Pattern::new(pattern).map_err(|e| Error::RuleFormat {
                path: reference.path.clone(),
                message: format!("invalid trigger glob '{}': {}", pattern, e),
            })?;
        }
    }

    let id = rule_id(&reference.path);
    Ok(Rule {
        title: metadata.title.unwrap_or_else(|| id.clone()),
        id,
        description: metadata.description,
        tags: metadata.tags,
        frameworks: metadata.frameworks,
        languages: metadata.languages,
        source: reference.repository_url.clone(),
        r#ref: reference.r#ref.clone(),
        file_path,
        trigger: metadata.trigger,
        default_variables: metadata.variables,
        body: body.to_string(),
    })
}

/// Find the document a reference points at, appending `.md` when the path
/// was written without an extension.
fn locate(reference: &RuleReference, checkout_root: &Path) -> Result<PathBuf> {
    let direct = checkout_root.join(&reference.path);
    if direct.is_file() {
        return Ok(direct);
    }

    if Path::new(&reference.path).extension().is_none() {
        let with_ext = checkout_root.join(format!("{}.md", reference.path));
        if with_ext.is_file() {
            return Ok(with_ext);
        }
    }

    Err(not_found(reference))
}

/// Split YAML front matter from the markdown body.
///
/// A document without front matter is a body-only rule with default
/// metadata. An opening `---` without a closing fence, or YAML that does
/// not deserialize, is a format error.
fn split_front_matter<'a>(content: &'a str, rule_path: &str) -> Result<(RuleMetadata, &'a str)> {
    let Some(rest) = content.strip_prefix("---\n").or_else(|| content.strip_prefix("---\r\n"))
    else {
        return Ok((RuleMetadata::default(), content));
    };

    // Scan every "\n---" candidate: dashes continuing with other text
    // (such as a "----" line) are not a closing fence.
    let Some((yaml_end, body_start)) = rest.match_indices("\n---").find_map(|(start, _)| {
        let after = start + 4;
        let tail = &rest[after..];
        if tail.is_empty() || tail.starts_with('\n') || tail.starts_with("\r\n") {
            Some((start, after))
        } else {
            None
        }
    }) else {
        return Err(Error::RuleFormat {
            path: rule_path.to_string(),
            message: "unterminated front matter".to_string(),
        });
    };
    let metadata: RuleMetadata =
        serde_yaml::from_str(&rest[..yaml_end]).map_err(|e| Error::RuleFormat {
            path: rule_path.to_string(),
            message: e.to_string(),
        })?;

    let body = rest[body_start..].trim_start_matches(['\n', '\r']);
    Ok((metadata, body))
}

fn not_found(reference: &RuleReference) -> Error {
    Error::RuleNotFound {
        path: reference.path.clone(),
        repo: reference.repository_url.clone(),
        r#ref: reference.r#ref.clone(),
    }
}
