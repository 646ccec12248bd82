//! # Project Manifest
//!
//! The manifest is the persisted record of which rules and which output
//! formats belong to a project, stored as YAML under a well-known filename
//! checked in two candidate locations. It is the single source of truth
//! for "what is installed"; the build orchestrator never infers installed
//! rules from the filesystem.
//!
//! Rule entries persist the canonical identifier token (which re-parses to
//! the same [`RuleReference`]), per-entry variables, and the content
//! fingerprint recorded at add/update time.
//!
//! The format set is closed. At least one format must remain enabled at
//! all times; every mutation point enforces this invariant.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defaults::MANIFEST_CANDIDATES;
use crate::error::{Error, Result};
use crate::reference::{self, RuleReference};
use crate::variables::VarMap;

/// The closed set of assistant output targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatName {
    Cursor,
    Claude,
    Copilot,
}

impl FormatName {
    /// All formats, in display order.
    pub fn all() -> [FormatName; 3] {
        [FormatName::Cursor, FormatName::Claude, FormatName::Copilot]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormatName::Cursor => "cursor",
            FormatName::Claude => "claude",
            FormatName::Copilot => "copilot",
        }
    }
}

impl fmt::Display for FormatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cursor" => Ok(FormatName::Cursor),
            "claude" => Ok(FormatName::Claude),
            "copilot" => Ok(FormatName::Copilot),
            other => Err(Error::InvalidFlagValue {
                value: other.to_string(),
                message: format!(
                    "unknown format (expected one of: {})",
                    FormatName::all().map(|f| f.as_str()).join(", ")
                ),
            }),
        }
    }
}

/// One output target and whether it is enabled for this project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Format {
    pub name: FormatName,
    pub enabled: bool,
}

/// One installed rule: its identifier token, project-level variables, and
/// the content fingerprint recorded when it was last added or updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEntry {
    /// Canonical rule identifier token.
    pub rule: String,
    /// Project-level variables for this rule, overriding rule defaults.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: VarMap,
    /// SHA-256 fingerprint of the rule content at add/update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl RuleEntry {
    /// Parse this entry's token back into a structured reference.
    pub fn reference(&self) -> Result<RuleReference> {
        reference::parse(&self.rule, None, None)
    }
}

/// Settings for the update flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSettings {
    /// Whether a failed pull during `update` may fall back to the cached
    /// checkout. When false, such entries fail with a network error so an
    /// update check always reflects true remote state.
    #[serde(default = "default_true")]
    pub offline_fallback: bool,
}

fn default_true() -> bool {
    true
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            offline_fallback: true,
        }
    }
}

/// The persisted project manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectManifest {
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
    pub formats: Vec<Format>,
    #[serde(default)]
    pub update: UpdateSettings,
}

impl Default for ProjectManifest {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            formats: FormatName::all()
                .into_iter()
                .map(|name| Format {
                    name,
                    enabled: true,
                })
                .collect(),
            update: UpdateSettings::default(),
        }
    }
}

impl ProjectManifest {
    /// Load the manifest from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::Manifest {
            message: format!("cannot read {}: {}", path.display(), e),
            hint: Some("Run 'contexture init' to create a manifest".to_string()),
        })?;
        let manifest: ProjectManifest =
            serde_yaml::from_str(&content).map_err(|e| Error::Manifest {
                message: format!("cannot parse {}: {}", path.display(), e),
                hint: None,
            })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Save the manifest to a YAML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Check standing invariants: at least one enabled format, no
    /// duplicate format names, and parseable rule tokens.
    pub fn validate(&self) -> Result<()> {
        if !self.formats.iter().any(|f| f.enabled) {
            return Err(Error::Manifest {
                message: "no output format is enabled".to_string(),
                hint: Some("Enable one with 'contexture formats enable <name>'".to_string()),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for format in &self.formats {
            if !seen.insert(format.name) {
                return Err(Error::Manifest {
                    message: format!("duplicate format entry: {}", format.name),
                    hint: None,
                });
            }
        }

        for entry in &self.rules {
            entry.reference()?;
        }

        Ok(())
    }

    /// The formats currently enabled, in manifest order.
    pub fn enabled_formats(&self) -> Vec<FormatName> {
        self.formats
            .iter()
            .filter(|f| f.enabled)
            .map(|f| f.name)
            .collect()
    }

    /// Enable or disable a format.
    ///
    /// Disabling the last enabled format is rejected, so at least one
    /// format stays enabled after every successful mutation.
    pub fn set_format_enabled(&mut self, name: FormatName, enabled: bool) -> Result<()> {
        if !enabled {
            let remaining = self
                .formats
                .iter()
                .filter(|f| f.enabled && f.name != name)
                .count();
            if remaining == 0 {
                return Err(Error::InvalidFlagValue {
                    value: name.to_string(),
                    message: "cannot disable the last enabled format".to_string(),
                });
            }
        }

        match self.formats.iter_mut().find(|f| f.name == name) {
            Some(format) => format.enabled = enabled,
            None => self.formats.push(Format { name, enabled }),
        }
        Ok(())
    }

    /// Add a rule entry. A reference already present (by resolved
    /// repository, ref, and path) is rejected.
    pub fn add_rule(&mut self, entry: RuleEntry) -> Result<()> {
        let incoming = entry.reference()?;
        for existing in &self.rules {
            if existing.reference()? == incoming {
                return Err(Error::InvalidFlagValue {
                    value: entry.rule.clone(),
                    message: "rule is already in the manifest".to_string(),
                });
            }
        }
        self.rules.push(entry);
        Ok(())
    }

    /// Remove the entry matching `reference`. Unknown entries are a
    /// not-found error.
    pub fn remove_rule(&mut self, reference: &RuleReference) -> Result<RuleEntry> {
        let position = self
            .rules
            .iter()
            .position(|entry| {
                entry
                    .reference()
                    .map(|r| &r == reference)
                    .unwrap_or(false)
            })
            .ok_or_else(|| Error::RuleNotFound {
                path: reference.path.clone(),
                repo: reference.repository_url.clone(),
                r#ref: reference.r#ref.clone(),
            })?;
        Ok(self.rules.remove(position))
    }
}

/// Locate the project manifest starting from `dir`, checking the candidate
/// locations in order.
pub fn find_manifest(dir: &Path) -> Option<PathBuf> {
    MANIFEST_CANDIDATES
        .iter()
        .map(|candidate| dir.join(candidate))
        .find(|path| path.is_file())
}

/// The project root a manifest path belongs to.
///
/// Rendered artifacts are rooted here, not next to the manifest file: a
/// manifest living in the `.config/` candidate location still writes
/// outputs at the directory containing `.config/`.
pub fn project_root(manifest_path: &Path) -> PathBuf {
    let parent = manifest_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    if parent.file_name().is_some_and(|name| name == ".config") {
        return parent
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
    }
    parent
}
