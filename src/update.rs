//! # Update Resolution
//!
//! Detects upstream changes to resolved rules by comparing content
//! fingerprints, split into a read-only check and an explicit apply so a
//! dry run never mutates the manifest.
//!
//! A fingerprint is a SHA-256 digest over the rule's effective metadata
//! and body. Hashing the parsed form rather than raw bytes means
//! whitespace-only front matter reshuffles do not register as changes,
//! while any edit to the title, trigger, defaults, or body does.

use std::collections::HashMap;
use std::path::PathBuf;

use log::warn;
use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::cache::CacheStore;
use crate::error::{Error, ErrorKind, Result};
use crate::manifest::ProjectManifest;
use crate::rule::{self, Rule};

/// Outcome of checking one manifest entry against its upstream content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UpdateStatus {
    /// The fingerprint matches the one recorded in the manifest.
    Unchanged,
    /// Upstream content differs from what the manifest last recorded.
    /// `old` is `None` for entries that never recorded a fingerprint.
    Changed {
        #[serde(skip_serializing_if = "Option::is_none")]
        old: Option<String>,
        new: String,
    },
    /// The entry could not be checked; the rest of the run proceeds.
    Failed { kind: &'static str, message: String },
}

/// Per-entry update report, one per manifest rule.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    /// The raw identifier token as written in the manifest.
    pub rule: String,
    #[serde(flatten)]
    pub status: UpdateStatus,
}

impl UpdateReport {
    pub fn is_changed(&self) -> bool {
        matches!(self.status, UpdateStatus::Changed { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, UpdateStatus::Failed { .. })
    }
}

/// Compute the content fingerprint for a parsed rule.
///
/// The digest covers title, description, trigger, default variables, and
/// body, in a fixed field order with length framing so adjacent fields
/// cannot alias.
pub fn fingerprint(rule: &Rule) -> String {
    let mut hasher = Sha256::new();

    let mut field = |bytes: &[u8]| {
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    };
    field(rule.title.as_bytes());
    field(rule.description.as_deref().unwrap_or("").as_bytes());
    for tag in &rule.tags {
        field(tag.as_bytes());
    }
    let trigger = serde_yaml::to_string(&rule.trigger).unwrap_or_default();
    field(trigger.as_bytes());
    // BTreeMap iteration is ordered, so the digest is stable.
    for (key, value) in &rule.default_variables {
        field(key.as_bytes());
        field(value.render().as_bytes());
    }
    field(rule.body.as_bytes());

    format!("{:x}", hasher.finalize())
}

/// Check every manifest entry for upstream changes.
///
/// Each distinct `(repository, ref)` pair is refreshed once. With
/// `offline_fallback` enabled a failed refresh of an already-cached
/// repository logs a warning and checks against the cached content;
/// without it, entries from that repository report as failed.
pub fn check_updates(
    manifest: &ProjectManifest,
    cache: &CacheStore,
    offline_fallback: bool,
) -> Result<Vec<UpdateReport>> {
    // Refresh each distinct repository checkout once, in parallel.
    let mut targets: Vec<(String, String)> = Vec::new();
    for entry in &manifest.rules {
        if let Ok(reference) = entry.reference() {
            let pair = (reference.repository_url, reference.r#ref);
            if !targets.contains(&pair) {
                targets.push(pair);
            }
        }
    }

    let checkouts: HashMap<(String, String), std::result::Result<PathBuf, (ErrorKind, String)>> =
        targets
            .into_par_iter()
            .map(|(url, r#ref)| {
                let result = if offline_fallback {
                    cache.ensure(&url, &r#ref, true)
                } else {
                    cache.ensure_fresh(&url, &r#ref)
                };
                ((url, r#ref), result.map_err(|e| (e.kind(), e.to_string())))
            })
            .collect();

    let reports = manifest
        .rules
        .iter()
        .map(|entry| {
            let status = check_entry(entry.reference(), &entry.fingerprint, &checkouts);
            if let UpdateStatus::Failed { message, .. } = &status {
                warn!("update check failed for '{}': {}", entry.rule, message);
            }
            UpdateReport {
                rule: entry.rule.clone(),
                status,
            }
        })
        .collect();

    Ok(reports)
}

fn check_entry(
    reference: Result<crate::reference::RuleReference>,
    recorded: &Option<String>,
    checkouts: &HashMap<(String, String), std::result::Result<PathBuf, (ErrorKind, String)>>,
) -> UpdateStatus {
    let reference = match reference {
        Ok(reference) => reference,
        Err(e) => return failed(&e),
    };

    let key = (reference.repository_url.clone(), reference.r#ref.clone());
    let checkout = match checkouts.get(&key) {
        Some(Ok(path)) => path.clone(),
        Some(Err((kind, message))) => {
            return UpdateStatus::Failed {
                kind: kind.as_str(),
                message: message.clone(),
            }
        }
        None => {
            return failed(&Error::Cache {
                message: format!("no checkout for {}@{}", key.0, key.1),
            })
        }
    };

    let loaded = match rule::load(&reference, &checkout) {
        Ok(rule) => rule,
        Err(e) => return failed(&e),
    };

    let new = fingerprint(&loaded);
    match recorded {
        Some(old) if *old == new => UpdateStatus::Unchanged,
        old => UpdateStatus::Changed {
            old: old.clone(),
            new,
        },
    }
}

fn failed(error: &Error) -> UpdateStatus {
    UpdateStatus::Failed {
        kind: error.kind().as_str(),
        message: error.to_string(),
    }
}

/// Record the new fingerprints from a check into the manifest.
///
/// Only `Changed` reports are applied; failed and unchanged entries are
/// left untouched. Returns the number of entries updated. The caller is
/// responsible for saving the manifest and rebuilding outputs.
pub fn apply(manifest: &mut ProjectManifest, reports: &[UpdateReport]) -> usize {
    let mut applied = 0;
    for report in reports {
        if let UpdateStatus::Changed { new, .. } = &report.status {
            // Reports carry the manifest token verbatim.
            if let Some(entry) = manifest.rules.iter_mut().find(|e| e.rule == report.rule) {
                entry.fingerprint = Some(new.clone());
                applied += 1;
            }
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::GitOperations;
    use crate::manifest::RuleEntry;
    use crate::variables::VarMap;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Git operations that write a configurable rule body into the
    /// checkout on clone and rewrite it on pull.
    struct MutableGit {
        path: String,
        content: Mutex<String>,
    }

    impl MutableGit {
        fn new(path: &str, content: &str) -> Self {
            Self {
                path: path.to_string(),
                content: Mutex::new(content.to_string()),
            }
        }

        fn write_into(&self, dir: &Path) -> Result<()> {
            let file = dir.join(&self.path);
            fs::create_dir_all(file.parent().unwrap())?;
            fs::write(file, self.content.lock().unwrap().as_str())?;
            Ok(())
        }
    }

    impl GitOperations for MutableGit {
        fn clone_at_ref(&self, _url: &str, _ref_name: &str, target_dir: &Path) -> Result<()> {
            fs::create_dir_all(target_dir.join(".git"))?;
            self.write_into(target_dir)
        }

        fn update_checkout(&self, _url: &str, _ref_name: &str, dir: &Path) -> Result<()> {
            self.write_into(dir)
        }

        fn is_checkout(&self, dir: &Path) -> bool {
            dir.join(".git").exists()
        }
    }

    fn manifest_with(tokens: &[&str]) -> ProjectManifest {
        let mut manifest = ProjectManifest::default();
        for token in tokens {
            manifest
                .add_rule(RuleEntry {
                    rule: token.to_string(),
                    variables: VarMap::new(),
                    fingerprint: None,
                })
                .unwrap();
        }
        manifest
    }

    const RULE_V1: &str = "---\ntitle: Testing\n---\nWrite table tests.\n";
    const RULE_V2: &str = "---\ntitle: Testing\n---\nWrite table tests and benchmarks.\n";

    fn load_fixture(content: &str) -> Rule {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("go")).unwrap();
        fs::write(temp.path().join("go/testing.md"), content).unwrap();
        let reference = crate::reference::RuleReference {
            source_alias: None,
            repository_url: "https://github.com/acme/rules".to_string(),
            r#ref: "main".to_string(),
            path: "go/testing".to_string(),
        };
        rule::load(&reference, temp.path()).unwrap()
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = fingerprint(&load_fixture(RULE_V1));
        let b = fingerprint(&load_fixture(RULE_V1));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_tracks_body_changes() {
        let a = fingerprint(&load_fixture(RULE_V1));
        let b = fingerprint(&load_fixture(RULE_V2));
        assert_ne!(a, b);
    }

    #[test]
    fn test_first_check_reports_changed_without_old() {
        let temp = TempDir::new().unwrap();
        let git = MutableGit::new("go/testing.md", RULE_V1);
        let cache = CacheStore::with_git_ops(temp.path().to_path_buf(), Box::new(git));
        let manifest = manifest_with(&["go/testing"]);

        let reports = check_updates(&manifest, &cache, true).unwrap();
        assert_eq!(reports.len(), 1);
        match &reports[0].status {
            UpdateStatus::Changed { old: None, new } => assert_eq!(new.len(), 64),
            other => panic!("expected changed, got {:?}", other),
        }
    }

    #[test]
    fn test_check_then_apply_then_unchanged() {
        let temp = TempDir::new().unwrap();
        let git = MutableGit::new("go/testing.md", RULE_V1);
        let cache = CacheStore::with_git_ops(temp.path().to_path_buf(), Box::new(git));
        let mut manifest = manifest_with(&["go/testing"]);

        let reports = check_updates(&manifest, &cache, true).unwrap();
        assert_eq!(apply(&mut manifest, &reports), 1);
        assert!(manifest.rules[0].fingerprint.is_some());

        let reports = check_updates(&manifest, &cache, true).unwrap();
        assert_eq!(reports[0].status, UpdateStatus::Unchanged);
    }

    #[test]
    fn test_upstream_edit_detected_after_apply() {
        let temp = TempDir::new().unwrap();
        let git = MutableGit::new("go/testing.md", RULE_V1);
        let cache = CacheStore::with_git_ops(temp.path().to_path_buf(), Box::new(git));
        let mut manifest = manifest_with(&["go/testing"]);

        let reports = check_updates(&manifest, &cache, true).unwrap();
        apply(&mut manifest, &reports);

        // Simulate an upstream edit by pointing a fresh store with new
        // content at the same cache root.
        let git = MutableGit::new("go/testing.md", RULE_V2);
        let cache = CacheStore::with_git_ops(temp.path().to_path_buf(), Box::new(git));
        let reports = check_updates(&manifest, &cache, true).unwrap();
        match &reports[0].status {
            UpdateStatus::Changed { old: Some(_), new } => assert_eq!(new.len(), 64),
            other => panic!("expected changed, got {:?}", other),
        }
    }

    #[test]
    fn test_failed_entry_does_not_abort_check() {
        let temp = TempDir::new().unwrap();
        let git = MutableGit::new("go/testing.md", RULE_V1);
        let cache = CacheStore::with_git_ops(temp.path().to_path_buf(), Box::new(git));
        let manifest = manifest_with(&["go/testing", "go/missing"]);

        let reports = check_updates(&manifest, &cache, true).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].is_changed());
        match &reports[1].status {
            UpdateStatus::Failed { kind, .. } => assert_eq!(*kind, "not-found"),
            other => panic!("expected failed, got {:?}", other),
        }
    }

    #[test]
    fn test_apply_skips_failed_reports() {
        let mut manifest = manifest_with(&["go/testing"]);
        let reports = vec![UpdateReport {
            rule: "go/testing".to_string(),
            status: UpdateStatus::Failed {
                kind: "network",
                message: "offline".to_string(),
            },
        }];
        assert_eq!(apply(&mut manifest, &reports), 0);
        assert!(manifest.rules[0].fingerprint.is_none());
    }
}
