//! # Build Orchestration
//!
//! The orchestrator drives the full pipeline for every manifest entry and
//! every enabled format: resolve the identifier, ensure a cached checkout,
//! load the rule, merge variables, render, and write the artifact.
//!
//! ## Behavior
//!
//! - Distinct `(repository, ref)` pairs are prefetched in parallel with a
//!   rayon pool; the cache store's per-key locks make this safe even when
//!   many rules share a repository.
//! - A failure in one rule is contained: the result list covers every
//!   `(rule, format)` pair attempted, each tagged success or failure, and
//!   the remaining pairs proceed.
//! - Output files are written via temp-file plus atomic rename. A format
//!   whose output is one concatenated file (copilot) is only rewritten
//!   when every contributing rule rendered in the current run, so partial
//!   failures never leave the shared file half-written.
//! - A [`CancelToken`] is checked between units of work; cancellation
//!   aborts the build with a canceled error and leaves the cache valid.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

use crate::cache::CacheStore;
use crate::error::{Error, ErrorKind, Result};
use crate::manifest::{FormatName, ProjectManifest, RuleEntry};
use crate::reference::RuleReference;
use crate::render::{self, RenderedFile};
use crate::rule;
use crate::variables::{self, VarMap};

/// Cooperative cancellation signal, checked between rule/format units.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; in-flight units finish, no new unit starts.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Fail with a canceled error if cancellation was requested.
    pub fn checkpoint(&self, operation: &str) -> Result<()> {
        if self.is_canceled() {
            Err(Error::Canceled {
                operation: operation.to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// Outcome of one `(rule, format)` unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Success,
    Failed,
}

/// Per-rule, per-format build outcome, consumed by both the human-readable
/// table and the `--json` output mode.
#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    /// Rule id, or the raw token when the identifier itself was invalid.
    pub rule: String,
    pub format: FormatName,
    pub status: BuildStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

impl BuildResult {
    fn success(rule: &str, format: FormatName) -> Self {
        Self {
            rule: rule.to_string(),
            format,
            status: BuildStatus::Success,
            error: None,
            error_kind: None,
        }
    }

    fn failure(rule: &str, format: FormatName, kind: ErrorKind, message: String) -> Self {
        Self {
            rule: rule.to_string(),
            format,
            status: BuildStatus::Failed,
            error: Some(message),
            error_kind: Some(kind.as_str()),
        }
    }
}

/// Whether any unit in a result list failed.
pub fn any_failed(results: &[BuildResult]) -> bool {
    results.iter().any(|r| r.status == BuildStatus::Failed)
}

/// Per-invocation build inputs beyond the manifest itself.
#[derive(Debug, Default)]
pub struct BuildOptions {
    /// Restrict output to these formats (intersected with the enabled
    /// set). `None` means all enabled formats.
    pub formats_filter: Option<Vec<FormatName>>,
    /// Variables from `--data`.
    pub cli_data: VarMap,
    /// Variables from repeated `--var` flags.
    pub cli_vars: VarMap,
}

/// Failure shaped for carrying across rayon task boundaries.
type UnitError = (ErrorKind, String);

fn unit_error(e: &Error) -> UnitError {
    (e.kind(), e.to_string())
}

/// Per-entry pipeline outcome: either every selected format rendered or
/// the entry failed before rendering.
struct EntryOutcome {
    rule_label: String,
    rendered: std::result::Result<Vec<(FormatName, RenderedFile)>, UnitError>,
}

/// Run the build pipeline for every manifest entry and selected format.
///
/// Returns one [`BuildResult`] per `(rule, format)` pair attempted. Only
/// cancellation and an empty format selection abort the whole build.
pub fn build(
    manifest: &ProjectManifest,
    cache: &CacheStore,
    project_root: &Path,
    options: &BuildOptions,
    cancel: &CancelToken,
) -> Result<Vec<BuildResult>> {
    let formats = selected_formats(manifest, options.formats_filter.as_deref())?;
    cancel.checkpoint("build")?;

    info!(
        "building {} rules for {} formats",
        manifest.rules.len(),
        formats.len()
    );

    // Prefetch distinct (repository, ref) pairs in parallel. Per-key locks
    // in the cache store serialize any overlap.
    let references: Vec<std::result::Result<RuleReference, UnitError>> = manifest
        .rules
        .iter()
        .map(|entry| entry.reference().map_err(|e| unit_error(&e)))
        .collect();

    let targets: BTreeSet<(String, String)> = references
        .iter()
        .flatten()
        .map(|r| (r.repository_url.clone(), r.r#ref.clone()))
        .collect();

    let checkouts: HashMap<(String, String), std::result::Result<PathBuf, UnitError>> = targets
        .into_par_iter()
        .map(|(url, r#ref)| {
            if cancel.is_canceled() {
                let canceled = Error::Canceled {
                    operation: "fetch".to_string(),
                };
                return ((url, r#ref), Err(unit_error(&canceled)));
            }
            let result = cache
                .ensure(&url, &r#ref, false)
                .map_err(|e| unit_error(&e));
            ((url, r#ref), result)
        })
        .collect();
    cancel.checkpoint("build")?;

    // Resolve, load, and render every entry. Rendering is pure, so this
    // parallelizes freely; writes happen afterwards.
    let outcomes: Vec<EntryOutcome> = manifest
        .rules
        .par_iter()
        .zip(references.into_par_iter())
        .map(|(entry, reference)| process_entry(entry, reference, &checkouts, &formats, options, cancel))
        .collect();
    cancel.checkpoint("build")?;

    // Write phase: per-rule files individually, the shared copilot file
    // only when every contributing rule rendered.
    let mut results = Vec::new();
    let mut copilot_sections: Vec<(usize, String)> = Vec::new();
    let mut copilot_ok = true;

    for (index, outcome) in outcomes.iter().enumerate() {
        match &outcome.rendered {
            Err((kind, message)) => {
                copilot_ok = copilot_ok && !formats.contains(&FormatName::Copilot);
                for format in &formats {
                    results.push(BuildResult::failure(
                        &outcome.rule_label,
                        *format,
                        *kind,
                        message.clone(),
                    ));
                }
            }
            Ok(rendered) => {
                for (format, file) in rendered {
                    match format {
                        FormatName::Copilot => {
                            copilot_sections.push((index, file.content.clone()));
                            results.push(BuildResult::success(&outcome.rule_label, *format));
                        }
                        _ => {
                            let written = atomic_write(
                                &project_root.join(&file.relative_path),
                                &file.content,
                            );
                            match written {
                                Ok(()) => results
                                    .push(BuildResult::success(&outcome.rule_label, *format)),
                                Err(e) => results.push(BuildResult::failure(
                                    &outcome.rule_label,
                                    *format,
                                    e.kind(),
                                    e.to_string(),
                                )),
                            }
                        }
                    }
                }
            }
        }
    }

    if formats.contains(&FormatName::Copilot) {
        if copilot_ok && !copilot_sections.is_empty() {
            copilot_sections.sort_by_key(|(index, _)| *index);
            let sections: Vec<String> =
                copilot_sections.into_iter().map(|(_, s)| s).collect();
            let document = render::copilot_document(&sections);
            let target = project_root.join(render::copilot_path());
            if let Err(e) = atomic_write(&target, &document) {
                for result in results
                    .iter_mut()
                    .filter(|r| r.format == FormatName::Copilot)
                {
                    result.status = BuildStatus::Failed;
                    result.error = Some(e.to_string());
                    result.error_kind = Some(e.kind().as_str());
                }
            }
        } else if !copilot_ok {
            debug!("skipping copilot output rewrite: not all rules rendered");
        }
    }

    Ok(results)
}

/// The formats this build will produce: enabled formats intersected with
/// the `--formats` filter. An empty selection is a validation error.
fn selected_formats(
    manifest: &ProjectManifest,
    filter: Option<&[FormatName]>,
) -> Result<Vec<FormatName>> {
    let enabled = manifest.enabled_formats();
    let selected: Vec<FormatName> = match filter {
        Some(filter) => enabled
            .into_iter()
            .filter(|f| filter.contains(f))
            .collect(),
        None => enabled,
    };

    if selected.is_empty() {
        return Err(Error::InvalidFlagValue {
            value: "--formats".to_string(),
            message: "no enabled format matches the filter".to_string(),
        });
    }
    Ok(selected)
}

fn process_entry(
    entry: &RuleEntry,
    reference: std::result::Result<RuleReference, UnitError>,
    checkouts: &HashMap<(String, String), std::result::Result<PathBuf, UnitError>>,
    formats: &[FormatName],
    options: &BuildOptions,
    cancel: &CancelToken,
) -> EntryOutcome {
    let reference = match reference {
        Ok(reference) => reference,
        Err(error) => {
            return EntryOutcome {
                rule_label: entry.rule.clone(),
                rendered: Err(error),
            }
        }
    };
    let rule_label = rule::rule_id(&reference.path);

    if cancel.is_canceled() {
        let canceled = Error::Canceled {
            operation: "build".to_string(),
        };
        return EntryOutcome {
            rule_label,
            rendered: Err(unit_error(&canceled)),
        };
    }

    let key = (reference.repository_url.clone(), reference.r#ref.clone());
    let checkout = match checkouts.get(&key) {
        Some(Ok(path)) => path,
        Some(Err(error)) => {
            return EntryOutcome {
                rule_label,
                rendered: Err(error.clone()),
            }
        }
        None => {
            let missing = Error::Cache {
                message: format!("no checkout for {}@{}", key.0, key.1),
            };
            return EntryOutcome {
                rule_label,
                rendered: Err(unit_error(&missing)),
            };
        }
    };

    let loaded = match rule::load(&reference, checkout) {
        Ok(rule) => rule,
        Err(e) => {
            return EntryOutcome {
                rule_label,
                rendered: Err(unit_error(&e)),
            }
        }
    };

    let vars = variables::resolve(
        &loaded.default_variables,
        &entry.variables,
        &options.cli_data,
        &options.cli_vars,
    );

    let mut rendered = Vec::with_capacity(formats.len());
    for format in formats {
        match render::render(&loaded, &vars, *format) {
            Ok(file) => rendered.push((*format, file)),
            Err(e) => {
                return EntryOutcome {
                    rule_label,
                    rendered: Err(unit_error(&e)),
                }
            }
        }
    }

    EntryOutcome {
        rule_label,
        rendered: Ok(rendered),
    }
}

/// Write `content` to `path` via a temp file and atomic rename, creating
/// parent directories as needed.
pub fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let parent = path.parent().ok_or_else(|| Error::Cache {
        message: format!("output path has no parent: {}", path.display()),
    })?;
    fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output");
    let temp = parent.join(format!(".{}.tmp-{}", file_name, std::process::id()));

    fs::write(&temp, content)?;
    if let Err(e) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }
    Ok(())
}
