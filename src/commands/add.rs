//! Add command implementation
//!
//! Parses the rule identifier, fetches its repository, and loads the rule
//! once to validate it and record an initial fingerprint before appending
//! the entry to the manifest. A rule that cannot be resolved is never
//! written into the manifest.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use contexture::manifest::RuleEntry;
use contexture::output::OutputConfig;
use contexture::suggestions;
use contexture::update::fingerprint;
use contexture::variables::parse_var_flags;
use contexture::{reference, rule};

/// Arguments for the add command
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Rule identifier: a plain path or '[contexture(<source>):<path>,<ref>]'
    #[arg(value_name = "RULE")]
    pub token: String,

    /// Source repository (URL, owner/repo shorthand, or alias)
    #[arg(long, value_name = "SOURCE")]
    pub source: Option<String>,

    /// Git ref (branch, tag, or commit)
    #[arg(long, value_name = "REF")]
    pub r#ref: Option<String>,

    /// Project variable for this rule, as key=value (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE")]
    pub vars: Vec<String>,

    /// Path to the project manifest
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Cache root directory
    #[arg(long, value_name = "PATH", env = "CONTEXTURE_CACHE")]
    pub cache_root: Option<PathBuf>,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the add command
pub fn execute(args: AddArgs, output: &OutputConfig) -> Result<()> {
    let (path, mut manifest) = super::load_manifest(args.config)?;

    let reference =
        reference::parse(&args.token, args.source.as_deref(), args.r#ref.as_deref())
            .map_err(|e| suggestions::malformed_rule_token(&args.token, &e.to_string()))?;
    let variables = parse_var_flags(&args.vars)?;

    // Resolve and load once so a broken rule fails here, not at build time.
    let cache = super::cache_store(args.cache_root);
    let checkout = cache.ensure(&reference.repository_url, &reference.r#ref, false)?;
    let loaded = rule::load(&reference, &checkout)?;

    manifest.add_rule(RuleEntry {
        rule: reference.to_string(),
        variables,
        fingerprint: Some(fingerprint(&loaded)),
    })?;
    manifest.save(&path)?;

    if !args.quiet {
        println!(
            "{} added {} {}",
            output.ok_marker(),
            loaded.id,
            output.dim(&format!("({}, {})", reference.repository_url, reference.r#ref))
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_token_gets_hint() {
        let temp = tempfile::TempDir::new().unwrap();
        let manifest_path = temp.path().join(".contexture.yaml");
        contexture::manifest::ProjectManifest::default()
            .save(&manifest_path)
            .unwrap();

        let args = AddArgs {
            token: "[contexture:go/testing".to_string(),
            source: None,
            r#ref: None,
            vars: vec![],
            config: Some(manifest_path),
            cache_root: Some(temp.path().join("cache")),
            quiet: true,
        };

        let err = execute(args, &OutputConfig::without_color()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Invalid rule identifier"));
        assert!(message.contains("Bracketed form"));
    }

    #[test]
    fn test_missing_manifest_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let args = AddArgs {
            token: "go/testing".to_string(),
            source: None,
            r#ref: None,
            vars: vec![],
            config: Some(temp.path().join("nope.yaml")),
            cache_root: Some(temp.path().join("cache")),
            quiet: true,
        };

        let err = execute(args, &OutputConfig::without_color()).unwrap_err();
        assert!(err.to_string().contains("Manifest not found"));
    }
}
