//! Build command implementation
//!
//! Runs the full pipeline for every manifest rule and enabled format and
//! reports one line per (rule, format) unit. The exit status is non-zero
//! when any unit failed.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::str::FromStr;

use contexture::build::{self, BuildOptions, BuildStatus, CancelToken};
use contexture::error::Error;
use contexture::manifest::FormatName;
use contexture::output::OutputConfig;
use contexture::suggestions;
use contexture::variables::{parse_data_json, parse_var_flags};

/// Arguments for the build command
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Only produce these formats (repeatable)
    #[arg(long = "formats", value_name = "FORMAT")]
    pub formats: Vec<String>,

    /// Variable override, as key=value (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE")]
    pub vars: Vec<String>,

    /// Variable overrides as a JSON object
    #[arg(long, value_name = "JSON")]
    pub data: Option<String>,

    /// Emit the result list as JSON
    #[arg(long)]
    pub json: bool,

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

/// Execute the build command
pub fn execute(args: BuildArgs, output: &OutputConfig) -> Result<()> {
    let (manifest_path, manifest) = super::load_manifest(args.config)?;
    let project_root = contexture::manifest::project_root(&manifest_path);

    let formats_filter = parse_formats(&args.formats)?;
    let options = BuildOptions {
        formats_filter,
        cli_data: match &args.data {
            Some(data) => parse_data_json(data)?,
            None => Default::default(),
        },
        cli_vars: parse_var_flags(&args.vars)?,
    };

    let cache = super::cache_store(args.cache_root);
    let cancel = CancelToken::new();
    let results = build::build(&manifest, &cache, &project_root, &options, &cancel)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if !args.quiet {
        for result in &results {
            match result.status {
                BuildStatus::Success => {
                    println!("{} {} [{}]", output.ok_marker(), result.rule, result.format)
                }
                BuildStatus::Failed => println!(
                    "{} {} [{}]: {}",
                    output.failed_marker(),
                    result.rule,
                    result.format,
                    result.error.as_deref().unwrap_or("unknown error")
                ),
            }
        }
    }

    if build::any_failed(&results) {
        let failed = results
            .iter()
            .filter(|r| r.status == BuildStatus::Failed)
            .count();
        anyhow::bail!("{failed} of {} build units failed", results.len());
    }
    Ok(())
}

/// Parse `--formats` values, with a did-you-mean hint for typos.
fn parse_formats(names: &[String]) -> Result<Option<Vec<FormatName>>> {
    if names.is_empty() {
        return Ok(None);
    }
    let mut formats = Vec::with_capacity(names.len());
    for name in names {
        let format = FormatName::from_str(name).map_err(|e| match e {
            Error::InvalidFlagValue { .. } => suggestions::unknown_format(name),
            other => other.into(),
        })?;
        if !formats.contains(&format) {
            formats.push(format);
        }
    }
    Ok(Some(formats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats_empty_means_all() {
        assert_eq!(parse_formats(&[]).unwrap(), None);
    }

    #[test]
    fn test_parse_formats_dedupes() {
        let names = vec!["claude".to_string(), "claude".to_string()];
        let formats = parse_formats(&names).unwrap().unwrap();
        assert_eq!(formats, vec![FormatName::Claude]);
    }

    #[test]
    fn test_parse_formats_typo_gets_suggestion() {
        let names = vec!["curser".to_string()];
        let err = parse_formats(&names).unwrap_err();
        assert!(err.to_string().contains("Did you mean 'cursor'?"));
    }
}
