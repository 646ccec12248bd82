//! # Format Rendering
//!
//! Rendering converts a loaded rule plus its effective variables into the
//! native representation of one output format. It is a pure function of
//! `(Rule, variables, Format)` and deterministic: identical inputs produce
//! byte-identical output, which is what makes rebuilds idempotent and
//! update diffs meaningful.
//!
//! Format targets:
//! - **cursor**: one `.cursor/rules/<id>.mdc` file per rule, with front
//!   matter mapping the trigger onto `alwaysApply`/`globs`/`description`.
//! - **claude**: one `.claude/rules/<id>.md` markdown file per rule.
//! - **copilot**: one section per rule inside the single concatenated
//!   `.github/copilot-instructions.md` file.
//!
//! `{{name}}` placeholders in rule bodies are substituted from the
//! effective variables; placeholders with no matching variable are left
//! intact so bodies may contain literal `{{...}}` examples.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::manifest::FormatName;
use crate::rule::{Rule, Trigger};
use crate::variables::VarMap;

/// One rendered artifact: where it goes (relative to the project root) and
/// what it contains.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFile {
    pub relative_path: PathBuf,
    pub content: String,
}

/// The output location a format writes a given rule to.
///
/// For `copilot` every rule shares the single concatenated file.
pub fn output_path(format: FormatName, rule_id: &str) -> PathBuf {
    match format {
        FormatName::Cursor => PathBuf::from(format!(".cursor/rules/{}.mdc", rule_id)),
        FormatName::Claude => PathBuf::from(format!(".claude/rules/{}.md", rule_id)),
        FormatName::Copilot => copilot_path(),
    }
}

/// The shared copilot output file.
pub fn copilot_path() -> PathBuf {
    PathBuf::from(".github/copilot-instructions.md")
}

/// Render one rule for one format.
pub fn render(rule: &Rule, vars: &VarMap, format: FormatName) -> Result<RenderedFile> {
    let body = substitute(&rule.body, vars);
    let content = match format {
        FormatName::Cursor => render_cursor(rule, &body),
        FormatName::Claude => render_claude(rule, &body),
        FormatName::Copilot => render_copilot_section(rule, &body),
    };

    if content.is_empty() {
        return Err(Error::Render {
            rule: rule.id.clone(),
            format: format.to_string(),
            message: "rendered output is empty".to_string(),
        });
    }

    Ok(RenderedFile {
        relative_path: output_path(format, &rule.id),
        content,
    })
}

/// Assemble the full copilot document from per-rule sections, in manifest
/// order. The fixed preamble marks the file as generated.
pub fn copilot_document(sections: &[String]) -> String {
    let mut doc = String::from(
        "<!-- Generated by contexture. Do not edit by hand; run 'contexture build'. -->\n\n\
         # Project rules\n",
    );
    for section in sections {
        doc.push('\n');
        doc.push_str(section);
    }
    doc
}

/// Substitute `{{name}}` placeholders from the variable map.
///
/// Unknown placeholders are left verbatim; a missing variable is not a
/// failure.
pub fn substitute(body: &str, vars: &VarMap) -> String {
    // Unwrap is safe: the pattern is a constant.
    static PLACEHOLDER: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.-]*)\s*\}\}").unwrap());
    PLACEHOLDER
        .replace_all(body, |caps: &regex::Captures<'_>| {
            match vars.get(&caps[1]) {
                Some(value) => value.render(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn render_cursor(rule: &Rule, body: &str) -> String {
    let mut front = String::from("---\n");
    if let Some(description) = &rule.description {
        front.push_str(&format!("description: {}\n", description));
    }
    match &rule.trigger {
        Some(Trigger::Glob { patterns }) => {
            front.push_str(&format!("globs: {}\n", patterns.join(",")));
            front.push_str("alwaysApply: false\n");
        }
        Some(Trigger::Always) => front.push_str("alwaysApply: true\n"),
        // Model-decided and manual rules are both opt-in from cursor's
        // point of view; model rules rely on the description above.
        Some(Trigger::Manual) | Some(Trigger::Model) | None => {
            front.push_str("alwaysApply: false\n")
        }
    }
    front.push_str("---\n\n");
    front.push_str(body);
    ensure_trailing_newline(front)
}

fn render_claude(rule: &Rule, body: &str) -> String {
    let mut out = format!("# {}\n", rule.title);
    if let Some(description) = &rule.description {
        out.push_str(&format!("\n> {}\n", description));
    }
    if let Some(Trigger::Glob { patterns }) = &rule.trigger {
        out.push_str(&format!("\nApplies to files matching: `{}`\n", patterns.join("`, `")));
    }
    out.push('\n');
    out.push_str(body);
    ensure_trailing_newline(out)
}

fn render_copilot_section(rule: &Rule, body: &str) -> String {
    let mut out = format!("## {}\n", rule.title);
    if let Some(description) = &rule.description {
        out.push_str(&format!("\n{}\n", description));
    }
    out.push('\n');
    out.push_str(body);
    ensure_trailing_newline(out)
}

fn ensure_trailing_newline(mut s: String) -> String {
    if !s.ends_with('\n') {
        s.push('\n');
    }
    s
}
