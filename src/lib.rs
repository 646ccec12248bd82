//! # Contexture Library
//!
//! This library provides the core functionality for resolving, caching, and
//! rendering reusable AI-assistant rule documents from Git repositories. It
//! is designed to be used by the `contexture` command-line tool but can also
//! be embedded in other applications that manage assistant instructions.
//!
//! ## Quick Example
//!
//! ```
//! use contexture::reference;
//!
//! // Parse a rule identifier in its bracketed form.
//! let r = reference::parse("[contexture(acme/rules):go/testing,v2]", None, None).unwrap();
//! assert_eq!(r.repository_url, "https://github.com/acme/rules");
//! assert_eq!(r.r#ref, "v2");
//! assert_eq!(r.path, "go/testing");
//!
//! // The canonical form round-trips through the parser.
//! let again = reference::parse(&r.to_string(), None, None).unwrap();
//! assert_eq!(r, again);
//! ```
//!
//! ## Core Concepts
//!
//! - **Rule identifiers (`reference`)**: Parse `[contexture(<source>):<path>,<ref>]`
//!   tokens and plain paths into fully resolved references.
//! - **Cache (`cache`, `git`)**: Shallow clones of rule repositories keyed by
//!   normalized URL and ref, refreshed with ref-restricted pulls.
//! - **Rules (`rule`)**: Markdown documents with YAML front matter describing
//!   title, trigger, and default variables.
//! - **Variables (`variables`)**: Typed values merged from rule defaults,
//!   project settings, and CLI flags, in that precedence order.
//! - **Rendering (`render`)**: Pure, deterministic conversion of a rule into
//!   each assistant format's on-disk shape.
//! - **Builds (`build`)**: The orchestrator that runs the full pipeline per
//!   rule and format, with contained per-rule failures.
//! - **Updates (`update`)**: Fingerprint-based detection of upstream changes,
//!   split into a read-only check and an explicit apply.
//!
//! ## Execution Flow
//!
//! A build executes these high-level steps:
//!
//! 1.  **Resolve**: Parse every manifest entry into a rule reference.
//! 2.  **Fetch**: Ensure a cached checkout per distinct repository and ref,
//!     cloning in parallel on first use.
//! 3.  **Load**: Read and parse each rule document from its checkout.
//! 4.  **Merge**: Resolve the effective variable set for each rule.
//! 5.  **Render**: Produce the per-format artifact content.
//! 6.  **Write**: Place artifacts atomically under the project root.

pub mod build;
pub mod cache;
pub mod defaults;
pub mod error;
pub mod git;
pub mod manifest;
pub mod output;
pub mod reference;
pub mod render;
pub mod rule;
pub mod suggestions;
pub mod update;
pub mod variables;

#[cfg(test)]
mod reference_proptest;
