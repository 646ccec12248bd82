//! Shared test utilities for E2E tests.
//!
//! This module provides common fixtures and helper functions to reduce
//! duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! #[cfg_attr(not(feature = "integration-tests"), ignore)]
//! fn test_example() {
//!     let rules = RulesRepo::new().with_rule("go/testing.md", rules::GO_TESTING);
//!     let fixture = TestFixture::new().with_manifest_for(&rules, &["go/testing"]);
//!     // ... test code
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::rules;
    #[allow(unused_imports)]
    pub use super::RulesRepo;
    pub use super::TestFixture;
}

/// Rule document bodies used across tests.
#[allow(dead_code)]
pub mod rules {
    /// A rule with front matter, a default variable, and a placeholder.
    pub const GO_TESTING: &str = "---\n\
        title: Go testing\n\
        description: Table-driven tests\n\
        variables:\n\
        \x20 coverage: 80\n\
        ---\n\
        Aim for {{coverage}}% coverage.\n";

    /// A minimal rule with no front matter.
    pub const PLAIN: &str = "Prefer short functions.\n";

    /// A rule with a glob trigger.
    pub const WITH_GLOB_TRIGGER: &str = "---\n\
        title: Rust errors\n\
        trigger:\n\
        \x20 type: glob\n\
        \x20 globs:\n\
        \x20   - \"src/**/*.rs\"\n\
        ---\n\
        Propagate errors with the question mark operator.\n";
}

/// A local Git repository of rule documents, cloneable over `file://`.
///
/// Built with the system `git` binary, the same one the cache uses, so
/// E2E tests exercise real clone and fetch paths without a network.
pub struct RulesRepo {
    temp_dir: assert_fs::TempDir,
}

impl RulesRepo {
    /// Create an empty repository on branch `main`.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        git(temp_dir.path(), &["init", "-b", "main"]);
        git(temp_dir.path(), &["config", "user.email", "tests@example.com"]);
        git(temp_dir.path(), &["config", "user.name", "tests"]);
        Self { temp_dir }
    }

    /// Add a rule file and commit it.
    pub fn with_rule(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write rule file");
        git(self.temp_dir.path(), &["add", "-A"]);
        git(
            self.temp_dir.path(),
            &["commit", "-m", &format!("add {path}")],
        );
        self
    }

    /// Overwrite a rule file and commit the change.
    #[allow(dead_code)]
    pub fn update_rule(&self, path: &str, content: &str) {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write rule file");
        git(self.temp_dir.path(), &["add", "-A"]);
        git(
            self.temp_dir.path(),
            &["commit", "-m", &format!("update {path}")],
        );
    }

    /// The `file://` URL clones resolve against.
    pub fn url(&self) -> String {
        format!("file://{}", self.temp_dir.path().display())
    }
}

impl Default for RulesRepo {
    fn default() -> Self {
        Self::new()
    }
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .expect("Failed to run git");
    assert!(status.success(), "git {args:?} failed in {}", dir.display());
}

/// A test fixture providing a project directory with a manifest and an
/// isolated cache root.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `.contexture.yaml` manifest with the given content.
    pub fn with_manifest(self, content: &str) -> Self {
        self.temp_dir
            .child(".contexture.yaml")
            .write_str(content)
            .expect("Failed to write manifest");
        self
    }

    /// Add a manifest whose rules come from `repo`, all formats enabled.
    pub fn with_manifest_for(self, repo: &RulesRepo, rule_paths: &[&str]) -> Self {
        let mut manifest = String::from("rules:\n");
        for path in rule_paths {
            manifest.push_str(&format!(
                "  - rule: \"[contexture({}):{}]\"\n",
                repo.url(),
                path
            ));
        }
        manifest.push_str(
            "formats:\n\
             \x20 - name: cursor\n\
             \x20   enabled: true\n\
             \x20 - name: claude\n\
             \x20   enabled: true\n\
             \x20 - name: copilot\n\
             \x20   enabled: true\n",
        );
        self.with_manifest(&manifest)
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the manifest file.
    #[allow(dead_code)]
    pub fn manifest_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join(".contexture.yaml")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command configured to run in this fixture's directory,
    /// with the cache rooted inside the fixture for isolation.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("contexture");
        cmd.current_dir(self.path())
            .env("CONTEXTURE_CACHE", self.path().join(".test-cache"))
            .env_remove("NO_COLOR")
            .env("CLICOLOR", "0");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_manifest() {
        let fixture = TestFixture::new().with_manifest("rules: []");
        assert!(fixture.manifest_path().exists());
    }

    #[test]
    fn test_rule_bodies_are_valid_yaml_front_matter() {
        for body in [rules::GO_TESTING, rules::WITH_GLOB_TRIGGER] {
            let after = body.strip_prefix("---\n").unwrap();
            let (front, _) = after.split_once("---\n").unwrap();
            serde_yaml::from_str::<serde_yaml::Value>(front)
                .expect("Front matter should be valid YAML");
        }
    }
}
