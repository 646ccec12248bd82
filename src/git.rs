//! Git plumbing for fetching rule repositories.
//!
//! This uses the system git command, which automatically handles:
//! - SSH keys from ~/.ssh/
//! - Git credential helpers
//! - Personal access tokens
//! - Any authentication configured in ~/.gitconfig

use std::fs;
use std::path::Path;
use std::process::Command;

use crate::error::Error;

/// Clone a repository at a specific ref using shallow clone.
///
/// Any pre-existing target directory is removed first (git refuses to clone
/// into a non-empty directory). On clone failure the partially created
/// target is removed as well, so a failed clone never leaves residue that a
/// later run could mistake for a valid checkout.
pub fn clone_at_ref(url: &str, ref_name: &str, target_dir: &Path) -> Result<(), Error> {
    if target_dir.exists() {
        fs::remove_dir_all(target_dir)?;
    }

    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    // git clone --depth=1 --branch <ref> <url> <target_dir>
    let output = Command::new("git")
        .args(["clone", "--depth=1", "--branch", ref_name, url])
        .arg(target_dir)
        .output()
        .map_err(|e| Error::GitClone {
            url: url.to_string(),
            r#ref: ref_name.to_string(),
            message: e.to_string(),
            hint: None,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let hint = auth_hint(&stderr);

        // Never leave a partial clone behind.
        if target_dir.exists() {
            let _ = fs::remove_dir_all(target_dir);
        }

        return Err(Error::GitClone {
            url: url.to_string(),
            r#ref: ref_name.to_string(),
            message: stderr,
            hint,
        });
    }

    Ok(())
}

/// Update an existing checkout to the latest state of `ref_name`.
///
/// The fetch is restricted to the single ref the checkout was cloned at, so
/// a cached shallow clone stays shallow.
pub fn update_checkout(url: &str, ref_name: &str, checkout_dir: &Path) -> Result<(), Error> {
    run_in_checkout(
        url,
        checkout_dir,
        &["fetch", "--depth=1", "origin", ref_name],
    )?;
    run_in_checkout(url, checkout_dir, &["reset", "--hard", "FETCH_HEAD"])?;
    Ok(())
}

/// Whether `dir` contains a working git checkout.
///
/// A directory without a `.git` entry is treated as invalid; partial clone
/// residue fails this check and gets re-cloned.
pub fn is_checkout(dir: &Path) -> bool {
    dir.is_dir() && dir.join(".git").exists()
}

fn run_in_checkout(url: &str, checkout_dir: &Path, args: &[&str]) -> Result<(), Error> {
    let output = Command::new("git")
        .arg("-C")
        .arg(checkout_dir)
        .args(args)
        .output()
        .map_err(|e| Error::GitCommand {
            command: args.join(" "),
            url: url.to_string(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::GitCommand {
            command: args.join(" "),
            url: url.to_string(),
            stderr: stderr.to_string(),
        });
    }

    Ok(())
}

/// Provide a helpful hint for common auth failures.
fn auth_hint(stderr: &str) -> Option<String> {
    if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
    {
        Some(
            "Make sure you have access to the repository. For private repos, ensure you have:\n\
             - SSH key added to ssh-agent\n\
             - Git credentials configured\n\
             - Personal access token set up"
                .to_string(),
        )
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_checkout_rejects_plain_directory() {
        let temp = TempDir::new().unwrap();
        assert!(!is_checkout(temp.path()));
    }

    #[test]
    fn test_is_checkout_rejects_missing_directory() {
        assert!(!is_checkout(Path::new("/nonexistent/checkout")));
    }

    #[test]
    fn test_is_checkout_accepts_git_directory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".git")).unwrap();
        assert!(is_checkout(temp.path()));
    }

    #[test]
    fn test_auth_hint_detection() {
        assert!(auth_hint("fatal: Authentication failed for ...").is_some());
        assert!(auth_hint("git@github.com: Permission denied (publickey).").is_some());
        assert!(auth_hint("fatal: repository not found").is_none());
    }

    #[test]
    fn test_clone_failure_leaves_no_residue() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("checkout");

        // Cloning from a path that is not a repository fails fast without
        // touching the network.
        let missing = temp.path().join("no-such-repo");
        let result = clone_at_ref(
            &format!("file://{}", missing.display()),
            "main",
            &target,
        );

        assert!(result.is_err());
        assert!(!target.exists());
    }

    // Integration tests for clone_at_ref and update_checkout against real
    // repositories live in the E2E suite, which builds file:// fixtures.
}
