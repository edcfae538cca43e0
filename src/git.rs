//! Source-control queries backed by the system `git` binary.

use std::env;
use std::path::PathBuf;
use std::process::Command;

use crate::errors::{ReleaseError, Result};

/// Read-only view of the local repository used by release commands.
pub trait SourceControl {
    /// Whether a tag with exactly this short name exists locally.
    fn tag_exists(&self, name: &str) -> Result<bool>;

    /// Short name of the branch HEAD points at.
    ///
    /// On a detached HEAD (the usual CI checkout) this is the branch the CI
    /// job reports, or `"HEAD"` if none is set.
    fn head_branch(&self) -> Result<String>;

    /// First URL configured for the `origin` remote.
    fn remote_url(&self) -> Result<String>;
}

/// [`SourceControl`] implementation that shells out to `git`.
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    /// Query the repository containing `workdir`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<std::process::Output> {
        tracing::trace!(?args, workdir = %self.workdir.display(), "running git");
        Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|e| ReleaseError::Git {
                message: format!("failed to run git {}: {e}", args.join(" ")),
            })
    }

    fn stdout(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;
        if !output.status.success() {
            return Err(ReleaseError::Git {
                message: format!(
                    "git {} failed: {}",
                    args.join(" "),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl SourceControl for GitCli {
    fn tag_exists(&self, name: &str) -> Result<bool> {
        let tags = self.stdout(&["tag", "--list"])?;
        Ok(tags.lines().any(|t| t.trim() == name))
    }

    fn head_branch(&self) -> Result<String> {
        let branch = self.stdout(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        if branch.is_empty() || branch == "HEAD" {
            let fallback = detached_ref(|name| env::var(name).ok());
            tracing::debug!(reference = %fallback, "HEAD is detached; using CI ref");
            return Ok(fallback);
        }
        Ok(branch)
    }

    fn remote_url(&self) -> Result<String> {
        let url = self.stdout(&["remote", "get-url", "origin"])?;
        url.lines()
            .next()
            .map(str::to_string)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ReleaseError::Git {
                message: "remote 'origin' has no URL".into(),
            })
    }
}

/// CI variables naming the checked-out branch, most specific first.
const CI_REF_VARS: &[&str] = &["CI_COMMIT_REF_NAME", "GITHUB_REF_NAME", "CI_DEFAULT_BRANCH"];

/// Ref to release from when HEAD is detached. `"HEAD"` lets the platform
/// resolve it to the default branch.
fn detached_ref(lookup: impl Fn(&str) -> Option<String>) -> String {
    CI_REF_VARS
        .iter()
        .find_map(|&name| lookup(name).filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| "HEAD".to_string())
}
