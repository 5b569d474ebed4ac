//! Read-only git queries used by the commit/push gate.
//!
//! [`RepoView`] is the seam between the gate and the repository on disk.
//! [`GitCli`] shells out to `git`; tests substitute scripted repository views.

use std::path::PathBuf;
use std::process::Command;

use crate::error::{HookgateError, Result};

/// Author and full message of the most recent commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// `Name <email>` as rendered by `%an <%ae>`.
    pub author: String,
    /// Subject and body as rendered by `%B`.
    pub message: String,
}

/// Read-only view of the version-control system.
///
/// Implementations must never write to the repository.
pub trait RepoView {
    /// Whether the working directory is inside a work tree.
    fn is_inside_work_tree(&self) -> bool;

    /// `git status --porcelain` output, trimmed. Empty means clean.
    fn porcelain_status(&self) -> Result<String>;

    /// The most recent commit, fetched fresh on every call.
    fn last_commit(&self) -> Result<CommitRecord>;
}

/// [`RepoView`] backed by the `git` binary.
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_dir: PathBuf,
}

impl GitCli {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .map_err(|e| HookgateError::Git(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HookgateError::Git(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl RepoView for GitCli {
    fn is_inside_work_tree(&self) -> bool {
        self.run(&["rev-parse", "--is-inside-work-tree"])
            .map(|out| out == "true")
            .unwrap_or(false)
    }

    fn porcelain_status(&self) -> Result<String> {
        self.run(&["status", "--porcelain"])
    }

    fn last_commit(&self) -> Result<CommitRecord> {
        let author = self.run(&["log", "-1", "--pretty=format:%an <%ae>"])?;
        let message = self.run(&["log", "-1", "--pretty=format:%B"])?;
        Ok(CommitRecord { author, message })
    }
}

impl<P: RepoView + ?Sized> RepoView for &P {
    fn is_inside_work_tree(&self) -> bool {
        (**self).is_inside_work_tree()
    }

    fn porcelain_status(&self) -> Result<String> {
        (**self).porcelain_status()
    }

    fn last_commit(&self) -> Result<CommitRecord> {
        (**self).last_commit()
    }
}
