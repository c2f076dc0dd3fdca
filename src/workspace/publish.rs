//! Publishing verified subtask work: commit, push, and optionally open a PR.
//!
//! Publishing is best-effort. The orchestrator logs a publish failure and
//! keeps the subtask's success classification.

use super::Workspace;
use crate::error::{ForklineError, Result};
use crate::git::{has_uncommitted_changes, remote_exists, run_git_with};
use crate::process::{Limits, run_process};
use serde::Serialize;
use std::process::Command;
use tracing::debug;

/// Maximum length of a commit or PR title derived from the subtask text.
const TITLE_MAX_CHARS: usize = 72;

/// Makes a verified workspace's changes available for integration.
pub trait Publisher: Send + Sync {
    fn publish(&self, subtask: &str, workspace: &Workspace) -> Result<PublishReport>;
}

/// What publishing actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    /// A commit was created from uncommitted workspace changes.
    pub committed: bool,
    /// The branch was pushed to the remote.
    pub pushed: bool,
    /// URL printed by `gh pr create`, if a PR was opened.
    pub pull_request: Option<String>,
}

/// [`Publisher`] that commits in the worktree and pushes the subtask branch.
#[derive(Debug, Clone)]
pub struct GitPublisher {
    remote: String,
    push: bool,
    open_pull_request: bool,
    limits: Limits,
}

impl GitPublisher {
    pub fn new(remote: impl Into<String>, push: bool, open_pull_request: bool, limits: Limits) -> Self {
        Self {
            remote: remote.into(),
            push,
            open_pull_request,
            limits,
        }
    }

    fn commit_all(&self, subtask: &str, workspace: &Workspace) -> Result<bool> {
        if !has_uncommitted_changes(&workspace.path, &self.limits)? {
            return Ok(false);
        }

        run_git_with(&workspace.path, &["add", "-A"], &self.limits)?;
        let message = format!("{}\n\n{}", title_for(subtask), subtask.trim());
        run_git_with(&workspace.path, &["commit", "-m", &message], &self.limits).map_err(|e| {
            ForklineError::GitError(format!(
                "failed to commit changes on '{}': {}",
                workspace.branch, e
            ))
        })?;

        Ok(true)
    }

    fn push_branch(&self, workspace: &Workspace) -> Result<bool> {
        if !remote_exists(&workspace.path, &self.remote, &self.limits)? {
            debug!(remote = %self.remote, "remote not configured, skipping push");
            return Ok(false);
        }

        run_git_with(
            &workspace.path,
            &["push", "--set-upstream", &self.remote, &workspace.branch],
            &self.limits,
        )
        .map_err(|e| {
            ForklineError::GitError(format!(
                "failed to push '{}' to '{}': {}",
                workspace.branch, self.remote, e
            ))
        })?;

        Ok(true)
    }

    fn open_pr(&self, subtask: &str, workspace: &Workspace) -> Result<String> {
        let mut command = Command::new("gh");
        command.current_dir(&workspace.path).args([
            "pr",
            "create",
            "--head",
            &workspace.branch,
            "--title",
            &title_for(subtask),
            "--body",
            subtask.trim(),
        ]);

        let output = run_process(command, &self.limits).map_err(|e| {
            ForklineError::GitError(format!("failed to execute gh pr create: {}", e))
        })?;

        if output.is_success() {
            Ok(output.stdout.trim().to_string())
        } else {
            Err(ForklineError::GitError(format!(
                "gh pr create failed for '{}': {}",
                workspace.branch,
                output.stderr.trim()
            )))
        }
    }
}

impl Publisher for GitPublisher {
    fn publish(&self, subtask: &str, workspace: &Workspace) -> Result<PublishReport> {
        let mut report = PublishReport {
            committed: self.commit_all(subtask, workspace)?,
            ..Default::default()
        };

        if self.push {
            report.pushed = self.push_branch(workspace)?;
        }

        if self.open_pull_request && report.pushed {
            report.pull_request = Some(self.open_pr(subtask, workspace)?);
        }

        Ok(report)
    }
}

/// First line of the subtask, shortened to a commit-title length.
fn title_for(subtask: &str) -> String {
    let first_line = subtask.trim().lines().next().unwrap_or_default().trim();
    if first_line.chars().count() <= TITLE_MAX_CHARS {
        return first_line.to_string();
    }
    let mut title: String = first_line.chars().take(TITLE_MAX_CHARS - 3).collect();
    title.push_str("...");
    title
}
