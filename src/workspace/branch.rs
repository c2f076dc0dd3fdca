//! Branch queries for subtask workspaces.
//!
//! Subtask branches are created as part of `git worktree add -b` and are
//! never deleted by forkline, so the only operation needed here is a lookup.

use crate::error::{ForklineError, Result};
use crate::process::{Limits, run_process};
use std::path::Path;
use std::process::Command;

/// Check if a branch exists locally.
///
/// Only a missing ref answers `false`. Cancellation, a timeout, or git
/// failing for any other reason is an error, so a slow repository is never
/// mistaken for a fresh branch name.
pub fn branch_exists<P: AsRef<Path>>(repo_root: P, branch: &str, limits: &Limits) -> Result<bool> {
    if limits.cancel.is_cancelled() {
        return Err(ForklineError::Cancelled);
    }

    let mut command = Command::new("git");
    command.current_dir(repo_root.as_ref()).args([
        "rev-parse",
        "--verify",
        "--quiet",
        &format!("refs/heads/{}", branch),
    ]);

    let output = run_process(command, limits).map_err(|e| {
        ForklineError::GitError(format!("failed to execute git rev-parse: {}", e))
    })?;

    if output.cancelled {
        return Err(ForklineError::Cancelled);
    }
    if output.timed_out {
        return Err(ForklineError::GitError(format!(
            "git rev-parse timed out after {:.1}s",
            output.duration.as_secs_f64()
        )));
    }

    // `--verify --quiet` exits 1 for a ref that does not exist.
    match output.exit_code {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        code => Err(ForklineError::GitError(format!(
            "git rev-parse failed (exit code {}): {}",
            code.unwrap_or(-1),
            output.stderr.trim()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::CancelToken;
    use crate::test_support::{create_test_repo, git};
    use tempfile::TempDir;

    #[test]
    fn test_branch_exists() {
        let repo = create_test_repo();
        let limits = Limits::default();

        assert!(branch_exists(repo.path(), "main", &limits).unwrap());
        assert!(!branch_exists(repo.path(), "forkline/nonexistent", &limits).unwrap());

        git(repo.path(), &["branch", "forkline/present"]);
        assert!(branch_exists(repo.path(), "forkline/present", &limits).unwrap());
    }

    #[test]
    fn test_branch_exists_cancelled_is_error() {
        let repo = create_test_repo();
        let cancel = CancelToken::new();
        cancel.cancel();
        let limits = Limits::new(None, cancel);

        assert!(matches!(
            branch_exists(repo.path(), "main", &limits),
            Err(ForklineError::Cancelled)
        ));
    }

    #[test]
    fn test_branch_exists_outside_repository_is_error() {
        let dir = TempDir::new().unwrap();
        let result = branch_exists(dir.path(), "main", &Limits::default());
        assert!(matches!(result, Err(ForklineError::GitError(_))));
    }
}
