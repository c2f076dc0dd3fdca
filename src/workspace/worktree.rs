//! Worktree creation for subtask workspaces.

use crate::error::{ForklineError, Result};
use crate::git::run_git_with;
use crate::process::Limits;
use std::path::Path;

use super::branch::branch_exists;

/// How a workspace's branch was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchOrigin {
    /// A new branch was created from the repository HEAD.
    Created,
    /// The branch already existed (e.g. from an earlier run) and was checked out.
    Reused,
}

/// Create a worktree at `worktree_path` on a new branch `branch`.
///
/// If creating the branch fails because it already exists, the existing
/// branch is checked out into the new worktree instead. Any other failure is
/// returned as a git error.
pub fn add_worktree<P: AsRef<Path>>(
    repo_root: P,
    worktree_path: &Path,
    branch: &str,
    limits: &Limits,
) -> Result<BranchOrigin> {
    let repo_root = repo_root.as_ref();
    let worktree_str = worktree_path.to_string_lossy();

    if let Some(parent) = worktree_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ForklineError::WorkspaceError(format!(
                "failed to create worktree base directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let created = run_git_with(
        repo_root,
        &["worktree", "add", "-b", branch, &worktree_str],
        limits,
    );

    match created {
        Ok(_) => Ok(BranchOrigin::Created),
        Err(ForklineError::Cancelled) => Err(ForklineError::Cancelled),
        Err(create_err) => {
            if !branch_exists(repo_root, branch, limits)? {
                return Err(create_err);
            }

            run_git_with(repo_root, &["worktree", "add", &worktree_str, branch], limits).map_err(
                |e| match e {
                    ForklineError::Cancelled => ForklineError::Cancelled,
                    other => ForklineError::GitError(format!(
                        "failed to check out existing branch '{}' into '{}': {}",
                        branch, worktree_str, other
                    )),
                },
            )?;

            Ok(BranchOrigin::Reused)
        }
    }
}

/// List the paths of all registered worktrees.
pub fn list_worktree_paths<P: AsRef<Path>>(
    repo_root: P,
    limits: &Limits,
) -> Result<Vec<std::path::PathBuf>> {
    let output = run_git_with(repo_root, &["worktree", "list", "--porcelain"], limits)?;

    Ok(output
        .stdout
        .lines()
        .filter_map(|line| line.strip_prefix("worktree "))
        .map(std::path::PathBuf::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_repo, git};

    #[test]
    fn test_add_worktree_creates_branch() {
        let repo = create_test_repo();
        let path = repo.path().join(".worktrees").join("one");

        let origin = add_worktree(repo.path(), &path, "forkline/one", &Limits::default()).unwrap();

        assert_eq!(origin, BranchOrigin::Created);
        assert!(path.join("README.md").exists());
        assert_eq!(
            git(&path, &["rev-parse", "--abbrev-ref", "HEAD"]),
            "forkline/one"
        );
    }

    #[test]
    fn test_add_worktree_reuses_existing_branch() {
        let repo = create_test_repo();
        git(repo.path(), &["branch", "forkline/two"]);
        let path = repo.path().join(".worktrees").join("two");

        let origin = add_worktree(repo.path(), &path, "forkline/two", &Limits::default()).unwrap();

        assert_eq!(origin, BranchOrigin::Reused);
        assert_eq!(
            git(&path, &["rev-parse", "--abbrev-ref", "HEAD"]),
            "forkline/two"
        );
    }

    #[test]
    fn test_add_worktree_other_failure_is_git_error() {
        let repo = create_test_repo();
        // An invalid ref name makes branch creation fail without the branch existing.
        let path = repo.path().join(".worktrees").join("bad");

        let err = add_worktree(repo.path(), &path, "bad..name", &Limits::default()).unwrap_err();
        assert!(matches!(err, ForklineError::GitError(_)));
    }

    #[test]
    fn test_list_worktree_paths() {
        let repo = create_test_repo();
        assert_eq!(
            list_worktree_paths(repo.path(), &Limits::default())
                .unwrap()
                .len(),
            1
        );

        let path = repo.path().join(".worktrees").join("listed");
        add_worktree(repo.path(), &path, "forkline/listed", &Limits::default()).unwrap();
        assert_eq!(
            list_worktree_paths(repo.path(), &Limits::default())
                .unwrap()
                .len(),
            2
        );
    }
}
