//! Removal of subtask workspaces.

use crate::error::{ForklineError, Result};
use crate::git::run_git_with;
use crate::process::Limits;
use std::path::Path;
use tracing::{debug, warn};

/// Remove a workspace directory. The branch it was bound to is left alone.
///
/// Tries `git worktree remove --force` first and falls back to deleting the
/// directory tree, then prunes stale worktree registrations. A missing
/// directory is not an error.
///
/// # Returns
///
/// * `Ok(true)` - A workspace directory was removed
/// * `Ok(false)` - Nothing existed at `worktree_path`
/// * `Err(ForklineError::WorkspaceError)` - The directory could not be deleted
pub fn remove_workspace<P: AsRef<Path>>(
    repo_root: P,
    worktree_path: &Path,
    limits: &Limits,
) -> Result<bool> {
    let repo_root = repo_root.as_ref();

    if !worktree_path.exists() {
        prune_worktrees(repo_root, limits);
        return Ok(false);
    }

    let worktree_str = worktree_path.to_string_lossy();
    if let Err(e) = run_git_with(
        repo_root,
        &["worktree", "remove", "--force", &worktree_str],
        limits,
    ) {
        debug!(path = %worktree_path.display(), error = %e, "git worktree remove failed, deleting directory");
    }

    if worktree_path.exists() {
        std::fs::remove_dir_all(worktree_path).map_err(|e| {
            ForklineError::WorkspaceError(format!(
                "failed to delete workspace directory '{}': {}",
                worktree_path.display(),
                e
            ))
        })?;
    }

    prune_worktrees(repo_root, limits);
    Ok(true)
}

/// Drop worktree registrations whose directories no longer exist.
fn prune_worktrees(repo_root: &Path, limits: &Limits) {
    if let Err(e) = run_git_with(repo_root, &["worktree", "prune"], limits) {
        warn!(error = %e, "git worktree prune failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_repo, git};
    use crate::workspace::branch::branch_exists;
    use crate::workspace::worktree::{add_worktree, list_worktree_paths};

    #[test]
    fn test_remove_workspace_keeps_branch() {
        let repo = create_test_repo();
        let limits = Limits::default();
        let path = repo.path().join(".worktrees").join("keep");
        add_worktree(repo.path(), &path, "forkline/keep", &limits).unwrap();
        std::fs::write(path.join("dirty.txt"), "uncommitted\n").unwrap();

        assert!(remove_workspace(repo.path(), &path, &limits).unwrap());

        assert!(!path.exists());
        assert!(branch_exists(repo.path(), "forkline/keep", &limits).unwrap());
        assert_eq!(list_worktree_paths(repo.path(), &limits).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_workspace_missing_is_noop() {
        let repo = create_test_repo();
        let path = repo.path().join(".worktrees").join("never-created");

        assert!(!remove_workspace(repo.path(), &path, &Limits::default()).unwrap());
    }

    #[test]
    fn test_remove_workspace_falls_back_to_directory_delete() {
        let repo = create_test_repo();
        let path = repo.path().join(".worktrees").join("plain");
        std::fs::create_dir_all(path.join("nested")).unwrap();
        std::fs::write(path.join("nested").join("leftover.txt"), "x").unwrap();

        // Not a registered worktree, so `git worktree remove` fails.
        assert!(remove_workspace(repo.path(), &path, &Limits::default()).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_workspace_prunes_registration_of_deleted_dir() {
        let repo = create_test_repo();
        let limits = Limits::default();
        let path = repo.path().join(".worktrees").join("gone");
        add_worktree(repo.path(), &path, "forkline/gone", &limits).unwrap();
        std::fs::remove_dir_all(&path).unwrap();

        remove_workspace(repo.path(), &path, &limits).unwrap();

        // The branch is no longer considered checked out anywhere.
        let other = repo.path().join(".worktrees").join("again");
        git(
            repo.path(),
            &["worktree", "add", &other.to_string_lossy(), "forkline/gone"],
        );
    }
}
