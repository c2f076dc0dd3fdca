//! Isolated per-subtask workspaces backed by git worktrees.
//!
//! Each subtask gets a private working directory `<base>/<slug>` checked out
//! on its own branch `<prefix>/<slug>`, so concurrent workers never touch the
//! same files:
//!
//! - Deriving slugs, branch names, and paths
//! - Creating worktrees (reusing an existing branch if one is left over)
//! - Removing worktrees without deleting their branches
//! - Committing and pushing verified work
//!
//! All git calls run under the configured timeout and the run's cancel token.

mod branch;
mod cleanup;
mod lease;
mod naming;
mod publish;
mod worktree;

// Re-export public API
pub use branch::branch_exists;
pub use cleanup::remove_workspace;
pub use lease::WorkspaceLease;
pub use naming::{branch_name, slugify, workspace_path};
pub use publish::{GitPublisher, PublishReport, Publisher};
pub use worktree::{BranchOrigin, add_worktree, list_worktree_paths};

use crate::error::Result;
use crate::process::{CancelToken, Limits};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// A workspace handed to a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    /// Sanitized identifier derived from the subtask text.
    pub slug: String,
    /// Branch checked out in the workspace.
    pub branch: String,
    /// Absolute path of the working directory.
    pub path: PathBuf,
    /// Whether the branch already existed before this acquisition.
    pub reused_branch: bool,
}

/// Creates and destroys subtask workspaces.
pub trait WorkspaceProvider: Send + Sync {
    /// Prepare a fresh workspace for `subtask`, destroying any stale one first.
    fn acquire(&self, subtask: &str) -> Result<Workspace>;

    /// Remove the workspace for `subtask`. Releasing a missing workspace is a no-op.
    fn release(&self, subtask: &str) -> Result<()>;
}

/// [`WorkspaceProvider`] backed by `git worktree`.
#[derive(Debug, Clone)]
pub struct GitWorkspaceManager {
    repo_root: PathBuf,
    base_dir: PathBuf,
    branch_prefix: String,
    limits: Limits,
    /// Serializes worktree metadata changes across workers.
    git_lock: Arc<Mutex<()>>,
}

impl GitWorkspaceManager {
    /// Create a manager for `repo_root`. A relative `base_dir` is resolved
    /// against the repository root.
    pub fn new(
        repo_root: impl Into<PathBuf>,
        base_dir: impl AsRef<Path>,
        branch_prefix: impl Into<String>,
        limits: Limits,
    ) -> Self {
        let repo_root = repo_root.into();
        let base_dir = base_dir.as_ref();
        let base_dir = if base_dir.is_absolute() {
            base_dir.to_path_buf()
        } else {
            repo_root.join(base_dir)
        };

        Self {
            repo_root,
            base_dir,
            branch_prefix: branch_prefix.into(),
            limits,
            git_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path the workspace for `subtask` lives at.
    pub fn path_for(&self, subtask: &str) -> PathBuf {
        workspace_path(&self.base_dir, &slugify(subtask))
    }

    /// Branch the workspace for `subtask` is bound to.
    pub fn branch_for(&self, subtask: &str) -> String {
        branch_name(&self.branch_prefix, &slugify(subtask))
    }

    fn lock_git(&self) -> MutexGuard<'_, ()> {
        self.git_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WorkspaceProvider for GitWorkspaceManager {
    fn acquire(&self, subtask: &str) -> Result<Workspace> {
        let slug = slugify(subtask);
        let path = workspace_path(&self.base_dir, &slug);
        let branch = branch_name(&self.branch_prefix, &slug);
        let _git = self.lock_git();

        if remove_workspace(&self.repo_root, &path, &self.limits)? {
            info!(slug = %slug, path = %path.display(), "removed stale workspace");
        }

        let origin = add_worktree(&self.repo_root, &path, &branch, &self.limits)?;
        if origin == BranchOrigin::Reused {
            warn!(slug = %slug, branch = %branch, "branch already existed, continuing from its last commit");
        }

        info!(slug = %slug, branch = %branch, path = %path.display(), "workspace ready");

        Ok(Workspace {
            slug,
            branch,
            path,
            reused_branch: origin == BranchOrigin::Reused,
        })
    }

    fn release(&self, subtask: &str) -> Result<()> {
        let path = self.path_for(subtask);
        // Cleanup must still happen after the run has been cancelled.
        let limits = Limits::new(self.limits.timeout, CancelToken::new());
        let _git = self.lock_git();
        if remove_workspace(&self.repo_root, &path, &limits)? {
            info!(path = %path.display(), "workspace released");
        }
        Ok(())
    }
}
