//! RAII lease over a subtask workspace.

use super::{Workspace, WorkspaceProvider};
use crate::error::Result;
use tracing::warn;

/// Scoped ownership of one subtask's workspace.
///
/// The lease is created before acquisition is attempted and releases the
/// workspace exactly once: either through [`WorkspaceLease::release`] or when
/// dropped, including during unwinding and after a failed acquisition.
pub struct WorkspaceLease<'a> {
    provider: &'a dyn WorkspaceProvider,
    subtask: &'a str,
    released: bool,
}

impl<'a> WorkspaceLease<'a> {
    pub fn new(provider: &'a dyn WorkspaceProvider, subtask: &'a str) -> Self {
        Self {
            provider,
            subtask,
            released: false,
        }
    }

    /// Acquire the workspace. A failure still leaves the lease responsible
    /// for releasing whatever partial state acquisition left behind.
    pub fn acquire(&self) -> Result<Workspace> {
        self.provider.acquire(self.subtask)
    }

    /// Release the workspace now and report the outcome.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.provider.release(self.subtask)
    }
}

impl Drop for WorkspaceLease<'_> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.provider.release(self.subtask)
        {
            warn!(subtask = self.subtask, error = %e, "failed to release workspace");
        }
    }
}
