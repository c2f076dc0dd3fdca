//! Git command runner for forkline.
//!
//! Provides a safe wrapper around git commands with captured stdout/stderr,
//! bounded execution time, and structured error handling. All git operations
//! should go through this module.

use crate::error::{ForklineError, Result};
use crate::process::{Limits, ProcessOutput, run_process};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Result of a successful git command execution.
#[derive(Debug, Clone)]
pub struct GitOutput {
    /// Standard output from the command (trimmed).
    pub stdout: String,
    /// Standard error from the command (trimmed).
    pub stderr: String,
}

impl GitOutput {
    fn from_output(output: &ProcessOutput) -> Self {
        Self {
            stdout: output.stdout.trim().to_string(),
            stderr: output.stderr.trim().to_string(),
        }
    }

    /// Returns true if stdout is empty.
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty()
    }

    /// Returns stdout lines as a vector.
    pub fn lines(&self) -> Vec<&str> {
        if self.stdout.is_empty() {
            Vec::new()
        } else {
            self.stdout.lines().collect()
        }
    }
}

/// Run a git command with the specified working directory and no time limit.
///
/// # Examples
///
/// ```no_run
/// use forkline::git::run_git;
/// use std::path::Path;
///
/// let output = run_git(Path::new("."), &["status", "--porcelain"])?;
/// println!("Changes: {}", output.stdout);
/// # Ok::<(), forkline::error::ForklineError>(())
/// ```
pub fn run_git<P: AsRef<Path>>(cwd: P, args: &[&str]) -> Result<GitOutput> {
    run_git_with(cwd, args, &Limits::default())
}

/// Run a git command under the given timeout and cancellation limits.
///
/// # Returns
///
/// * `Ok(GitOutput)` - On successful execution (exit code 0)
/// * `Err(ForklineError::GitError)` - On non-zero exit, timeout, or spawn failure
/// * `Err(ForklineError::Cancelled)` - If the run was cancelled mid-command
pub fn run_git_with<P: AsRef<Path>>(cwd: P, args: &[&str], limits: &Limits) -> Result<GitOutput> {
    let cwd = cwd.as_ref();
    let subcommand = args.first().copied().unwrap_or("");

    let mut command = Command::new("git");
    command.current_dir(cwd).args(args);

    let output = run_process(command, limits).map_err(|e| {
        ForklineError::GitError(format!("failed to execute git {}: {}", subcommand, e))
    })?;

    if output.cancelled {
        return Err(ForklineError::Cancelled);
    }
    if output.timed_out {
        return Err(ForklineError::GitError(format!(
            "git {} timed out after {:.1}s",
            subcommand,
            output.duration.as_secs_f64()
        )));
    }

    let git_output = GitOutput::from_output(&output);

    if output.is_success() {
        Ok(git_output)
    } else {
        let exit_code = output.exit_code.unwrap_or(-1);
        let error_msg = if git_output.stderr.is_empty() {
            git_output.stdout.clone()
        } else {
            git_output.stderr.clone()
        };

        Err(ForklineError::GitError(format!(
            "git {} failed (exit code {}): {}",
            subcommand, exit_code, error_msg
        )))
    }
}

/// Get the repository root directory using `git rev-parse --show-toplevel`.
///
/// # Returns
///
/// * `Ok(PathBuf)` - The absolute path to the repository root
/// * `Err(ForklineError::UserError)` - If not inside a git repository
pub fn get_repo_root<P: AsRef<Path>>(cwd: P) -> Result<PathBuf> {
    match run_git(cwd, &["rev-parse", "--show-toplevel"]) {
        Ok(output) => Ok(PathBuf::from(&output.stdout)),
        Err(ForklineError::GitError(msg)) if msg.contains("failed to execute") => Err(
            ForklineError::UserError(format!("{} (is git installed?)", msg)),
        ),
        Err(_) => Err(ForklineError::UserError(
            "not inside a git repository. Run this command from within a git repository."
                .to_string(),
        )),
    }
}

/// Check if the working directory has any uncommitted changes, including
/// untracked files.
pub fn has_uncommitted_changes<P: AsRef<Path>>(cwd: P, limits: &Limits) -> Result<bool> {
    let output = run_git_with(cwd, &["status", "--porcelain"], limits)?;
    Ok(!output.is_empty())
}

/// Check whether a remote with the given name is configured.
pub fn remote_exists<P: AsRef<Path>>(cwd: P, remote: &str, limits: &Limits) -> Result<bool> {
    let remotes = run_git_with(cwd, &["remote"], limits)?;
    Ok(remotes.lines().contains(&remote))
}
