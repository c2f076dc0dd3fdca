//! Verification of a subtask's workspace.
//!
//! A verification command is run through the platform shell inside the
//! workspace. Its exit status alone decides the outcome; the captured output
//! becomes the feedback for the next attempt.

use crate::error::{ForklineError, Result};
use crate::process::{Limits, run_process, shell_command};
use std::path::Path;
use tracing::debug;

/// Result of running the verification command once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    /// True iff the command exited with status zero.
    pub passed: bool,
    /// Standard output followed by standard error.
    pub log: String,
}

/// Run `command` in `working_dir` and classify the result.
///
/// # Returns
///
/// * `Ok(outcome)` - The command ran; a non-zero exit or a timeout is a failed outcome
/// * `Err(ForklineError::VerifyError)` - The process could not be started
/// * `Err(ForklineError::Cancelled)` - The run was cancelled while verifying
pub fn verify(command: &str, working_dir: &Path, limits: &Limits) -> Result<VerificationOutcome> {
    let mut cmd = shell_command(command);
    cmd.current_dir(working_dir);

    let output = run_process(cmd, limits).map_err(|e| {
        ForklineError::VerifyError(format!(
            "failed to start '{}' in '{}': {}",
            command,
            working_dir.display(),
            e
        ))
    })?;

    if output.cancelled {
        return Err(ForklineError::Cancelled);
    }

    let mut log = output.combined();
    if output.timed_out {
        if !log.is_empty() && !log.ends_with('\n') {
            log.push('\n');
        }
        log.push_str(&format!(
            "verification timed out after {:.1}s\n",
            output.duration.as_secs_f64()
        ));
    }

    debug!(
        command,
        exit_code = ?output.exit_code,
        timed_out = output.timed_out,
        log_bytes = log.len(),
        "verification finished"
    );

    Ok(VerificationOutcome {
        passed: output.is_success(),
        log,
    })
}

/// Guess a test command from the project files present in `dir`.
///
/// Falls back to `python3 -m pytest` when nothing is recognized.
pub fn detect_verify_command(dir: &Path) -> &'static str {
    if dir.join("Cargo.toml").exists() {
        "cargo test"
    } else if dir.join("package.json").exists() {
        if dir.join("yarn.lock").exists() {
            "yarn test"
        } else if dir.join("pnpm-lock.yaml").exists() {
            "pnpm test"
        } else {
            "npm test"
        }
    } else {
        "python3 -m pytest"
    }
}

/// Judges whether a workspace is acceptable.
pub trait Verifier: Send + Sync {
    fn verify(&self, workspace: &Path) -> Result<VerificationOutcome>;
}

/// [`Verifier`] running a shell command, either configured or detected per workspace.
#[derive(Debug, Clone)]
pub struct CommandVerifier {
    command: Option<String>,
    limits: Limits,
}

impl CommandVerifier {
    pub fn new(command: Option<String>, limits: Limits) -> Self {
        Self { command, limits }
    }

    /// Command that will run for `workspace`.
    pub fn command_for(&self, workspace: &Path) -> String {
        match &self.command {
            Some(cmd) => cmd.clone(),
            None => detect_verify_command(workspace).to_string(),
        }
    }
}

impl Verifier for CommandVerifier {
    fn verify(&self, workspace: &Path) -> Result<VerificationOutcome> {
        verify(&self.command_for(workspace), workspace, &self.limits)
    }
}
