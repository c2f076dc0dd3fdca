//! Error types for forkline.
//!
//! Uses thiserror for derive macros. Variants are coarse on purpose: the
//! orchestrator only needs to know which failures are fatal for a subtask,
//! and the CLI only needs an exit code.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for forkline operations.
#[derive(Error, Debug)]
pub enum ForklineError {
    /// User provided invalid arguments or the system is in an invalid state.
    #[error("{0}")]
    UserError(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Git operation failed.
    #[error("Git operation failed: {0}")]
    GitError(String),

    /// Workspace directory could not be prepared or removed.
    #[error("Workspace error: {0}")]
    WorkspaceError(String),

    /// Execution backend could not run at all.
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Verification command could not be started.
    #[error("Verification could not run: {0}")]
    VerifyError(String),

    /// The run was cancelled before the operation completed.
    #[error("cancelled")]
    Cancelled,
}

impl ForklineError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ForklineError::UserError(_) | ForklineError::ConfigError(_) => exit_codes::USER_ERROR,
            ForklineError::GitError(_) | ForklineError::WorkspaceError(_) => {
                exit_codes::GIT_FAILURE
            }
            ForklineError::BackendError(_)
            | ForklineError::VerifyError(_)
            | ForklineError::Cancelled => exit_codes::SUBTASK_FAILURE,
        }
    }
}

/// Result type alias for forkline operations.
pub type Result<T> = std::result::Result<T, ForklineError>;
