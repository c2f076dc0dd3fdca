//! Exit code constants for the forkline CLI.
//!
//! - 0: Success (every subtask succeeded)
//! - 1: User error (bad args, invalid config)
//! - 2: One or more subtasks failed
//! - 3: Git operation failure outside of a subtask
//! - 130: Interrupted twice; the run was abandoned without cleanup

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or invalid configuration.
pub const USER_ERROR: i32 = 1;

/// The run finished but at least one subtask did not succeed.
pub const SUBTASK_FAILURE: i32 = 2;

/// Git operation failure: repository detection, worktree setup.
pub const GIT_FAILURE: i32 = 3;

/// A second Ctrl-C arrived while the first was still cancelling the run.
pub const INTERRUPTED: i32 = 130;
