//! forkline: fan a coding goal out into subtasks and run each one in its own
//! git worktree.
//!
//! A goal is split by a [`planner`] into independent subtasks. The
//! [`orchestrator`] hands them to a bounded pool of workers; each worker gets
//! a private [`workspace`], asks an execution [`backend`] to do the work, runs
//! the [`verify`] command, and feeds failures back into a retry until the
//! attempt budget runs out.

pub mod agent;
pub mod backend;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod git;
pub mod logging;
pub mod orchestrator;
pub mod planner;
pub mod process;
pub mod verify;
pub mod workspace;

#[cfg(test)]
pub(crate) mod test_support;
