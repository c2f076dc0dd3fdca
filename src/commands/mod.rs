//! Command implementations for forkline.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, plus the config loading they share.

mod backends;
mod plan;
mod run;

use crate::cli::Command;
use forkline::config::Config;
use forkline::error::{ForklineError, Result};
use forkline::exit_codes;
use forkline::git::get_repo_root;
use std::path::{Path, PathBuf};

/// Dispatch a command to its implementation.
///
/// Returns the process exit code for commands that complete without error.
pub fn dispatch(command: Command) -> Result<i32> {
    match command {
        Command::Run(args) => run::cmd_run(args),
        Command::Plan(args) => plan::cmd_plan(args).map(|()| exit_codes::SUCCESS),
        Command::Backends(args) => backends::cmd_backends(args).map(|()| exit_codes::SUCCESS),
    }
}

/// Locate the repository containing the current directory.
fn repo_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir().map_err(|e| {
        ForklineError::UserError(format!("cannot determine current directory: {}", e))
    })?;
    get_repo_root(&cwd)
}

/// Load the explicit config file if one was given, else `forkline.yaml` at
/// the repository root (or the defaults).
fn load_config(repo_root: &Path, explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => load_explicit(path),
        None => Config::load_or_default(repo_root),
    }
}

fn load_explicit(path: &Path) -> Result<Config> {
    let mut config = Config::load(path)?;
    config.apply_env();
    Ok(config)
}

/// Reject goals that are empty after trimming.
fn require_goal(goal: &str) -> Result<&str> {
    let goal = goal.trim();
    if goal.is_empty() {
        return Err(ForklineError::UserError(
            "goal must not be empty".to_string(),
        ));
    }
    Ok(goal)
}
