//! CLI argument parsing for forkline.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// forkline: fan a coding goal out into subtasks, one git worktree each.
///
/// Every subtask is handed to an execution backend, checked with a
/// verification command, and retried with the failure output until it
/// passes or runs out of attempts.
#[derive(Parser, Debug)]
#[command(name = "forkline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log at debug level (overrides FORKLINE_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for forkline.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Plan a goal and execute every subtask concurrently.
    ///
    /// Each subtask runs in its own worktree on branch `<prefix>/<slug>`.
    /// Exits with code 2 if any subtask did not succeed.
    Run(RunArgs),

    /// Print the subtasks a goal would be split into, without running them.
    Plan(PlanArgs),

    /// List the known execution backends.
    Backends(BackendsArgs),
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// The high-level goal to accomplish.
    pub goal: String,

    /// Execution backend identifier (see `forkline backends`).
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Number of concurrent workers.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Attempts per subtask, including the first.
    #[arg(short, long)]
    pub retries: Option<u32>,

    /// Verification command run inside each workspace.
    #[arg(long)]
    pub verify: Option<String>,

    /// Skip planning and run the goal as a single subtask.
    #[arg(long)]
    pub no_plan: bool,

    /// Do not push successful branches.
    #[arg(long)]
    pub no_push: bool,

    /// Config file to use instead of `forkline.yaml` at the repository root.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the run result as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `plan` command.
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// The high-level goal to split.
    pub goal: String,

    /// Config file to use instead of `forkline.yaml` at the repository root.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the plan as a JSON array.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `backends` command.
#[derive(Parser, Debug)]
pub struct BackendsArgs {
    /// Config file to use instead of `forkline.yaml` at the repository root.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
