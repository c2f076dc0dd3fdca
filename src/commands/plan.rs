//! Implementation of the `forkline plan` command.

use super::{load_config, repo_root, require_goal};
use crate::cli::PlanArgs;
use forkline::error::{ForklineError, Result};
use forkline::planner;
use forkline::workspace::slugify;

/// Execute the `forkline plan` command.
///
/// Prints the subtasks and the workspace slug each one would get. Nothing is
/// created or run.
pub fn cmd_plan(args: PlanArgs) -> Result<()> {
    let goal = require_goal(&args.goal)?;
    let repo_root = repo_root()?;
    let config = load_config(&repo_root, args.config.as_deref())?;

    let mut subtasks = planner::from_config(&config)?.plan(goal);
    if subtasks.is_empty() {
        subtasks.push(goal.to_string());
    }

    if args.json {
        let json = serde_json::to_string_pretty(&subtasks)
            .map_err(|e| ForklineError::UserError(format!("failed to serialize plan: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    println!("Plan for: {}", goal);
    println!();
    for (i, subtask) in subtasks.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, subtask);
        println!("      branch: {}/{}", config.branch_prefix, slugify(subtask));
    }
    println!();
    println!("{} subtask(s)", subtasks.len());

    Ok(())
}
