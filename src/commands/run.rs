//! Implementation of the `forkline run` command.

use super::{load_config, repo_root, require_goal};
use crate::cli::RunArgs;
use forkline::config::Config;
use forkline::error::{ForklineError, Result};
use forkline::exit_codes;
use forkline::orchestrator::{Orchestrator, RunResult, SubtaskOutcome, SubtaskResult};
use forkline::process::CancelToken;
use tracing::{info, warn};

/// Lines of verification output shown for a subtask that ran out of attempts.
const LOG_LINES_SHOWN: usize = 5;

/// Execute the `forkline run` command.
pub fn cmd_run(args: RunArgs) -> Result<i32> {
    let goal = require_goal(&args.goal)?.to_string();
    let repo_root = repo_root()?;
    let mut config = load_config(&repo_root, args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let orchestrator = Orchestrator::from_config(&config, &repo_root)?;
    cancel_on_interrupt(orchestrator.cancel_token())?;
    info!(
        backend = orchestrator.backend().id(),
        workers = orchestrator.settings().max_workers,
        retries = orchestrator.settings().max_retries,
        repo = %repo_root.display(),
        "starting run"
    );

    let run = orchestrator.run(&goal)?;

    if args.json {
        let json = serde_json::to_string_pretty(&run).map_err(|e| {
            ForklineError::UserError(format!("failed to serialize run result: {}", e))
        })?;
        println!("{}", json);
    } else {
        print_summary(&run, orchestrator.backend().id());
    }

    Ok(if run.all_succeeded() {
        exit_codes::SUCCESS
    } else {
        exit_codes::SUBTASK_FAILURE
    })
}

/// Route Ctrl-C to the run's cancellation token.
///
/// The first interrupt cancels the run, which kills in-flight subprocesses
/// and still releases every workspace. A second one exits immediately.
fn cancel_on_interrupt(cancel: CancelToken) -> Result<()> {
    ctrlc::set_handler(move || {
        if !on_interrupt(&cancel) {
            std::process::exit(exit_codes::INTERRUPTED);
        }
    })
    .map_err(|e| ForklineError::UserError(format!("failed to install Ctrl-C handler: {}", e)))
}

/// Cancel the run. Returns false if it was already cancelled.
fn on_interrupt(cancel: &CancelToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    warn!("interrupt received, cancelling run (press Ctrl-C again to exit now)");
    cancel.cancel();
    true
}

/// Command line flags win over the config file.
fn apply_overrides(config: &mut Config, args: &RunArgs) {
    if let Some(backend) = &args.backend {
        config.backend = backend.clone();
    }
    if let Some(workers) = args.workers {
        config.max_workers = workers;
    }
    if let Some(retries) = args.retries {
        config.max_retries = retries;
    }
    if let Some(verify) = &args.verify {
        config.verify_command = Some(verify.clone());
    }
    if args.no_plan {
        config.planner.enabled = false;
    }
    if args.no_push {
        config.push_on_success = false;
        config.open_pull_request = false;
    }
}

fn print_summary(run: &RunResult, backend: &str) {
    println!("Goal: {}", run.goal);
    println!("Backend: {}", backend);
    println!();

    for result in &run.results {
        print_result(result);
    }

    println!();
    let elapsed = (run.finished_at - run.started_at).num_milliseconds() as f64 / 1000.0;
    println!(
        "{} of {} subtasks succeeded in {:.1}s.",
        run.succeeded(),
        run.total,
        elapsed
    );
}

fn print_result(result: &SubtaskResult) {
    let tag = match result.outcome {
        SubtaskOutcome::Succeeded { .. } => "ok",
        SubtaskOutcome::FailedAfterRetries { .. } => "FAIL",
        SubtaskOutcome::FailedWithException { .. } => "ERROR",
    };
    println!("[{:5}] {}", tag, result.subtask);

    if let Some(branch) = &result.branch {
        println!("        branch: {}", branch);
    }
    println!(
        "        attempts: {}, took {:.1}s",
        result.attempts.len(),
        result.duration.as_secs_f64()
    );

    match &result.outcome {
        SubtaskOutcome::Succeeded { .. } => {
            if let Some(published) = &result.published {
                if let Some(url) = &published.pull_request {
                    println!("        pull request: {}", url);
                } else if published.pushed {
                    println!("        pushed");
                }
            }
        }
        SubtaskOutcome::FailedAfterRetries { last_log, .. } => {
            let lines: Vec<&str> = last_log.lines().collect();
            let start = lines.len().saturating_sub(LOG_LINES_SHOWN);
            println!("        last verification output:");
            for line in &lines[start..] {
                println!("          {}", line);
            }
        }
        SubtaskOutcome::FailedWithException { message } => {
            println!("        error: {}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["forkline", "run"];
        full.extend_from_slice(argv);
        match crate::cli::Cli::try_parse_from(full).unwrap().command {
            crate::cli::Command::Run(args) => args,
            other => panic!("Expected Run command, got {:?}", other),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        let args = run_args(&[
            "goal",
            "--backend",
            "codex",
            "--workers",
            "8",
            "--retries",
            "1",
            "--verify",
            "make check",
            "--no-plan",
            "--no-push",
        ]);

        apply_overrides(&mut config, &args);

        assert_eq!(config.backend, "codex");
        assert_eq!(config.max_workers, 8);
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.verify_command.as_deref(), Some("make check"));
        assert!(!config.planner.enabled);
        assert!(!config.push_on_success);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let mut config = Config::default();
        apply_overrides(&mut config, &run_args(&["goal"]));

        let defaults = Config::default();
        assert_eq!(config.backend, defaults.backend);
        assert_eq!(config.max_workers, defaults.max_workers);
        assert_eq!(config.max_retries, defaults.max_retries);
        assert_eq!(config.verify_command, defaults.verify_command);
        assert!(config.planner.enabled);
        assert!(config.push_on_success);
    }

    #[test]
    fn test_first_interrupt_cancels_run() {
        let cancel = CancelToken::new();
        assert!(on_interrupt(&cancel));
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_second_interrupt_asks_to_exit() {
        let cancel = CancelToken::new();
        assert!(on_interrupt(&cancel));
        assert!(!on_interrupt(&cancel));
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_zero_workers_rejected_after_override() {
        let mut config = Config::default();
        apply_overrides(&mut config, &run_args(&["goal", "--workers", "0"]));
        assert!(matches!(
            config.validate(),
            Err(ForklineError::ConfigError(_))
        ));
    }
}
