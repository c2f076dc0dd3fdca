//! The orchestration engine.
//!
//! `Orchestrator::run` plans a goal into subtasks and hands them, in plan
//! order, to a fixed pool of worker threads. Each worker owns one subtask end
//! to end:
//!
//! ```text
//! Pending -> Acquiring -> Attempting(n) -> Verifying -> Succeeded
//!                 |              |             |-> Retrying(n+1) -> Attempting(n+1)
//!                 |              |             `-> ExhaustedRetries
//!                 `--------------`-> FailedException
//! (every path) -> Releasing -> terminal
//! ```
//!
//! Results are collected in completion order. One subtask's failure never
//! affects its siblings.

mod claims;
mod feedback;
mod result;
mod worker;


pub use claims::{SlugClaim, SlugClaims};
pub use feedback::retry_request;
pub use result::{Attempt, RunResult, SubtaskOutcome, SubtaskResult};

use crate::backend::{self, ExecutionBackend};
use crate::config::Config;
use crate::error::{ForklineError, Result};
use crate::planner::{self, Planner};
use crate::process::{CancelToken, Limits};
use crate::verify::{CommandVerifier, Verifier};
use crate::workspace::{GitPublisher, GitWorkspaceManager, Publisher, WorkspaceProvider};
use chrono::Utc;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::mpsc;
use std::sync::{Mutex, PoisonError};
use std::thread;
use tracing::{info, warn};
use worker::WorkerContext;

/// Scheduling and retry bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Worker pool size.
    pub max_workers: usize,
    /// Attempts per subtask, including the first.
    pub max_retries: u32,
    /// Characters of verification output carried into a retry request.
    pub feedback_tail_chars: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_workers: 4,
            max_retries: 3,
            feedback_tail_chars: 2000,
        }
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_workers: config.max_workers,
            max_retries: config.max_retries,
            feedback_tail_chars: config.feedback_tail_chars,
        }
    }
}

pub struct Orchestrator {
    planner: Box<dyn Planner>,
    workspaces: Box<dyn WorkspaceProvider>,
    backend: Box<dyn ExecutionBackend>,
    verifier: Box<dyn Verifier>,
    publisher: Box<dyn Publisher>,
    settings: OrchestratorSettings,
    cancel: CancelToken,
}

impl Orchestrator {
    pub fn new(
        planner: Box<dyn Planner>,
        workspaces: Box<dyn WorkspaceProvider>,
        backend: Box<dyn ExecutionBackend>,
        verifier: Box<dyn Verifier>,
        publisher: Box<dyn Publisher>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            planner,
            workspaces,
            backend,
            verifier,
            publisher,
            settings,
            cancel: CancelToken::new(),
        }
    }

    /// Wire up the git-backed collaborators for the repository at `repo_root`.
    /// Every subprocess they start shares one cancellation token.
    pub fn from_config(config: &Config, repo_root: &Path) -> Result<Self> {
        let cancel = CancelToken::new();
        let git_limits = Limits::with_timeout_secs(config.git_timeout_seconds, cancel.clone());

        let workspaces = GitWorkspaceManager::new(
            repo_root,
            &config.worktree_base,
            config.branch_prefix.clone(),
            git_limits.clone(),
        );
        let verifier = CommandVerifier::new(
            config.verify_command.clone(),
            Limits::with_timeout_secs(config.verify_timeout_seconds, cancel.clone()),
        );
        let publisher = GitPublisher::new(
            config.remote.clone(),
            config.push_on_success,
            config.open_pull_request,
            git_limits,
        );

        Ok(Self::new(
            planner::from_config(config)?,
            Box::new(workspaces),
            backend::resolve(config, cancel.clone())?,
            Box::new(verifier),
            Box::new(publisher),
            OrchestratorSettings::from_config(config),
        )
        .with_cancel_token(cancel))
    }

    /// Use `cancel` for pending-subtask checks. Collaborators must share it
    /// for in-flight subprocesses to be killed.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the run: pending and in-flight subtasks finish as
    /// `FailedWithException { message: "cancelled" }`.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn backend(&self) -> &dyn ExecutionBackend {
        self.backend.as_ref()
    }

    /// Plan `goal`. Never empty.
    pub fn plan(&self, goal: &str) -> Vec<String> {
        let subtasks = self.planner.plan(goal);
        if subtasks.is_empty() {
            warn!("planner returned no subtasks, running goal as a single task");
            return vec![goal.to_string()];
        }
        subtasks
    }

    /// Plan and execute `goal`.
    ///
    /// # Returns
    ///
    /// * `Ok(RunResult)` - One result per planned subtask, in completion order
    /// * `Err(ForklineError::ConfigError)` - The backend is interactive
    pub fn run(&self, goal: &str) -> Result<RunResult> {
        self.ensure_headless()?;
        let subtasks = self.plan(goal);
        info!(count = subtasks.len(), "plan ready");
        Ok(self.execute(goal, subtasks))
    }

    /// Execute an already-planned list of subtasks.
    pub fn run_subtasks(&self, goal: &str, subtasks: Vec<String>) -> Result<RunResult> {
        self.ensure_headless()?;
        Ok(self.execute(goal, subtasks))
    }

    fn ensure_headless(&self) -> Result<()> {
        if self.backend.is_interactive() {
            return Err(ForklineError::ConfigError(format!(
                "backend '{}' is interactive and cannot run unattended in a concurrent run. \
                 Choose a non-interactive backend or set backends.{}.interactive: false",
                self.backend.id(),
                self.backend.id()
            )));
        }
        Ok(())
    }

    fn execute(&self, goal: &str, subtasks: Vec<String>) -> RunResult {
        let started_at = Utc::now();
        let total = subtasks.len();
        let pool_size = self.settings.max_workers.clamp(1, total.max(1));

        let queue = Mutex::new(VecDeque::from(subtasks));
        let claims = SlugClaims::new();
        let ctx = WorkerContext {
            workspaces: self.workspaces.as_ref(),
            backend: self.backend.as_ref(),
            verifier: self.verifier.as_ref(),
            publisher: self.publisher.as_ref(),
            settings: &self.settings,
            claims: &claims,
            cancel: &self.cancel,
        };

        info!(subtasks = total, workers = pool_size, "dispatching");

        let mut results = Vec::with_capacity(total);
        let (tx, rx) = mpsc::channel();

        thread::scope(|s| {
            let ctx = &ctx;
            let queue = &queue;
            for _ in 0..pool_size {
                let tx = tx.clone();
                s.spawn(move || {
                    loop {
                        let next = queue
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .pop_front();
                        let Some(subtask) = next else { break };
                        if tx.send(worker::process(ctx, &subtask)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(tx);

            for result in rx {
                info!(
                    slug = %result.slug,
                    outcome = result.outcome.label(),
                    done = results.len() + 1,
                    total,
                    "subtask finished"
                );
                results.push(result);
            }
        });

        let run = RunResult {
            goal: goal.to_string(),
            total,
            results,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            succeeded = run.succeeded(),
            failed = run.failed(),
            "run finished"
        );
        run
    }
}
