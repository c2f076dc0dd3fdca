//! One subtask, end to end: acquire, attempt loop, publish, release.

use super::OrchestratorSettings;
use super::claims::SlugClaims;
use super::feedback::retry_request;
use super::result::{Attempt, SubtaskOutcome, SubtaskResult};
use crate::backend::{ExecutionBackend, is_failure_output};
use crate::error::ForklineError;
use crate::process::CancelToken;
use crate::verify::{VerificationOutcome, Verifier};
use crate::workspace::{PublishReport, Publisher, WorkspaceLease, WorkspaceProvider, slugify};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;
use tracing::{info, info_span, warn};

/// Collaborators shared by every worker of a run.
pub(super) struct WorkerContext<'a> {
    pub workspaces: &'a dyn WorkspaceProvider,
    pub backend: &'a dyn ExecutionBackend,
    pub verifier: &'a dyn Verifier,
    pub publisher: &'a dyn Publisher,
    pub settings: &'a OrchestratorSettings,
    pub claims: &'a SlugClaims,
    pub cancel: &'a CancelToken,
}

/// What the attempt loop accumulated, kept even if it panics.
#[derive(Default)]
struct Progress {
    branch: Option<String>,
    attempts: Vec<Attempt>,
    published: Option<PublishReport>,
}

/// Process `subtask` and produce its result. Never panics and always releases
/// the workspace exactly once.
pub(super) fn process(ctx: &WorkerContext<'_>, subtask: &str) -> SubtaskResult {
    let start = Instant::now();
    let slug = slugify(subtask);
    let _span = info_span!("subtask", slug = %slug).entered();

    let _claim = ctx.claims.claim(&slug);
    let lease = WorkspaceLease::new(ctx.workspaces, subtask);
    let mut progress = Progress::default();

    let outcome = match catch_unwind(AssertUnwindSafe(|| {
        attempt_loop(ctx, subtask, &lease, &mut progress)
    })) {
        Ok(outcome) => outcome,
        Err(panic) => SubtaskOutcome::exception(format!(
            "worker panicked: {}",
            panic_message(panic.as_ref())
        )),
    };

    if let Err(e) = lease.release() {
        warn!(error = %e, "failed to release workspace");
    }

    match &outcome {
        SubtaskOutcome::Succeeded { .. } => info!("subtask succeeded"),
        SubtaskOutcome::FailedAfterRetries { attempts, .. } => {
            warn!(attempts, "subtask failed after retries")
        }
        SubtaskOutcome::FailedWithException { message } => {
            warn!(error = %message, "subtask failed with exception")
        }
    }

    SubtaskResult {
        subtask: subtask.to_string(),
        slug,
        branch: progress.branch,
        outcome,
        attempts: progress.attempts,
        published: progress.published,
        duration: start.elapsed(),
    }
}

fn attempt_loop(
    ctx: &WorkerContext<'_>,
    subtask: &str,
    lease: &WorkspaceLease<'_>,
    progress: &mut Progress,
) -> SubtaskOutcome {
    if ctx.cancel.is_cancelled() {
        return SubtaskOutcome::exception(ForklineError::Cancelled.to_string());
    }

    let workspace = match lease.acquire() {
        Ok(workspace) => workspace,
        Err(ForklineError::Cancelled) => {
            return SubtaskOutcome::exception(ForklineError::Cancelled.to_string());
        }
        Err(e) => return SubtaskOutcome::exception(format!("workspace acquisition failed: {}", e)),
    };
    progress.branch = Some(workspace.branch.clone());

    let max_retries = ctx.settings.max_retries;
    let mut request = subtask.to_string();

    for index in 0..max_retries {
        if ctx.cancel.is_cancelled() {
            return SubtaskOutcome::exception(ForklineError::Cancelled.to_string());
        }

        info!(attempt = index, backend = ctx.backend.id(), "running backend");
        let output = match ctx.backend.run(&request, &workspace.path) {
            Ok(output) => output,
            Err(ForklineError::Cancelled) => {
                return SubtaskOutcome::exception(ForklineError::Cancelled.to_string());
            }
            Err(e) => {
                return SubtaskOutcome::exception(format!(
                    "backend '{}' failed on attempt {}: {}",
                    ctx.backend.id(),
                    index,
                    e
                ));
            }
        };

        // A failure-shaped result is a failed attempt; its text is the feedback.
        let verification = if is_failure_output(&output) {
            warn!(attempt = index, output = %output, "backend reported a failure");
            VerificationOutcome {
                passed: false,
                log: output.clone(),
            }
        } else {
            match ctx.verifier.verify(&workspace.path) {
                Ok(verification) => verification,
                Err(ForklineError::Cancelled) => {
                    return SubtaskOutcome::exception(ForklineError::Cancelled.to_string());
                }
                Err(e) => return SubtaskOutcome::exception(e.to_string()),
            }
        };

        progress.attempts.push(Attempt {
            index,
            request: request.clone(),
            backend_output: output.clone(),
            passed: verification.passed,
            log: verification.log.clone(),
        });

        if verification.passed {
            match ctx.publisher.publish(subtask, &workspace) {
                Ok(report) => {
                    info!(
                        committed = report.committed,
                        pushed = report.pushed,
                        "published"
                    );
                    progress.published = Some(report);
                }
                Err(e) => warn!(error = %e, "publishing failed, keeping result"),
            }
            return SubtaskOutcome::Succeeded { message: output };
        }

        if index + 1 < max_retries {
            info!(attempt = index, "attempt failed, retrying with feedback");
            request = retry_request(
                subtask,
                &verification.log,
                ctx.settings.feedback_tail_chars,
            );
        } else {
            return SubtaskOutcome::FailedAfterRetries {
                attempts: max_retries,
                last_log: verification.log,
            };
        }
    }

    // Only reachable with a zero retry budget.
    SubtaskOutcome::FailedAfterRetries {
        attempts: 0,
        last_log: String::new(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
