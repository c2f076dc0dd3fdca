//! Records produced by a run.

use crate::workspace::PublishReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// One generate-then-verify cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    /// 0-based.
    pub index: u32,
    /// Request sent to the backend.
    pub request: String,
    /// What the backend returned.
    pub backend_output: String,
    pub passed: bool,
    /// Verification output.
    pub log: String,
}

/// Terminal disposition of a subtask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubtaskOutcome {
    /// Verification passed. `message` is the backend's summary.
    Succeeded { message: String },
    /// Every allowed attempt failed verification.
    FailedAfterRetries { attempts: u32, last_log: String },
    /// Acquisition, the backend, or the verifier failed outright.
    FailedWithException { message: String },
}

impl SubtaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubtaskOutcome::Succeeded { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubtaskOutcome::Succeeded { .. } => "succeeded",
            SubtaskOutcome::FailedAfterRetries { .. } => "failed after retries",
            SubtaskOutcome::FailedWithException { .. } => "failed with exception",
        }
    }

    pub(crate) fn exception(message: impl Into<String>) -> Self {
        SubtaskOutcome::FailedWithException {
            message: message.into(),
        }
    }
}

/// Everything known about one subtask once it finished.
#[derive(Debug, Clone, Serialize)]
pub struct SubtaskResult {
    pub subtask: String,
    pub slug: String,
    /// Branch the work lives on, if a workspace was acquired.
    pub branch: Option<String>,
    pub outcome: SubtaskOutcome,
    pub attempts: Vec<Attempt>,
    /// Set when a successful subtask was published.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<PublishReport>,
    pub duration: Duration,
}

/// All subtask results for one goal, in completion order.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub goal: String,
    pub total: usize,
    pub results: Vec<SubtaskResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    pub fn succeeded(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.total == self.results.len() && self.failed() == 0
    }

    pub fn result_for(&self, subtask: &str) -> Option<&SubtaskResult> {
        self.results.iter().find(|r| r.subtask == subtask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(subtask: &str, outcome: SubtaskOutcome) -> SubtaskResult {
        SubtaskResult {
            subtask: subtask.to_string(),
            slug: subtask.to_string(),
            branch: None,
            outcome,
            attempts: Vec::new(),
            published: None,
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_counts() {
        let now = Utc::now();
        let run = RunResult {
            goal: "g".to_string(),
            total: 3,
            results: vec![
                result(
                    "a",
                    SubtaskOutcome::Succeeded {
                        message: "ok".to_string(),
                    },
                ),
                result(
                    "b",
                    SubtaskOutcome::FailedAfterRetries {
                        attempts: 3,
                        last_log: "boom".to_string(),
                    },
                ),
                result("c", SubtaskOutcome::exception("nope")),
            ],
            started_at: now,
            finished_at: now,
        };

        assert_eq!(run.succeeded(), 1);
        assert_eq!(run.failed(), 2);
        assert!(!run.all_succeeded());
        assert_eq!(run.result_for("c").unwrap().outcome.label(), "failed with exception");
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let value = serde_json::to_value(SubtaskOutcome::FailedAfterRetries {
            attempts: 3,
            last_log: "x".to_string(),
        })
        .unwrap();
        assert_eq!(value["status"], "failed_after_retries");
        assert_eq!(value["attempts"], 3);
    }
}
