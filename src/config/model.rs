//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the config file looked up at the repository root.
pub const CONFIG_FILE_NAME: &str = "forkline.yaml";

/// Configuration for a forkline run.
///
/// This struct represents the contents of `forkline.yaml`. Every field has a
/// default, and unknown fields in the YAML are ignored for forward
/// compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Orchestration
    // =========================================================================
    /// Size of the worker pool.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Maximum generate-verify attempts per subtask.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// How many trailing characters of a failed verification log are fed back
    /// into the next attempt.
    #[serde(default = "default_feedback_tail_chars")]
    pub feedback_tail_chars: usize,

    // =========================================================================
    // Verification
    // =========================================================================
    /// Shell command that decides whether a subtask's changes are acceptable.
    /// When unset, a command is detected from the workspace's project files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_command: Option<String>,

    // =========================================================================
    // Backends
    // =========================================================================
    /// Identifier of the execution backend (unknown values fall back to native).
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Native backend and model endpoint settings.
    #[serde(default)]
    pub native: NativeSettings,

    /// Per-backend overrides keyed by backend identifier.
    #[serde(default)]
    pub backends: BTreeMap<String, BackendSettings>,

    /// Planner settings.
    #[serde(default)]
    pub planner: PlannerSettings,

    // =========================================================================
    // Git settings
    // =========================================================================
    /// Directory holding the per-subtask worktrees, relative to the repo root.
    #[serde(default = "default_worktree_base")]
    pub worktree_base: String,

    /// Namespace prefix for subtask branches (`<prefix>/<slug>`).
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,

    /// Remote that successful subtask branches are pushed to.
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Whether to push subtask branches after verification passes.
    #[serde(default = "default_true")]
    pub push_on_success: bool,

    /// Whether to open a pull request (`gh pr create`) after pushing.
    #[serde(default)]
    pub open_pull_request: bool,

    // =========================================================================
    // Timeouts
    // =========================================================================
    /// Timeout for each git invocation.
    #[serde(default = "default_git_timeout_seconds")]
    pub git_timeout_seconds: u64,

    /// Timeout for each backend run.
    #[serde(default = "default_backend_timeout_seconds")]
    pub backend_timeout_seconds: u64,

    /// Timeout for each verification run.
    #[serde(default = "default_verify_timeout_seconds")]
    pub verify_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            max_retries: default_max_retries(),
            feedback_tail_chars: default_feedback_tail_chars(),
            verify_command: None,
            backend: default_backend(),
            native: NativeSettings::default(),
            backends: BTreeMap::new(),
            planner: PlannerSettings::default(),
            worktree_base: default_worktree_base(),
            branch_prefix: default_branch_prefix(),
            remote: default_remote(),
            push_on_success: true,
            open_pull_request: false,
            git_timeout_seconds: default_git_timeout_seconds(),
            backend_timeout_seconds: default_backend_timeout_seconds(),
            verify_timeout_seconds: default_verify_timeout_seconds(),
        }
    }
}
