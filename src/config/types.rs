//! Configuration sub-sections and defaults for forkline.
//!
//! This module defines the nested settings structs and the default value
//! functions used by the Config struct.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settings for the in-process (native) backend and its model endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeSettings {
    /// Model name sent in chat completion requests.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Maximum model round-trips per backend run.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Timeout for a single HTTP request to the model.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl Default for NativeSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            max_turns: default_max_turns(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

/// Settings for the goal planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    /// When false, every goal runs as a single subtask.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Model override for planning (defaults to `native.model`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: None,
        }
    }
}

/// Per-backend overrides, keyed by backend identifier in `backends:`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Command template replacing the preset (`{prompt}`, `{workspace}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Extra environment variables for the backend process.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,

    /// Timeout override for this backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    /// Interactivity override for this backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive: Option<bool>,
}

// Default value functions for serde
pub(crate) fn default_max_workers() -> usize {
    4
}
pub(crate) fn default_max_retries() -> u32 {
    3
}
pub(crate) fn default_feedback_tail_chars() -> usize {
    2000
}
pub(crate) fn default_backend() -> String {
    "native".to_string()
}
pub(crate) fn default_worktree_base() -> String {
    ".worktrees".to_string()
}
pub(crate) fn default_branch_prefix() -> String {
    "forkline".to_string()
}
pub(crate) fn default_remote() -> String {
    "origin".to_string()
}
pub(crate) fn default_git_timeout_seconds() -> u64 {
    120
}
pub(crate) fn default_backend_timeout_seconds() -> u64 {
    1800
}
pub(crate) fn default_verify_timeout_seconds() -> u64 {
    900
}
pub(crate) fn default_true() -> bool {
    true
}
fn default_model() -> String {
    "gpt-4o".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_max_turns() -> u32 {
    30
}
fn default_request_timeout_seconds() -> u64 {
    300
}
