//! Execution backends: the components that actually perform a subtask.
//!
//! A backend receives the current request text and the workspace path and
//! returns a human-readable summary. Ordinary tool failure is reported inside
//! that string (see [`is_failure_output`]); `Err` is reserved for conditions
//! the orchestrator treats as exceptions.
//!
//! Backends are selected by identifier through [`registry::resolve`]:
//!
//! - `native` - in-process tool-calling agent against an OpenAI-compatible API
//! - `claude`, `gemini`, `codex`, `qwen`, `copilot`, `opencode` - CLI presets
//! - `custom` - a user-supplied command template

pub mod cli;
pub mod native;
pub mod registry;
mod template;

pub use cli::{CliBackend, CliPreset};
pub use native::NativeBackend;
pub use registry::{BackendKind, resolve};
pub use template::{TemplateError, render_command, render_template, vars};

use crate::error::Result;
use std::path::Path;

/// Polymorphic capability shared by all backends.
pub trait ExecutionBackend: Send + Sync {
    /// Registry identifier of this backend.
    fn id(&self) -> &str;

    /// Perform `request` inside `workspace` and describe what was done.
    fn run(&self, request: &str, workspace: &Path) -> Result<String>;

    /// Whether the backend needs a human-attended terminal.
    fn is_interactive(&self) -> bool;
}

/// Prefixes marking a backend result as "ran but failed".
const FAILURE_PREFIXES: [&str; 2] = ["Error ", "Error:"];

/// True if `output` follows the failure-string convention, e.g.
/// `"Gemini Error: ..."`, `"Error executing ..."`, `"Error in native backend: ..."`.
pub fn is_failure_output(output: &str) -> bool {
    let output = output.trim_start();
    FAILURE_PREFIXES.iter().any(|p| output.starts_with(p))
        || output
            .split_once(' ')
            .is_some_and(|(_, rest)| rest.starts_with("Error:"))
}
