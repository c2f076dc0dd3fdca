//! Backends that invoke an external command-line tool.

use super::ExecutionBackend;
use super::template::{render_command, vars};
use crate::error::{ForklineError, Result};
use crate::process::{Limits, run_process};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Built-in command line for a known tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CliPreset {
    pub id: &'static str,
    /// Display name used in failure strings.
    pub name: &'static str,
    /// Command template with `{prompt}` and `{workspace}` placeholders.
    pub command: &'static str,
    pub interactive: bool,
}

pub const CLAUDE: CliPreset = CliPreset {
    id: "claude",
    name: "Claude",
    command: "claude -p {prompt}",
    interactive: true,
};

pub const GEMINI: CliPreset = CliPreset {
    id: "gemini",
    name: "Gemini",
    command: "gemini -p {prompt}",
    interactive: false,
};

pub const CODEX: CliPreset = CliPreset {
    id: "codex",
    name: "Codex",
    command: "openai api chat.completions.create -m gpt-4 -g user {prompt}",
    interactive: false,
};

pub const QWEN: CliPreset = CliPreset {
    id: "qwen",
    name: "Qwen",
    command: "qwen-cli run --prompt {prompt}",
    interactive: false,
};

pub const COPILOT: CliPreset = CliPreset {
    id: "copilot",
    name: "Copilot",
    command: "gh copilot suggest -t shell {prompt}",
    interactive: true,
};

pub const OPENCODE: CliPreset = CliPreset {
    id: "opencode",
    name: "OpenCode",
    command: "opencode start --dir {workspace} --task {prompt}",
    interactive: true,
};

/// [`ExecutionBackend`] that runs a command template as a subprocess.
///
/// The template is split into arguments and each one is rendered with
/// `{prompt}` (the request) and `{workspace}` (absolute workspace path). No
/// shell is involved.
#[derive(Debug, Clone)]
pub struct CliBackend {
    id: String,
    name: String,
    command: String,
    environment: BTreeMap<String, String>,
    interactive: bool,
    limits: Limits,
}

impl CliBackend {
    /// Create a backend, checking up front that `command` parses and only
    /// uses known placeholders.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        command: impl Into<String>,
        interactive: bool,
        limits: Limits,
    ) -> Result<Self> {
        let command = command.into();
        render_command(&command, &vars([("prompt", ""), ("workspace", "")]))?;

        Ok(Self {
            id: id.into(),
            name: name.into(),
            command,
            environment: BTreeMap::new(),
            interactive,
            limits,
        })
    }

    pub fn from_preset(preset: CliPreset, limits: Limits) -> Result<Self> {
        Self::new(
            preset.id,
            preset.name,
            preset.command,
            preset.interactive,
            limits,
        )
    }

    /// Extra environment variables for the child process.
    pub fn with_environment(mut self, environment: BTreeMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    pub fn command_template(&self) -> &str {
        &self.command
    }
}

impl ExecutionBackend for CliBackend {
    fn id(&self) -> &str {
        &self.id
    }

    fn run(&self, request: &str, workspace: &Path) -> Result<String> {
        let workspace_str = workspace.to_string_lossy();
        let args = render_command(
            &self.command,
            &vars([("prompt", request), ("workspace", workspace_str.as_ref())]),
        )
        .map_err(|e| ForklineError::BackendError(e.to_string()))?;

        let mut command = Command::new(&args[0]);
        command
            .args(&args[1..])
            .current_dir(workspace)
            .envs(&self.environment);

        debug!(backend = %self.id, program = %args[0], "invoking backend");

        let output = match run_process(command, &self.limits) {
            Ok(output) => output,
            Err(e) => return Ok(format!("Error executing {} backend: {}", self.name, e)),
        };

        if output.cancelled {
            return Err(ForklineError::Cancelled);
        }
        if output.timed_out {
            return Ok(format!(
                "{} Error: timed out after {:.1}s",
                self.name,
                output.duration.as_secs_f64()
            ));
        }
        if output.is_success() {
            return Ok(output.stdout.trim().to_string());
        }

        let stderr = output.stderr.trim();
        let detail = if stderr.is_empty() {
            format!("exited with code {}", output.exit_code.unwrap_or(-1))
        } else {
            stderr.to_string()
        };
        Ok(format!("{} Error: {}", self.name, detail))
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::is_failure_output;
    use crate::process::CancelToken;
    use std::time::Duration;
    use tempfile::TempDir;

    fn backend(command: &str) -> CliBackend {
        CliBackend::new("custom", "Custom", command, false, Limits::default()).unwrap()
    }

    #[test]
    fn test_presets_parse() {
        for preset in [CLAUDE, GEMINI, CODEX, QWEN, COPILOT, OPENCODE] {
            let backend = CliBackend::from_preset(preset, Limits::default()).unwrap();
            assert_eq!(backend.id(), preset.id);
            assert_eq!(backend.is_interactive(), preset.interactive);
        }
    }

    #[test]
    fn test_unknown_placeholder_rejected_at_construction() {
        let err = CliBackend::new("custom", "Custom", "tool {task}", false, Limits::default())
            .unwrap_err();
        assert!(matches!(err, ForklineError::ConfigError(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_success_returns_trimmed_stdout() {
        let dir = TempDir::new().unwrap();
        let out = backend("echo {prompt}")
            .run("it's \"done\"", dir.path())
            .unwrap();
        assert_eq!(out, "it's \"done\"");
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_in_workspace_with_environment() {
        let dir = TempDir::new().unwrap();
        let mut env = BTreeMap::new();
        env.insert("FORKLINE_TEST_VALUE".to_string(), "42".to_string());
        let backend = backend("sh -c 'pwd; echo $FORKLINE_TEST_VALUE'").with_environment(env);

        let out = backend.run("ignored", dir.path()).unwrap();
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(
            std::path::Path::new(lines[0]).canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
        assert_eq!(lines[1], "42");
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_maps_to_error_string() {
        let dir = TempDir::new().unwrap();
        let out = backend("sh -c 'echo broken >&2; exit 2'")
            .run("x", dir.path())
            .unwrap();
        assert_eq!(out, "Custom Error: broken");
        assert!(is_failure_output(&out));
    }

    #[test]
    fn test_spawn_failure_maps_to_error_string() {
        let dir = TempDir::new().unwrap();
        let out = backend("nonexistent_command_xyz_123 {prompt}")
            .run("x", dir.path())
            .unwrap();
        assert!(out.starts_with("Error executing Custom backend:"));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_maps_to_error_string() {
        let dir = TempDir::new().unwrap();
        let limits = Limits::new(Some(Duration::from_millis(200)), CancelToken::new());
        let backend = CliBackend::new("custom", "Custom", "sleep 10", false, limits).unwrap();
        let out = backend.run("x", dir.path()).unwrap();
        assert!(out.starts_with("Custom Error: timed out"));
    }

    #[cfg(unix)]
    #[test]
    fn test_cancellation_is_an_error() {
        let dir = TempDir::new().unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let backend =
            CliBackend::new("custom", "Custom", "sleep 10", false, Limits::new(None, cancel))
                .unwrap();
        assert!(matches!(
            backend.run("x", dir.path()),
            Err(ForklineError::Cancelled)
        ));
    }
}
