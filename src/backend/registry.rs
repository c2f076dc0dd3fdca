//! Backend lookup by identifier.

use super::cli::{CLAUDE, CODEX, COPILOT, CliBackend, CliPreset, GEMINI, OPENCODE, QWEN};
use super::native::{NATIVE_ID, NativeBackend};
use super::ExecutionBackend;
use crate::config::Config;
use crate::error::{ForklineError, Result};
use crate::process::{CancelToken, Limits};
use tracing::warn;

/// Every backend the registry knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Native,
    Claude,
    Gemini,
    Codex,
    Qwen,
    Copilot,
    OpenCode,
    Custom,
}

impl BackendKind {
    pub const ALL: [BackendKind; 8] = [
        BackendKind::Native,
        BackendKind::Claude,
        BackendKind::Gemini,
        BackendKind::Codex,
        BackendKind::Qwen,
        BackendKind::Copilot,
        BackendKind::OpenCode,
        BackendKind::Custom,
    ];

    /// Look up an identifier exactly (case-insensitive, surrounding space ignored).
    pub fn parse(id: &str) -> Option<Self> {
        let id = id.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    /// Look up an identifier, falling back to [`BackendKind::Native`] for
    /// empty or unknown identifiers.
    pub fn from_id(id: &str) -> Self {
        if id.trim().is_empty() {
            return BackendKind::Native;
        }
        Self::parse(id).unwrap_or_else(|| {
            warn!(backend = id, "unknown backend, using native");
            BackendKind::Native
        })
    }

    pub fn id(self) -> &'static str {
        match self {
            BackendKind::Native => NATIVE_ID,
            BackendKind::Custom => "custom",
            other => other.preset().map_or("", |p| p.id),
        }
    }

    /// Built-in command line, for CLI-tool backends.
    pub fn preset(self) -> Option<CliPreset> {
        match self {
            BackendKind::Claude => Some(CLAUDE),
            BackendKind::Gemini => Some(GEMINI),
            BackendKind::Codex => Some(CODEX),
            BackendKind::Qwen => Some(QWEN),
            BackendKind::Copilot => Some(COPILOT),
            BackendKind::OpenCode => Some(OPENCODE),
            BackendKind::Native | BackendKind::Custom => None,
        }
    }

    /// Interactivity as configured: the `backends.<id>.interactive` override,
    /// else the built-in default.
    pub fn is_interactive(self, config: &Config) -> bool {
        config
            .backend_settings(self.id())
            .and_then(|s| s.interactive)
            .unwrap_or_else(|| self.preset().is_some_and(|p| p.interactive))
    }
}

/// Build the backend selected by `config.backend`.
pub fn resolve(config: &Config, cancel: CancelToken) -> Result<Box<dyn ExecutionBackend>> {
    let kind = BackendKind::from_id(&config.backend);
    let settings = config.backend_settings(kind.id()).cloned().unwrap_or_default();
    let limits = Limits::new(Some(config.backend_timeout(kind.id())), cancel.clone());

    if kind == BackendKind::Native {
        return Ok(Box::new(NativeBackend::from_config(config, cancel)?));
    }

    let (name, command) = match (kind.preset(), settings.command.as_deref()) {
        (Some(preset), Some(command)) => (preset.name, command.to_string()),
        (Some(preset), None) => (preset.name, preset.command.to_string()),
        (None, Some(command)) => ("Custom", command.to_string()),
        (None, None) => {
            return Err(ForklineError::ConfigError(format!(
                "backend '{}' requires backends.{}.command",
                kind.id(),
                kind.id()
            )));
        }
    };

    let backend = CliBackend::new(
        kind.id(),
        name,
        command,
        kind.is_interactive(config),
        limits,
    )?
    .with_environment(settings.environment);

    Ok(Box::new(backend))
}
