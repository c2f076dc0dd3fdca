//! Config loading, validation, and utility operations.

use super::model::{CONFIG_FILE_NAME, Config};
use super::types::BackendSettings;
use crate::error::{ForklineError, Result};
use std::path::Path;
use std::time::Duration;

/// Environment variable that overrides `native.base_url`.
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            ForklineError::ConfigError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load `forkline.yaml` from the repository root, or the defaults if the
    /// file does not exist. Environment overrides are applied either way.
    pub fn load_or_default<P: AsRef<Path>>(repo_root: P) -> Result<Self> {
        let path = repo_root.as_ref().join(CONFIG_FILE_NAME);
        let mut config = if path.exists() {
            Self::load(&path)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty map.
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| {
                ForklineError::ConfigError(format!("failed to parse config YAML: {}", e))
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            ForklineError::ConfigError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(base_url) = std::env::var(BASE_URL_ENV)
            && !base_url.trim().is_empty()
        {
            self.native.base_url = base_url.trim().to_string();
        }
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - pool size, retries, feedback size, timeouts, and max turns must be positive
    /// - `branch_prefix` and `worktree_base` must be non-empty
    /// - selecting the `custom` backend requires `backends.custom.command`
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("max_workers", self.max_workers as u64),
            ("max_retries", self.max_retries as u64),
            ("feedback_tail_chars", self.feedback_tail_chars as u64),
            ("git_timeout_seconds", self.git_timeout_seconds),
            ("backend_timeout_seconds", self.backend_timeout_seconds),
            ("verify_timeout_seconds", self.verify_timeout_seconds),
            ("native.max_turns", self.native.max_turns as u64),
            (
                "native.request_timeout_seconds",
                self.native.request_timeout_seconds,
            ),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(ForklineError::ConfigError(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        if self.branch_prefix.trim().is_empty() {
            return Err(ForklineError::ConfigError(
                "branch_prefix must not be empty".to_string(),
            ));
        }
        if self.worktree_base.trim().is_empty() {
            return Err(ForklineError::ConfigError(
                "worktree_base must not be empty".to_string(),
            ));
        }

        if let Some(cmd) = &self.verify_command
            && cmd.trim().is_empty()
        {
            return Err(ForklineError::ConfigError(
                "verify_command must not be empty when set (omit it to auto-detect)".to_string(),
            ));
        }

        for (id, settings) in &self.backends {
            if settings.timeout_seconds == Some(0) {
                return Err(ForklineError::ConfigError(format!(
                    "backends.{}.timeout_seconds must be greater than 0",
                    id
                )));
            }
        }

        if self.backend.trim() == "custom" && self.custom_command().is_none() {
            return Err(ForklineError::ConfigError(
                "backend 'custom' requires backends.custom.command".to_string(),
            ));
        }

        Ok(())
    }

    /// Per-backend overrides for the given identifier, if any.
    pub fn backend_settings(&self, id: &str) -> Option<&BackendSettings> {
        self.backends.get(id)
    }

    fn custom_command(&self) -> Option<&str> {
        self.backend_settings("custom")
            .and_then(|s| s.command.as_deref())
            .filter(|c| !c.trim().is_empty())
    }

    /// Effective timeout for a backend run.
    pub fn backend_timeout(&self, id: &str) -> Duration {
        let seconds = self
            .backend_settings(id)
            .and_then(|s| s.timeout_seconds)
            .unwrap_or(self.backend_timeout_seconds);
        Duration::from_secs(seconds)
    }

    /// Read the model API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.native.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }

    /// Model used by the planner.
    pub fn planner_model(&self) -> &str {
        self.planner.model.as_deref().unwrap_or(&self.native.model)
    }
}
