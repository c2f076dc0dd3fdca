//! The in-process backend: a tool-calling agent bound to the workspace.

use super::ExecutionBackend;
use crate::agent::{AgentSession, ChatModel, OpenAiClient, SessionEnd, Toolbox};
use crate::config::Config;
use crate::error::{ForklineError, Result};
use crate::process::{CancelToken, Limits};
use std::path::Path;
use std::time::{Duration, Instant};

pub const NATIVE_ID: &str = "native";

/// [`ExecutionBackend`] running [`AgentSession`] against a [`ChatModel`].
pub struct NativeBackend {
    model: Box<dyn ChatModel>,
    max_turns: u32,
    limits: Limits,
}

impl NativeBackend {
    /// `limits.timeout` bounds the whole session and each shell command in it.
    pub fn new(model: Box<dyn ChatModel>, max_turns: u32, limits: Limits) -> Self {
        Self {
            model,
            max_turns,
            limits,
        }
    }

    pub fn from_config(config: &Config, cancel: CancelToken) -> Result<Self> {
        let client = OpenAiClient::new(
            &config.native.base_url,
            config.native.model.clone(),
            config.api_key(),
            Duration::from_secs(config.native.request_timeout_seconds),
        )?;

        Ok(Self::new(
            Box::new(client),
            config.native.max_turns,
            Limits::new(Some(config.backend_timeout(NATIVE_ID)), cancel),
        ))
    }
}

impl ExecutionBackend for NativeBackend {
    fn id(&self) -> &str {
        NATIVE_ID
    }

    fn run(&self, request: &str, workspace: &Path) -> Result<String> {
        let mut session = AgentSession::new(
            self.model.as_ref(),
            Toolbox::new(workspace, self.limits.clone()),
            self.max_turns,
            self.limits.cancel.clone(),
        );
        if let Some(timeout) = self.limits.timeout {
            session = session.with_deadline(Instant::now() + timeout);
        }

        match session.run(request) {
            Ok(SessionEnd::Finished(summary)) => Ok(summary),
            Ok(SessionEnd::TurnLimit) => Ok(format!(
                "Error in native backend: stopped after {} turns without finishing",
                self.max_turns
            )),
            Ok(SessionEnd::Deadline) => Ok(format!(
                "Error in native backend: timed out after {}s",
                self.limits.timeout.map_or(0, |t| t.as_secs())
            )),
            Err(ForklineError::Cancelled) => Err(ForklineError::Cancelled),
            Err(e) => Ok(format!("Error in native backend: {}", e)),
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}
