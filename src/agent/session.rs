//! The native agent's tool-calling loop.

use super::client::ChatModel;
use super::protocol::{Message, ToolDefinition};
use super::tools::Toolbox;
use crate::error::{ForklineError, Result};
use crate::process::CancelToken;
use std::time::Instant;
use tracing::debug;

const SYSTEM_PROMPT: &str = "You are a software engineer working inside a git worktree. \
Complete the task by inspecting and editing files with the provided tools and by running \
commands to check your work. All paths are relative to the workspace root. When the task \
is done, reply with a short summary of what you changed and do not call any more tools.";

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The model replied without requesting tools.
    Finished(String),
    /// The turn limit was reached first.
    TurnLimit,
    /// The deadline passed first.
    Deadline,
}

/// One task's conversation with the model.
pub struct AgentSession<'a> {
    model: &'a dyn ChatModel,
    toolbox: Toolbox,
    tools: Vec<ToolDefinition>,
    max_turns: u32,
    deadline: Option<Instant>,
    cancel: CancelToken,
}

impl<'a> AgentSession<'a> {
    pub fn new(model: &'a dyn ChatModel, toolbox: Toolbox, max_turns: u32, cancel: CancelToken) -> Self {
        Self {
            model,
            toolbox,
            tools: Toolbox::definitions(),
            max_turns,
            deadline: None,
            cancel,
        }
    }

    /// Stop starting new turns after `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Drive the conversation until the model stops calling tools.
    ///
    /// Model and transport errors are returned as `Err`, as is cancellation.
    pub fn run(&self, task: &str) -> Result<SessionEnd> {
        let mut history = vec![
            Message::system(format!(
                "{}\nWorkspace: {}",
                SYSTEM_PROMPT,
                self.toolbox.root().display()
            )),
            Message::user(task),
        ];

        for turn in 0..self.max_turns {
            if self.cancel.is_cancelled() {
                return Err(ForklineError::Cancelled);
            }
            if self.deadline.is_some_and(|d| Instant::now() >= d) {
                return Ok(SessionEnd::Deadline);
            }

            let reply = self.model.complete(&history, &self.tools)?;
            let calls = reply.requested_calls().to_vec();
            history.push(reply);

            if calls.is_empty() {
                let summary = history
                    .last()
                    .and_then(|m| m.content.clone())
                    .unwrap_or_default();
                debug!(turn, "agent finished");
                return Ok(SessionEnd::Finished(summary.trim().to_string()));
            }

            for call in calls {
                debug!(turn, tool = %call.function.name, "agent tool call");
                let result = self.toolbox.call(&call.function.name, &call.function.arguments)?;
                history.push(Message::tool(call.id, result));
            }
        }

        Ok(SessionEnd::TurnLimit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::protocol::{FunctionCall, Role, ToolCall};
    use crate::process::Limits;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Replays canned replies and records every conversation it was shown.
    struct ScriptedModel {
        replies: Mutex<Vec<Message>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedModel {
        fn new(mut replies: Vec<Message>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl ChatModel for ScriptedModel {
        fn complete(&self, messages: &[Message], _tools: &[ToolDefinition]) -> Result<Message> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| ForklineError::BackendError("script exhausted".to_string()))
        }
    }

    fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> Message {
        Message {
            role: Role::Assistant,
            content: None,
            tool_calls: Some(vec![ToolCall {
                id: id.to_string(),
                kind: "function".to_string(),
                function: FunctionCall {
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                },
            }]),
            tool_call_id: None,
        }
    }

    #[test]
    fn test_session_executes_tools_then_finishes() {
        let dir = TempDir::new().unwrap();
        let model = ScriptedModel::new(vec![
            tool_call(
                "call_1",
                "write_file",
                serde_json::json!({"path": "health.txt", "content": "ok"}),
            ),
            Message::assistant("  Added health.txt\n"),
        ]);

        let session = AgentSession::new(
            &model,
            Toolbox::new(dir.path(), Limits::default()),
            5,
            CancelToken::new(),
        );
        let end = session.run("add a health file").unwrap();

        assert_eq!(end, SessionEnd::Finished("Added health.txt".to_string()));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("health.txt")).unwrap(),
            "ok"
        );

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        let tool_reply = seen[1].last().unwrap();
        assert_eq!(tool_reply.role, Role::Tool);
        assert_eq!(tool_reply.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_session_stops_at_turn_limit() {
        let dir = TempDir::new().unwrap();
        let replies = (0..3)
            .map(|i| tool_call(&format!("c{}", i), "list_dir", serde_json::json!({})))
            .collect();
        let model = ScriptedModel::new(replies);

        let session = AgentSession::new(
            &model,
            Toolbox::new(dir.path(), Limits::default()),
            3,
            CancelToken::new(),
        );
        assert_eq!(session.run("loop forever").unwrap(), SessionEnd::TurnLimit);
        assert_eq!(model.seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_session_model_error_propagates() {
        let dir = TempDir::new().unwrap();
        let model = ScriptedModel::new(vec![]);
        let session = AgentSession::new(
            &model,
            Toolbox::new(dir.path(), Limits::default()),
            3,
            CancelToken::new(),
        );
        assert!(matches!(
            session.run("task"),
            Err(ForklineError::BackendError(_))
        ));
    }

    #[test]
    fn test_session_cancelled_before_first_turn() {
        let dir = TempDir::new().unwrap();
        let model = ScriptedModel::new(vec![Message::assistant("never")]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let session = AgentSession::new(
            &model,
            Toolbox::new(dir.path(), Limits::default()),
            3,
            cancel,
        );
        assert!(matches!(session.run("task"), Err(ForklineError::Cancelled)));
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_session_past_deadline_stops() {
        let dir = TempDir::new().unwrap();
        let model = ScriptedModel::new(vec![Message::assistant("never")]);
        let session = AgentSession::new(
            &model,
            Toolbox::new(dir.path(), Limits::default()),
            3,
            CancelToken::new(),
        )
        .with_deadline(Instant::now());
        assert_eq!(session.run("task").unwrap(), SessionEnd::Deadline);
    }
}
