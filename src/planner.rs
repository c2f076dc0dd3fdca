//! Goal decomposition.
//!
//! A planner turns a goal into an ordered list of subtasks. Planning never
//! fails: anything the model returns that is not a clean list of task strings
//! collapses to a single subtask, the goal itself.

use crate::agent::{ChatModel, Message, OpenAiClient};
use crate::config::Config;
use crate::error::Result;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("Invalid plan array regex"));

const SYSTEM_PROMPT: &str = "You are a senior technical project manager. \
Break the user's request into a list of specific, isolated, actionable coding tasks. \
Each task must be executable independently, in its own copy of the repository, by a \
developer who sees only that task. Return the result strictly as a JSON array of strings, \
without Markdown formatting or explanation. \
Example: [\"Create utils.rs\", \"Add unit tests for utils.rs\", \"Update main.rs\"]";

/// Decomposes a goal into subtasks.
pub trait Planner: Send + Sync {
    /// Always returns at least one element.
    fn plan(&self, goal: &str) -> Vec<String>;
}

/// Runs the goal as a single subtask.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughPlanner;

impl Planner for PassthroughPlanner {
    fn plan(&self, goal: &str) -> Vec<String> {
        vec![goal.to_string()]
    }
}

/// Asks a chat model for the plan.
pub struct LlmPlanner {
    model: Box<dyn ChatModel>,
}

impl LlmPlanner {
    pub fn new(model: Box<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = OpenAiClient::new(
            &config.native.base_url,
            config.planner_model(),
            config.api_key(),
            Duration::from_secs(config.native.request_timeout_seconds),
        )?;
        Ok(Self::new(Box::new(client)))
    }
}

impl Planner for LlmPlanner {
    fn plan(&self, goal: &str) -> Vec<String> {
        let messages = [Message::system(SYSTEM_PROMPT), Message::user(goal)];
        match self.model.complete(&messages, &[]) {
            Ok(reply) => parse_plan(goal, reply.content.as_deref().unwrap_or_default()),
            Err(e) => {
                warn!(error = %e, "planner request failed, running goal as a single task");
                vec![goal.to_string()]
            }
        }
    }
}

/// Build the planner a config asks for.
pub fn from_config(config: &Config) -> Result<Box<dyn Planner>> {
    if config.planner.enabled {
        Ok(Box::new(LlmPlanner::from_config(config)?))
    } else {
        Ok(Box::new(PassthroughPlanner))
    }
}

/// Parse a model reply into subtasks, falling back to `vec![goal]`.
///
/// Accepted shapes, after stripping Markdown code fences:
/// - a JSON array of non-empty strings
/// - a JSON object whose first array-valued field (in key order) is such an array
/// - if the text is not JSON, the outermost `[...]` span of the raw reply
pub fn parse_plan(goal: &str, raw: &str) -> Vec<String> {
    let text = strip_code_fences(raw);

    let parsed = serde_json::from_str::<Value>(text).ok().or_else(|| {
        BRACKETED
            .find(raw)
            .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
    });

    match parsed.as_ref().and_then(task_list) {
        Some(tasks) => tasks,
        None => {
            debug!(reply = raw, "unusable plan, running goal as a single task");
            vec![goal.to_string()]
        }
    }
}

fn task_list(value: &Value) -> Option<Vec<String>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(fields) => fields.values().find_map(Value::as_array)?,
        _ => return None,
    };

    if items.is_empty() {
        return None;
    }

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .collect()
}

fn strip_code_fences(raw: &str) -> &str {
    let text = raw.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`) on the opening fence line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().trim_end_matches("```").trim()
}
