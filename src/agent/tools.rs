//! Tools the native agent can call, all confined to one workspace.

use super::protocol::ToolDefinition;
use crate::error::{ForklineError, Result};
use crate::process::{Limits, run_process, shell_command, tail_chars};
use serde_json::{Value, json};
use std::path::{Component, Path, PathBuf};

/// Largest tool result handed back to the model, in characters.
const MAX_TOOL_OUTPUT_CHARS: usize = 20_000;

/// Dispatches tool calls against a workspace directory.
#[derive(Debug, Clone)]
pub struct Toolbox {
    root: PathBuf,
    limits: Limits,
}

impl Toolbox {
    /// `limits` apply to each `run_shell_command` invocation.
    pub fn new(root: impl Into<PathBuf>, limits: Limits) -> Self {
        Self {
            root: root.into(),
            limits,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Schemas advertised to the model.
    pub fn definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::function(
                "run_shell_command",
                "Runs a shell command in the workspace and returns its exit code and output.",
                json!({
                    "type": "object",
                    "properties": {
                        "command": {"type": "string", "description": "The command to run."}
                    },
                    "required": ["command"]
                }),
            ),
            ToolDefinition::function(
                "read_file",
                "Reads the content of a file.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "Path relative to the workspace."}
                    },
                    "required": ["path"]
                }),
            ),
            ToolDefinition::function(
                "write_file",
                "Writes content to a file, creating parent directories. Overwrites existing files.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "Path relative to the workspace."},
                        "content": {"type": "string", "description": "The content to write."}
                    },
                    "required": ["path", "content"]
                }),
            ),
            ToolDefinition::function(
                "list_dir",
                "Lists files and directories in a path.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "Directory relative to the workspace. Defaults to the workspace root."}
                    }
                }),
            ),
        ]
    }

    /// Run tool `name` with JSON-encoded `arguments`.
    ///
    /// Tool-level failures (bad arguments, missing files, escaping paths) are
    /// returned as `Ok("Error: ...")` for the model to read. Only
    /// cancellation is an `Err`.
    pub fn call(&self, name: &str, arguments: &str) -> Result<String> {
        let args: Value = match serde_json::from_str(arguments) {
            Ok(args) => args,
            Err(e) => return Ok(format!("Error parsing arguments: {}", e)),
        };

        let result = match name {
            "run_shell_command" => self.run_shell_command(&args),
            "read_file" => self.read_file(&args),
            "write_file" => self.write_file(&args),
            "list_dir" => self.list_dir(&args),
            other => Err(format!("Tool '{}' not found.", other).into()),
        };

        match result {
            Ok(output) => Ok(output),
            Err(ToolError::Cancelled) => Err(ForklineError::Cancelled),
            Err(ToolError::Failed(msg)) => Ok(format!("Error: {}", msg)),
        }
    }

    fn run_shell_command(&self, args: &Value) -> ToolResult {
        let command = str_arg(args, "command")?;
        let mut cmd = shell_command(command);
        cmd.current_dir(&self.root);

        let output = run_process(cmd, &self.limits)
            .map_err(|e| format!("failed to start command: {}", e))?;
        if output.cancelled {
            return Err(ToolError::Cancelled);
        }

        let status = if output.timed_out {
            "timed out".to_string()
        } else {
            output
                .exit_code
                .map_or_else(|| "killed".to_string(), |c| c.to_string())
        };
        let combined = output.combined();
        Ok(format!(
            "exit code: {}\n{}",
            status,
            tail_chars(&combined, MAX_TOOL_OUTPUT_CHARS)
        ))
    }

    fn read_file(&self, args: &Value) -> ToolResult {
        let path = self.resolve(str_arg(args, "path")?)?;
        let content = std::fs::read_to_string(&path)
            .map_err(|e| format!("failed to read '{}': {}", self.display(&path), e))?;

        if content.chars().count() > MAX_TOOL_OUTPUT_CHARS {
            let head: String = content.chars().take(MAX_TOOL_OUTPUT_CHARS).collect();
            return Ok(format!("{}\n[truncated]", head));
        }
        Ok(content)
    }

    fn write_file(&self, args: &Value) -> ToolResult {
        let path = self.resolve(str_arg(args, "path")?)?;
        let content = str_arg(args, "content")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create parent directory: {}", e))?;
        }
        std::fs::write(&path, content)
            .map_err(|e| format!("failed to write '{}': {}", self.display(&path), e))?;

        Ok(format!(
            "wrote {} bytes to {}",
            content.len(),
            self.display(&path)
        ))
    }

    fn list_dir(&self, args: &Value) -> ToolResult {
        let rel = args.get("path").and_then(Value::as_str).unwrap_or(".");
        let path = self.resolve(rel)?;

        let entries = std::fs::read_dir(&path)
            .map_err(|e| format!("failed to list '{}': {}", self.display(&path), e))?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                if entry.file_type().is_ok_and(|t| t.is_dir()) {
                    format!("{}/", name)
                } else {
                    name
                }
            })
            .collect();
        names.sort();
        Ok(names.join("\n"))
    }

    /// Resolve `rel` inside the workspace, rejecting anything that escapes it.
    fn resolve(&self, rel: &str) -> std::result::Result<PathBuf, String> {
        let requested = Path::new(rel);
        let relative = if requested.is_absolute() {
            requested
                .strip_prefix(&self.root)
                .map_err(|_| format!("path '{}' is outside the workspace", rel))?
        } else {
            requested
        };

        let mut resolved = self.root.clone();
        let mut depth = 0usize;
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(format!("path '{}' is outside the workspace", rel));
                    }
                    resolved.pop();
                    depth -= 1;
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(format!("path '{}' is outside the workspace", rel));
                }
            }
        }
        Ok(resolved)
    }

    fn display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

enum ToolError {
    Failed(String),
    Cancelled,
}

impl From<String> for ToolError {
    fn from(msg: String) -> Self {
        ToolError::Failed(msg)
    }
}

type ToolResult = std::result::Result<String, ToolError>;

fn str_arg<'a>(args: &'a Value, name: &str) -> std::result::Result<&'a str, String> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("Missing '{}' argument", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn toolbox(dir: &TempDir) -> Toolbox {
        Toolbox::new(dir.path(), Limits::default())
    }

    #[test]
    fn test_definitions_cover_all_tools() {
        let names: Vec<_> = Toolbox::definitions()
            .into_iter()
            .map(|d| d.function.name)
            .collect();
        assert_eq!(
            names,
            vec!["run_shell_command", "read_file", "write_file", "list_dir"]
        );
    }

    #[test]
    fn test_write_then_read_and_list() {
        let dir = TempDir::new().unwrap();
        let tools = toolbox(&dir);

        let out = tools
            .call(
                "write_file",
                r#"{"path": "src/lib.rs", "content": "pub fn f() {}\n"}"#,
            )
            .unwrap();
        assert!(out.starts_with("wrote 14 bytes"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("src/lib.rs")).unwrap(),
            "pub fn f() {}\n"
        );

        let content = tools.call("read_file", r#"{"path": "src/lib.rs"}"#).unwrap();
        assert_eq!(content, "pub fn f() {}\n");

        let listing = tools.call("list_dir", "{}").unwrap();
        assert_eq!(listing, "src/");
    }

    #[test]
    fn test_paths_escaping_workspace_are_rejected() {
        let dir = TempDir::new().unwrap();
        let tools = toolbox(&dir);

        for path in ["../outside.txt", "a/../../outside.txt", "/etc/passwd"] {
            let args = json!({"path": path, "content": "x"}).to_string();
            let out = tools.call("write_file", &args).unwrap();
            assert!(out.contains("outside the workspace"), "{} gave {}", path, out);
        }
        assert!(!dir.path().parent().unwrap().join("outside.txt").exists());
    }

    #[test]
    fn test_absolute_path_inside_workspace_is_allowed() {
        let dir = TempDir::new().unwrap();
        let tools = toolbox(&dir);
        std::fs::write(dir.path().join("a.txt"), "abc").unwrap();

        let args = json!({"path": dir.path().join("a.txt")}).to_string();
        assert_eq!(tools.call("read_file", &args).unwrap(), "abc");
    }

    #[test]
    fn test_tool_failures_are_strings() {
        let dir = TempDir::new().unwrap();
        let tools = toolbox(&dir);

        assert!(
            tools
                .call("read_file", r#"{"path": "missing.txt"}"#)
                .unwrap()
                .starts_with("Error: failed to read")
        );
        assert_eq!(
            tools.call("read_file", "{}").unwrap(),
            "Error: Missing 'path' argument"
        );
        assert!(
            tools
                .call("read_file", "not json")
                .unwrap()
                .starts_with("Error parsing arguments")
        );
        assert_eq!(
            tools.call("delete_everything", "{}").unwrap(),
            "Error: Tool 'delete_everything' not found."
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_command_runs_in_workspace() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker"), "").unwrap();
        let tools = toolbox(&dir);

        let out = tools
            .call("run_shell_command", r#"{"command": "ls; exit 3"}"#)
            .unwrap();
        assert_eq!(out, "exit code: 3\nmarker\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_cancelled_shell_command_is_err() {
        let dir = TempDir::new().unwrap();
        let cancel = crate::process::CancelToken::new();
        cancel.cancel();
        let tools = Toolbox::new(dir.path(), Limits::new(None, cancel));

        let result = tools.call("run_shell_command", r#"{"command": "sleep 10"}"#);
        assert!(matches!(result, Err(ForklineError::Cancelled)));
    }
}
