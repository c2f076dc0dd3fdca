//! Tests for config functionality.

use crate::config::{BASE_URL_ENV, CONFIG_FILE_NAME, Config};
use serial_test::serial;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.max_workers, 4);
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.feedback_tail_chars, 2000);
    assert!(config.verify_command.is_none());
    assert_eq!(config.backend, "native");
    assert_eq!(config.worktree_base, ".worktrees");
    assert_eq!(config.branch_prefix, "forkline");
    assert_eq!(config.remote, "origin");
    assert!(config.push_on_success);
    assert!(!config.open_pull_request);
    assert_eq!(config.native.model, "gpt-4o");
    assert_eq!(config.native.api_key_env, "OPENAI_API_KEY");
    assert!(config.planner.enabled);
    assert!(config.validate().is_ok());
}

#[test]
fn test_parse_minimal_yaml() {
    let config = Config::from_yaml("").unwrap();
    assert_eq!(config.max_workers, 4);
    assert_eq!(config.max_retries, 3);
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
max_workers: 8
verify_command: "cargo test --workspace"
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.max_workers, 8);
    assert_eq!(
        config.verify_command.as_deref(),
        Some("cargo test --workspace")
    );
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.backend, "native");
}

#[test]
fn test_parse_full_yaml() {
    let yaml = r#"
max_workers: 2
max_retries: 5
feedback_tail_chars: 500
verify_command: "npm test"
backend: gemini
native:
  model: gpt-4.1
  base_url: http://localhost:11434/v1
  api_key_env: LOCAL_KEY
  max_turns: 12
planner:
  enabled: false
  model: gpt-4o-mini
backends:
  gemini:
    timeout_seconds: 60
    environment:
      GEMINI_SANDBOX: "false"
  claude:
    interactive: false
worktree_base: .swarm
branch_prefix: agents
remote: upstream
push_on_success: false
open_pull_request: true
git_timeout_seconds: 30
backend_timeout_seconds: 600
verify_timeout_seconds: 300
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.max_workers, 2);
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.feedback_tail_chars, 500);
    assert_eq!(config.verify_command.as_deref(), Some("npm test"));
    assert_eq!(config.backend, "gemini");
    assert_eq!(config.native.model, "gpt-4.1");
    assert_eq!(config.native.base_url, "http://localhost:11434/v1");
    assert_eq!(config.native.api_key_env, "LOCAL_KEY");
    assert_eq!(config.native.max_turns, 12);
    assert!(!config.planner.enabled);
    assert_eq!(config.planner_model(), "gpt-4o-mini");
    assert_eq!(config.backend_timeout("gemini"), Duration::from_secs(60));
    assert_eq!(config.backend_timeout("codex"), Duration::from_secs(600));
    assert_eq!(
        config.backend_settings("claude").unwrap().interactive,
        Some(false)
    );
    assert_eq!(config.worktree_base, ".swarm");
    assert_eq!(config.branch_prefix, "agents");
    assert_eq!(config.remote, "upstream");
    assert!(!config.push_on_success);
    assert!(config.open_pull_request);
    assert_eq!(config.git_timeout_seconds, 30);
    assert_eq!(config.verify_timeout_seconds, 300);
}

#[test]
fn test_parse_yaml_with_unknown_fields() {
    let yaml = r#"
max_workers: 3
some_future_field: true
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert_eq!(config.max_workers, 3);
}

#[test]
fn test_planner_model_defaults_to_native_model() {
    let config = Config::from_yaml("native:\n  model: local-coder\n").unwrap();
    assert_eq!(config.planner_model(), "local-coder");
}

#[test]
fn test_validate_zero_values() {
    for yaml in [
        "max_workers: 0",
        "max_retries: 0",
        "feedback_tail_chars: 0",
        "git_timeout_seconds: 0",
        "verify_timeout_seconds: 0",
        "native:\n  max_turns: 0",
    ] {
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(
            err.to_string().contains("must be greater than 0"),
            "{yaml}: {err}"
        );
    }
}

#[test]
fn test_validate_empty_branch_prefix() {
    let err = Config::from_yaml("branch_prefix: \"\"").unwrap_err();
    assert!(err.to_string().contains("branch_prefix"));
}

#[test]
fn test_validate_blank_verify_command() {
    let err = Config::from_yaml("verify_command: \"  \"").unwrap_err();
    assert!(err.to_string().contains("verify_command"));
}

#[test]
fn test_validate_custom_backend_requires_command() {
    let err = Config::from_yaml("backend: custom").unwrap_err();
    assert!(err.to_string().contains("backends.custom.command"));

    let yaml = r#"
backend: custom
backends:
  custom:
    command: "aider --yes --message {prompt}"
"#;
    assert!(Config::from_yaml(yaml).is_ok());
}

#[test]
fn test_validate_zero_backend_timeout() {
    let yaml = r#"
backends:
  gemini:
    timeout_seconds: 0
"#;
    let err = Config::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("backends.gemini.timeout_seconds"));
}

#[test]
fn test_to_yaml_roundtrips_defaults() {
    let config = Config::default();
    let yaml = config.to_yaml().unwrap();
    let parsed = Config::from_yaml(&yaml).unwrap();
    assert_eq!(parsed.max_workers, config.max_workers);
    assert_eq!(parsed.branch_prefix, config.branch_prefix);
}

#[test]
#[serial]
fn test_load_or_default_without_file() {
    let temp = TempDir::new().unwrap();
    // SAFETY: serialized with the other env-mutating tests.
    unsafe { std::env::remove_var(BASE_URL_ENV) };

    let config = Config::load_or_default(temp.path()).unwrap();
    assert_eq!(config.max_workers, 4);
    assert_eq!(config.native.base_url, "https://api.openai.com/v1");
}

#[test]
#[serial]
fn test_load_or_default_reads_file_and_env_override() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join(CONFIG_FILE_NAME),
        "max_workers: 6\nnative:\n  base_url: http://from-file/v1\n",
    )
    .unwrap();

    // SAFETY: serialized with the other env-mutating tests.
    unsafe { std::env::set_var(BASE_URL_ENV, "http://from-env/v1") };
    let config = Config::load_or_default(temp.path()).unwrap();
    unsafe { std::env::remove_var(BASE_URL_ENV) };

    assert_eq!(config.max_workers, 6);
    assert_eq!(config.native.base_url, "http://from-env/v1");
}

#[test]
fn test_load_invalid_file_is_config_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "max_workers: [not, a, number]\n").unwrap();

    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, crate::error::ForklineError::ConfigError(_)));
}
