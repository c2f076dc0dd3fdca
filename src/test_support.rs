use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// A throwaway repository, optionally with a bare `origin` remote.
pub(crate) struct TestRepo {
    dir: TempDir,
    remote: Option<TempDir>,
}

impl TestRepo {
    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    pub(crate) fn remote_path(&self) -> Option<&Path> {
        self.remote.as_ref().map(|r| r.path())
    }
}

pub(crate) fn create_test_repo() -> TestRepo {
    create_repo(false)
}

pub(crate) fn create_test_repo_with_remote() -> TestRepo {
    create_repo(true)
}

fn create_repo(add_origin_remote: bool) -> TestRepo {
    let dir = TempDir::new().unwrap();
    let path = dir.path();

    git(path, &["init"]);
    // Deterministic default branch name across environments.
    git(path, &["symbolic-ref", "HEAD", "refs/heads/main"]);

    git(path, &["config", "user.email", "test@example.com"]);
    git(path, &["config", "user.name", "Test User"]);

    // Worktree creation needs at least one commit.
    std::fs::write(path.join("README.md"), "# Test\n").unwrap();
    git(path, &["add", "."]);
    git(path, &["commit", "-m", "Initial commit"]);

    let remote = if add_origin_remote {
        let remote = TempDir::new().unwrap();
        git(remote.path(), &["init", "--bare"]);
        let remote_str = remote.path().to_string_lossy().to_string();
        git(path, &["remote", "add", "origin", &remote_str]);
        Some(remote)
    } else {
        None
    };

    TestRepo { dir, remote }
}

pub(crate) fn git(repo_dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .current_dir(repo_dir)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute git {}: {}", args.join(" "), e));

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "git {} failed (exit code {:?})\nstdout:\n{}\nstderr:\n{}",
            args.join(" "),
            output.status.code(),
            stdout,
            stderr
        );
    }

    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
