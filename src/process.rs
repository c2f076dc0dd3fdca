//! Subprocess execution with timeout, cancellation, and full output capture.
//!
//! Every external invocation (git, backend CLIs, verification commands, the
//! native agent's shell tool) goes through [`run_process`]. Output is drained
//! on reader threads so a child writing megabytes never blocks on a full pipe
//! while we poll for its exit.
//!
//! On Unix each child leads its own process group. Killing the group takes
//! down everything a shell command forked, so nothing keeps the output pipes
//! open (or keeps editing the workspace) once the call has returned.

use std::io::{self, Read};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Shared cancellation flag threaded from the orchestrator to every subprocess.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Running children are killed at their next poll.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Limits applied to one subprocess invocation.
#[derive(Debug, Clone, Default)]
pub struct Limits {
    /// Kill the child after this long. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Kill the child as soon as this token is cancelled.
    pub cancel: CancelToken,
}

impl Limits {
    pub fn new(timeout: Option<Duration>, cancel: CancelToken) -> Self {
        Self { timeout, cancel }
    }

    pub fn with_timeout_secs(seconds: u64, cancel: CancelToken) -> Self {
        Self::new(Some(Duration::from_secs(seconds)), cancel)
    }
}

/// Captured result of a finished (or killed) subprocess.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit code (None if killed or terminated by a signal).
    pub exit_code: Option<i32>,
    /// Full standard output, lossily decoded.
    pub stdout: String,
    /// Full standard error, lossily decoded.
    pub stderr: String,
    /// Whether the process was killed because the timeout elapsed.
    pub timed_out: bool,
    /// Whether the process was killed because the run was cancelled.
    pub cancelled: bool,
    /// Wall-clock duration of the invocation.
    pub duration: Duration,
}

impl ProcessOutput {
    /// True iff the process exited on its own with status zero.
    pub fn is_success(&self) -> bool {
        !self.timed_out && !self.cancelled && self.exit_code == Some(0)
    }

    /// Standard output followed by standard error.
    pub fn combined(&self) -> String {
        let mut combined = String::with_capacity(self.stdout.len() + self.stderr.len());
        combined.push_str(&self.stdout);
        combined.push_str(&self.stderr);
        combined
    }
}

/// Spawn `command` with piped output and wait for it under `limits`.
///
/// Returns `Err` only if the process could not be spawned or waited on; a
/// non-zero exit, a timeout, or a cancellation are all reported through
/// [`ProcessOutput`].
pub fn run_process(mut command: Command, limits: &Limits) -> io::Result<ProcessOutput> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let start = Instant::now();
    let mut child = command.spawn()?;

    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let (exit_code, timed_out, cancelled) = wait_with_limits(&mut child, limits)?;
    // Background leftovers of a command that exited on its own.
    kill_process_group(&child);

    let stdout = join_reader(stdout_reader);
    let stderr = join_reader(stderr_reader);

    Ok(ProcessOutput {
        exit_code,
        stdout,
        stderr,
        timed_out,
        cancelled,
        duration: start.elapsed(),
    })
}

/// The last `max_chars` characters of `text`, cut on a char boundary.
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return "";
    }
    match text.char_indices().rev().nth(max_chars - 1) {
        Some((start, _)) => &text[start..],
        None => text,
    }
}

/// Build a command that runs `script` through the platform shell.
pub fn shell_command(script: &str) -> Command {
    #[cfg(windows)]
    {
        let mut command = Command::new("cmd");
        command.args(["/C", script]);
        command
    }
    #[cfg(not(windows))]
    {
        let mut command = Command::new("sh");
        command.args(["-c", script]);
        command
    }
}

/// Wait for a child process, honoring the timeout and cancellation token.
///
/// Returns (exit_code, timed_out, cancelled).
fn wait_with_limits(child: &mut Child, limits: &Limits) -> io::Result<(Option<i32>, bool, bool)> {
    let start = Instant::now();

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((status.code(), false, false));
        }

        if limits.cancel.is_cancelled() {
            kill_process(child);
            return Ok((None, false, true));
        }

        if let Some(timeout) = limits.timeout
            && start.elapsed() >= timeout
        {
            kill_process(child);
            return Ok((None, true, false));
        }

        thread::sleep(POLL_INTERVAL);
    }
}

/// Kill a process, and on Unix its whole process group, then reap it.
fn kill_process(child: &mut Child) {
    kill_process_group(child);
    // On Unix this is SIGKILL; on Windows it is TerminateProcess.
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(unix)]
fn kill_process_group(child: &Child) {
    // The child was spawned with `process_group(0)`, so its pid is the pgid.
    let pgid = child.id() as libc::pid_t;
    // ESRCH just means the group is already gone.
    unsafe {
        libc::killpg(pgid, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_: &Child) {}

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    source.map(|mut source| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = source.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
