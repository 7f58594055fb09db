//! Subprocess execution with classified-error retry.
//!
//! [`run_command`] never fails: spawn problems, wait errors and non-zero exits
//! all come back as an [`ExecutionResult`]. Only spawn failures classified as
//! transient (see [`ErrorKind::is_transient`]) are retried; a process that
//! actually ran is never started a second time.

use crate::classify::{classify_io_error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinSet;

/// Fixed pause between spawn attempts, in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Fixed pause between spawn attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(DEFAULT_RETRY_DELAY_MS);

/// Options for a single [`run_command`] call.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Extra spawn attempts allowed after a transient failure.
    pub retries: u32,
    /// Pause before each retry.
    pub retry_delay: Duration,
    /// Variables set on top of the inherited environment.
    pub env: Vec<(String, String)>,
    /// Working directory for the child.
    pub cwd: Option<PathBuf>,
    /// Payload written to the child's stdin, which is then closed.
    /// `None` connects stdin to the null device.
    pub stdin: Option<String>,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            retries: 0,
            retry_delay: DEFAULT_RETRY_DELAY,
            env: Vec::new(),
            cwd: None,
            stdin: None,
        }
    }
}

impl ExecOptions {
    /// Sets the retry budget.
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the pause between attempts.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sets the stdin payload.
    #[must_use]
    pub fn with_stdin(mut self, payload: impl Into<String>) -> Self {
        self.stdin = Some(payload.into());
        self
    }

    /// Adds an environment override.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Outcome of one [`run_command`] call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// `exit_code == 0`.
    pub success: bool,
    /// Process exit code; `-1` when the process never ran or died by signal.
    pub exit_code: i32,
    /// Full captured stdout.
    pub stdout: String,
    /// Full captured stderr, or the OS error message for spawn failures.
    pub stderr: String,
    /// Set only when the process could not be spawned.
    pub error_kind: Option<ErrorKind>,
    /// Number of spawn attempts made.
    pub attempts: u32,
    /// Wall-clock time across all attempts.
    pub duration_ms: u64,
}

impl ExecutionResult {
    fn spawn_failed(err: &io::Error, kind: ErrorKind) -> Self {
        Self {
            success: false,
            exit_code: -1,
            stdout: String::new(),
            stderr: err.to_string(),
            error_kind: Some(kind),
            attempts: 0,
            duration_ms: 0,
        }
    }

    /// The process ran but its exit status could not be collected.
    fn wait_failed(stdout: String, mut stderr: String, err: &io::Error) -> Self {
        if !stderr.is_empty() && !stderr.ends_with('\n') {
            stderr.push('\n');
        }
        stderr.push_str(&err.to_string());
        Self {
            success: false,
            exit_code: -1,
            stdout,
            stderr,
            error_kind: None,
            attempts: 0,
            duration_ms: 0,
        }
    }

    /// Returns `true` if the process could not be started at all.
    #[must_use]
    pub const fn is_spawn_failure(&self) -> bool {
        self.error_kind.is_some()
    }
}

#[derive(Debug, Clone, Copy)]
enum Pipe {
    Stdin,
    Stdout,
    Stderr,
}

/// Runs `command` with `args`, retrying transient spawn failures.
///
/// At most `options.retries + 1` processes are spawned. stdout and stderr are
/// drained to EOF before the result is built.
pub async fn run_command<S: AsRef<OsStr>>(
    command: &str,
    args: &[S],
    options: &ExecOptions,
) -> ExecutionResult {
    retry_spawns(command, options, || run_once(command, args, options)).await
}

/// Drives `attempt` until it spawns, fails non-transiently or the budget runs out.
async fn retry_spawns<F, Fut>(
    command: &str,
    options: &ExecOptions,
    mut attempt: F,
) -> ExecutionResult
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<ExecutionResult, io::Error>>,
{
    let start_time = Instant::now();
    let mut attempts = 0u32;

    let mut result = loop {
        attempts += 1;
        tracing::debug!(command, attempt = attempts, "spawning process");

        match attempt().await {
            Ok(result) => break result,
            Err(e) => {
                let kind = classify_io_error(&e);
                if kind.is_transient() && attempts <= options.retries {
                    tracing::warn!(
                        command,
                        attempt = attempts,
                        kind = %kind,
                        error = %e,
                        "spawn failed, retrying in {:?}",
                        options.retry_delay
                    );
                    tokio::time::sleep(options.retry_delay).await;
                    continue;
                }
                tracing::error!(command, attempts, kind = %kind, error = %e, "spawn failed");
                break ExecutionResult::spawn_failed(&e, kind);
            }
        }
    };

    result.attempts = attempts;
    result.duration_ms = u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX);
    result
}

/// One physical attempt. `Err` is reserved for spawn failures.
async fn run_once<S: AsRef<OsStr>>(
    command: &str,
    args: &[S],
    options: &ExecOptions,
) -> Result<ExecutionResult, io::Error> {
    let mut cmd = Command::new(command);
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(if options.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

    if let Some(ref dir) = options.cwd {
        cmd.current_dir(dir);
    }

    for (k, v) in &options.env {
        cmd.env(k, v);
    }

    let mut child = cmd.spawn()?;
    let mut tasks = JoinSet::new();

    if let (Some(payload), Some(mut stdin)) = (options.stdin.clone(), child.stdin.take()) {
        tasks.spawn(async move {
            if let Err(e) = stdin.write_all(payload.as_bytes()).await {
                // A child that exits without reading stdin closes the pipe on us.
                tracing::debug!(error = %e, "stdin closed early");
            }
            drop(stdin);
            (Pipe::Stdin, Vec::new())
        });
    }
    if let Some(stdout) = child.stdout.take() {
        tasks.spawn(drain_pipe(Pipe::Stdout, stdout));
    }
    if let Some(stderr) = child.stderr.take() {
        tasks.spawn(drain_pipe(Pipe::Stderr, stderr));
    }

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((Pipe::Stdout, bytes)) => stdout = bytes,
            Ok((Pipe::Stderr, bytes)) => stderr = bytes,
            Ok((Pipe::Stdin, _)) => {}
            Err(e) => tracing::warn!(error = %e, "pipe task failed"),
        }
    }

    let stdout = String::from_utf8_lossy(&stdout).into_owned();
    let stderr = String::from_utf8_lossy(&stderr).into_owned();

    let result = match child.wait().await {
        Ok(status) => {
            let exit_code = status.code().unwrap_or(-1);
            tracing::debug!(
                command,
                exit_code,
                stdout_bytes = stdout.len(),
                stderr_bytes = stderr.len(),
                "process exited"
            );
            ExecutionResult {
                success: exit_code == 0,
                exit_code,
                stdout,
                stderr,
                error_kind: None,
                attempts: 0,
                duration_ms: 0,
            }
        }
        Err(e) => {
            tracing::warn!(command, error = %e, "failed to wait for child");
            ExecutionResult::wait_failed(stdout, stderr, &e)
        }
    };

    Ok(result)
}

async fn drain_pipe(pipe: Pipe, mut reader: impl AsyncRead + Unpin) -> (Pipe, Vec<u8>) {
    let mut buf = Vec::new();
    if let Err(e) = reader.read_to_end(&mut buf).await {
        tracing::debug!(?pipe, error = %e, "read ended early");
    }
    (pipe, buf)
}
