//! Build command execution
//!
//! Runs the static build as a child process, captures its output with a size
//! bound, enforces a timeout and classifies the result as a [`BuildOutcome`].
//!
//! On unix the shell is the leader of a fresh process group. Whatever the build
//! forks stays in that group, and the group is killed once the shell exits or
//! times out, so no build process outlives [`BuildExecutor::execute`].

use crate::config::BuildConfig;
use crate::domain::{BuildOutcome, FailureReason, Result, SitepackError};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// How long output readers may keep draining after the process is gone.
/// A process that left the build's group can hold the pipes open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_secs(5);

const READ_CHUNK: usize = 8 * 1024;

/// Executes build commands
#[derive(Debug, Clone)]
pub struct BuildExecutor {
    timeout: Duration,
    max_output_bytes: usize,
    error_patterns: Vec<Regex>,
}

impl BuildExecutor {
    /// Create an executor with the given timeout and output bound
    pub fn new(timeout: Duration, max_output_bytes: usize) -> Self {
        Self {
            timeout,
            max_output_bytes,
            error_patterns: Vec::new(),
        }
    }

    /// Create an executor from the `[build]` configuration section
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an error pattern is not a valid regex.
    pub fn from_config(config: &BuildConfig) -> Result<Self> {
        let patterns = config
            .error_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    SitepackError::Configuration(format!("Invalid build error pattern '{p}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(
            Duration::from_secs(config.timeout_secs),
            config.max_output_bytes,
        )
        .with_error_patterns(patterns))
    }

    /// Treat a zero-exit build as failed when stderr matches any of these
    pub fn with_error_patterns(mut self, patterns: Vec<Regex>) -> Self {
        self.error_patterns = patterns;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `command` in `working_dir` with `env` merged over the inherited environment
    ///
    /// Never returns an error: every failure mode is a [`BuildOutcome::Failure`].
    pub async fn execute(
        &self,
        command: &str,
        working_dir: &Path,
        env: &BTreeMap<String, String>,
    ) -> BuildOutcome {
        let start = Instant::now();
        tracing::info!(
            command = %command,
            working_dir = %working_dir.display(),
            timeout_secs = self.timeout.as_secs(),
            "Starting build command"
        );
        log_directory_contents(working_dir).await;

        let (shell, shell_args) = shell_invocation();
        let mut cmd = Command::new(shell);
        cmd.args(shell_args)
            .arg(command)
            .current_dir(working_dir)
            .envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(command = %command, error = %e, "Failed to spawn build command");
                return BuildOutcome::Failure {
                    reason: FailureReason::Spawn(e.to_string()),
                    stdout: String::new(),
                    stderr: String::new(),
                };
            }
        };

        let mut group = ProcessGroup::new(child.id());
        let capture = Arc::new(Mutex::new(Capture::new(self.max_output_bytes)));
        let readers = [
            child
                .stdout
                .take()
                .map(|pipe| spawn_reader(pipe, capture.clone(), Stream::Stdout)),
            child
                .stderr
                .take()
                .map(|pipe| spawn_reader(pipe, capture.clone(), Stream::Stderr)),
        ];

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => Some(status),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Failed to wait for build command");
                group.kill();
                let _ = child.kill().await;
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "Build command timed out, killing process group"
                );
                group.kill();
                if let Err(e) = child.kill().await {
                    tracing::error!(error = %e, "Failed to kill timed out build command");
                }
                None
            }
        };

        if group.kill() {
            tracing::warn!("Killed build processes still running after the command exited");
        }

        for reader in readers.into_iter().flatten() {
            drain(reader).await;
        }

        let (stdout, stderr, overflowed) = match capture.lock() {
            Ok(captured) => captured.snapshot(),
            Err(poisoned) => poisoned.into_inner().snapshot(),
        };

        let outcome = self.classify(status, stdout, stderr, overflowed);
        let duration = start.elapsed();
        match &outcome {
            BuildOutcome::Success { .. } => tracing::info!(
                command = %command,
                duration_ms = duration.as_millis() as u64,
                "Build command succeeded"
            ),
            BuildOutcome::Failure { reason, stderr, .. } => {
                tracing::warn!(
                    command = %command,
                    reason = %reason,
                    duration_ms = duration.as_millis() as u64,
                    "Build command failed"
                );
                tracing::debug!(stderr = %stderr, "Build stderr");
            }
        }
        outcome
    }

    fn classify(
        &self,
        status: Option<ExitStatus>,
        stdout: String,
        stderr: String,
        overflowed: bool,
    ) -> BuildOutcome {
        let reason = match status {
            None => Some(FailureReason::TimedOut),
            Some(_) if overflowed => Some(FailureReason::OutputTooLarge),
            Some(status) if !status.success() => Some(FailureReason::ExitStatus(status.code())),
            Some(_) if self.error_patterns.iter().any(|p| p.is_match(&stderr)) => {
                Some(FailureReason::ReportedErrors)
            }
            Some(_) => None,
        };

        match reason {
            Some(reason) => BuildOutcome::Failure {
                reason,
                stdout,
                stderr,
            },
            None => BuildOutcome::Success { stdout, stderr },
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Output captured from both pipes, bounded by a shared byte budget
struct Capture {
    limit: usize,
    total: usize,
    overflowed: bool,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl Capture {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            total: 0,
            overflowed: false,
            stdout: Vec::new(),
            stderr: Vec::new(),
        }
    }

    fn push(&mut self, stream: Stream, chunk: &[u8]) {
        let remaining = self.limit.saturating_sub(self.total);
        if chunk.len() > remaining {
            self.overflowed = true;
        }
        let kept = &chunk[..chunk.len().min(remaining)];
        self.total += kept.len();
        match stream {
            Stream::Stdout => self.stdout.extend_from_slice(kept),
            Stream::Stderr => self.stderr.extend_from_slice(kept),
        }
    }

    fn snapshot(&self) -> (String, String, bool) {
        (
            String::from_utf8_lossy(&self.stdout).into_owned(),
            String::from_utf8_lossy(&self.stderr).into_owned(),
            self.overflowed,
        )
    }
}

/// Read a pipe to EOF; bytes past the budget are drained and discarded
fn spawn_reader<R>(mut pipe: R, capture: Arc<Mutex<Capture>>, stream: Stream) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            match pipe.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    if let Ok(mut captured) = capture.lock() {
                        captured.push(stream, &buf[..n]);
                    }
                }
                Err(e) => {
                    tracing::debug!(stream = ?stream, error = %e, "Build output pipe closed with error");
                    break;
                }
            }
        }
    })
}

async fn drain(reader: JoinHandle<()>) {
    let abort = reader.abort_handle();
    if tokio::time::timeout(DRAIN_GRACE, reader).await.is_err() {
        tracing::warn!("Build output still open after process exit, abandoning reader");
        abort.abort();
    }
}

async fn log_directory_contents(dir: &Path) {
    let mut names = Vec::new();
    match tokio::fs::read_dir(dir).await {
        Ok(mut entries) => {
            while let Ok(Some(entry)) = entries.next_entry().await {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
            names.sort();
            tracing::debug!(
                working_dir = %dir.display(),
                entries = %names.join(", "),
                "Build working directory contents"
            );
        }
        Err(e) => {
            tracing::debug!(working_dir = %dir.display(), error = %e, "Cannot list working directory");
        }
    }
}

/// Process group led by the build shell; killed on drop
///
/// On other platforms only the shell itself is killed, through
/// `kill_on_drop`.
struct ProcessGroup {
    #[cfg(unix)]
    leader: Option<nix::unistd::Pid>,
}

impl ProcessGroup {
    #[cfg(unix)]
    fn new(pid: Option<u32>) -> Self {
        Self {
            leader: pid
                .and_then(|pid| i32::try_from(pid).ok())
                .map(nix::unistd::Pid::from_raw),
        }
    }

    #[cfg(not(unix))]
    fn new(_pid: Option<u32>) -> Self {
        Self {}
    }

    /// SIGKILL every process left in the group
    ///
    /// Returns `true` when at least one process was signalled. Only the first
    /// call sends a signal.
    #[cfg(unix)]
    fn kill(&mut self) -> bool {
        use nix::sys::signal::{killpg, Signal};

        match self.leader.take() {
            Some(leader) => killpg(leader, Signal::SIGKILL).is_ok(),
            None => false,
        }
    }

    #[cfg(not(unix))]
    fn kill(&mut self) -> bool {
        false
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Shell used to interpret the build command line
fn shell_invocation() -> (&'static str, &'static [&'static str]) {
    #[cfg(unix)]
    {
        ("/bin/sh", &["-c"])
    }

    #[cfg(windows)]
    {
        ("cmd.exe", &["/C"])
    }
}
