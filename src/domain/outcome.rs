//! Build outcome model
//!
//! A [`BuildOutcome`] is produced exactly once per build by the executor and
//! consumed once by the export orchestrator.

use crate::domain::errors::BuildError;
use std::fmt;

/// Why a build was classified as failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The process exited with a non-zero status (`None` when killed by a signal)
    ExitStatus(Option<i32>),
    /// The process exited cleanly but stderr matched a configured error pattern
    ReportedErrors,
    /// Captured stdout+stderr exceeded the configured bound
    OutputTooLarge,
    /// The process exceeded the build timeout
    TimedOut,
    /// The process could not be started
    Spawn(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ExitStatus(_) => write!(f, "build command exited with error"),
            FailureReason::ReportedErrors => write!(f, "build reported errors"),
            FailureReason::OutputTooLarge => write!(f, "output too large"),
            FailureReason::TimedOut => write!(f, "build timed out"),
            FailureReason::Spawn(msg) => write!(f, "failed to start build command: {msg}"),
        }
    }
}

/// Result of running the build command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Success {
        stdout: String,
        stderr: String,
    },
    Failure {
        reason: FailureReason,
        stdout: String,
        stderr: String,
    },
}

impl BuildOutcome {
    /// Check whether the build succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Success { .. })
    }

    pub fn stdout(&self) -> &str {
        match self {
            BuildOutcome::Success { stdout, .. } | BuildOutcome::Failure { stdout, .. } => stdout,
        }
    }

    pub fn stderr(&self) -> &str {
        match self {
            BuildOutcome::Success { stderr, .. } | BuildOutcome::Failure { stderr, .. } => stderr,
        }
    }

    /// Convert into a `Result`, keeping the captured output on failure
    ///
    /// `timeout_secs` is only used to describe a [`FailureReason::TimedOut`] failure.
    pub fn into_result(self, timeout_secs: u64) -> Result<(), BuildError> {
        match self {
            BuildOutcome::Success { .. } => Ok(()),
            BuildOutcome::Failure {
                reason: FailureReason::TimedOut,
                stdout,
                stderr,
            } => Err(BuildError::TimedOut {
                timeout_secs,
                stdout,
                stderr,
            }),
            BuildOutcome::Failure {
                reason,
                stdout,
                stderr,
            } => Err(BuildError::Failed {
                reason,
                stdout,
                stderr,
            }),
        }
    }
}
