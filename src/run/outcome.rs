// src/run/outcome.rs

use std::fmt;
use std::process::ExitStatus;

use super::TaskName;

/// Terminal result of one task execution.
///
/// Produced exactly once per launched process: either the natural-exit path
/// or the kill path writes it, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The process exited with a successful status.
    Succeeded,
    /// The process could not be launched, or ran and exited unsuccessfully.
    Failed(Failure),
    /// The process was terminated by a kill request. The actual exit status
    /// is irrelevant since the cause of termination was external.
    Killed,
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// Why a task counts as failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Spawning or waiting on the process failed at the OS level
    /// (missing executable, permission error).
    Io(String),
    /// The process ran to completion with an unsuccessful exit status.
    Exit(ExitInfo),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Io(msg) => write!(f, "{msg}"),
            Failure::Exit(info) => write!(f, "{info}"),
        }
    }
}

/// Exit detail for a process that ran and terminated unsuccessfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitInfo {
    pub code: Option<i32>,
    /// Terminating signal, where the platform reports one.
    pub signal: Option<i32>,
}

impl ExitInfo {
    pub fn from_status(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }
}

impl fmt::Display for ExitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {code}"),
            (None, Some(signal)) => write!(f, "terminated by signal {signal}"),
            (None, None) => write!(f, "unknown exit status"),
        }
    }
}

/// Final report from one process runner.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub task: TaskName,
    pub outcome: Outcome,
}

/// Aggregate result over the waited-on tasks of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    AllSucceeded,
    /// Names of the tasks that failed, in completion order.
    SomeFailed(Vec<TaskName>),
    /// The run was cancelled before every waited-on task finished. All of
    /// the run's processes were killed or already terminal when this was
    /// produced.
    Cancelled,
}
