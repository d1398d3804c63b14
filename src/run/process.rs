// src/run/process.rs

//! Single task process execution.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::run::Task;
use crate::run::outcome::{ExitInfo, Failure, Outcome, TaskReport};

/// How long to wait for a killed process to actually exit before presuming
/// it terminated. `kill_on_drop` remains as a backstop past this point.
const KILL_GRACE: Duration = Duration::from_secs(2);

/// Run a single task process to a terminal outcome.
///
/// Races natural process exit against the single-fire `kill` signal:
/// whichever is observed first wins and the other is discarded. A kill
/// arriving after the process exited is a no-op (the channel is already
/// closed). If the kill half is dropped without firing, the process runs to
/// natural completion.
///
/// Both output streams are forwarded line-buffered, preserving line order
/// within each stream, and fully drained before the outcome is reported.
pub async fn run(task: Task, kill: oneshot::Receiver<()>) -> TaskReport {
    let outcome = run_inner(&task, kill).await;

    match &outcome {
        Outcome::Succeeded => info!(task = %task.name, "task succeeded"),
        Outcome::Failed(failure) => warn!(task = %task.name, %failure, "task failed"),
        Outcome::Killed => info!(task = %task.name, "task killed"),
    }

    TaskReport {
        task: task.name,
        outcome,
    }
}

async fn run_inner(task: &Task, mut kill: oneshot::Receiver<()>) -> Outcome {
    let Some(argv) = shlex::split(&task.cmd) else {
        return Outcome::Failed(Failure::Io(format!(
            "unparseable command line: {:?}",
            task.cmd
        )));
    };
    let Some((program, args)) = argv.split_first() else {
        return Outcome::Failed(Failure::Io("empty command line".to_string()));
    };

    info!(task = %task.name, cmd = %task.cmd, "starting task process");

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            return Outcome::Failed(Failure::Io(format!("launching {program:?}: {err}")));
        }
    };

    let stdout_pump = child
        .stdout
        .take()
        .map(|s| spawn_line_pump(task.name.clone(), s, StreamKind::Stdout));
    let stderr_pump = child
        .stderr
        .take()
        .map(|s| spawn_line_pump(task.name.clone(), s, StreamKind::Stderr));

    // Either the process exits on its own (normal case), or the kill signal
    // arrives first. The race resolves exactly once.
    let waited = tokio::select! {
        status = child.wait() => Some(status),
        fired = &mut kill => {
            match fired {
                Ok(()) => None,
                // The kill half was dropped without firing; this process
                // will never be killed, so wait for natural exit.
                Err(_) => Some(child.wait().await),
            }
        }
    };

    let mut grace_expired = false;
    let outcome = match waited {
        Some(Ok(status)) => {
            if status.success() {
                Outcome::Succeeded
            } else {
                Outcome::Failed(Failure::Exit(ExitInfo::from_status(status)))
            }
        }
        Some(Err(err)) => Outcome::Failed(Failure::Io(format!("waiting for process: {err}"))),
        None => {
            warn!(task = %task.name, "kill requested, terminating process");
            // Killing an already-exited child errors; harmless.
            if let Err(err) = child.start_kill() {
                debug!(task = %task.name, error = %err, "kill was a no-op");
            }
            match timeout(KILL_GRACE, child.wait()).await {
                Ok(Ok(status)) => {
                    debug!(task = %task.name, ?status, "killed process exited")
                }
                Ok(Err(err)) => {
                    debug!(task = %task.name, error = %err, "waiting for killed process")
                }
                Err(_) => {
                    grace_expired = true;
                    warn!(
                        task = %task.name,
                        grace = ?KILL_GRACE,
                        "process did not exit within the grace period, presuming it terminated"
                    );
                }
            }
            Outcome::Killed
        }
    };

    // Drain the output pumps to end-of-stream before reporting, so no output
    // lands after the final status line. A process that survived the grace
    // period still holds its pipes open; abort the pumps instead of hanging.
    for pump in [stdout_pump, stderr_pump].into_iter().flatten() {
        if grace_expired {
            pump.abort();
        } else {
            let _ = pump.await;
        }
    }

    outcome
}

#[derive(Clone, Copy)]
enum StreamKind {
    Stdout,
    Stderr,
}

fn spawn_line_pump<R>(task: String, stream: R, kind: StreamKind) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        pump_lines(stream, |line| match kind {
            StreamKind::Stdout => info!(task = %task, "{line}"),
            StreamKind::Stderr => warn!(task = %task, "{line}"),
        })
        .await;
    })
}

/// Forward every line from `stream` into `sink`, in order, until end of
/// stream. Read errors end the pump early.
pub async fn pump_lines<R>(stream: R, mut sink: impl FnMut(&str))
where
    R: AsyncRead + Unpin,
{
    let reader = BufReader::new(stream);
    let mut lines = reader.lines();

    while let Ok(Some(line)) = lines.next_line().await {
        sink(&line);
    }
}
