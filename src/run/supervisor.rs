// src/run/supervisor.rs

//! One run of the full task set.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

use crate::run::outcome::{RunResult, TaskReport};
use crate::run::{RunRequest, Task, TaskName, WaitPolicy, process};

/// Single-fire kill handle for one launched process.
///
/// Sending consumes the handle, so a second delivery to the same process is
/// unrepresentable.
struct KillHandle {
    task: TaskName,
    tx: oneshot::Sender<()>,
}

impl KillHandle {
    fn fire(self) {
        // A closed channel means the runner already reached a terminal
        // state; the kill is a no-op then.
        if self.tx.send(()).is_err() {
            debug!(task = %self.task, "kill skipped, task already terminal");
        }
    }
}

/// Drives one [`RunRequest`]: launches every configured task, aggregates
/// the outcomes of the waited-on ones, and guarantees that a cancellation
/// reaches every still-running process exactly once and that nothing the
/// run owns is left alive after a cancelled run.
///
/// A supervisor value is built per run and owns its own kill handles, so
/// signals cannot leak across runs and a fired cancellation source cannot
/// be reused.
pub struct RunSupervisor {
    tasks: Arc<[Task]>,
}

impl RunSupervisor {
    pub fn new(tasks: Arc<[Task]>) -> Self {
        Self { tasks }
    }

    /// Execute the task set, racing aggregate completion of the waited-on
    /// tasks against `cancel`.
    ///
    /// - All waited-on tasks terminal first: the result is `AllSucceeded` or
    ///   `SomeFailed`; a cancellation firing afterwards has no effect on
    ///   this run.
    /// - Cancellation first: every still-running process (fire-and-forget
    ///   included) is killed, and this does not return until all of them
    ///   are terminal.
    ///
    /// `cancel` must be a fresh channel per call. Dropping the send half
    /// without firing lets the run complete naturally.
    pub async fn execute(self, request: RunRequest, cancel: oneshot::Receiver<()>) -> RunResult {
        info!(reason = %request.reason, tasks = self.tasks.len(), "run started");

        let mut waited: JoinSet<TaskReport> = JoinSet::new();
        let mut detached: Vec<JoinHandle<TaskReport>> = Vec::new();
        let mut kills: Vec<KillHandle> = Vec::with_capacity(self.tasks.len());

        // Launch in configuration order; completion order is unspecified.
        for task in self.tasks.iter() {
            let (kill_tx, kill_rx) = oneshot::channel();
            kills.push(KillHandle {
                task: task.name.clone(),
                tx: kill_tx,
            });

            let runner = process::run(task.clone(), kill_rx);
            match task.wait_policy {
                WaitPolicy::MustComplete => {
                    waited.spawn(runner);
                }
                WaitPolicy::FireAndForget => detached.push(tokio::spawn(runner)),
            }
        }

        let mut cancel = cancel;
        let mut cancel_live = true;
        let mut cancelled = false;
        let mut reports: Vec<TaskReport> = Vec::new();

        while !waited.is_empty() {
            tokio::select! {
                joined = waited.join_next() => match joined {
                    Some(Ok(report)) => reports.push(report),
                    Some(Err(err)) => error!(error = %err, "task runner panicked"),
                    None => break,
                },
                fired = &mut cancel, if cancel_live => {
                    // The cancel source is observed at most once, whether it
                    // fired or was dropped.
                    cancel_live = false;
                    if fired.is_ok() {
                        cancelled = true;
                        info!(reason = %request.reason, "run cancelled, killing remaining tasks");
                        for kill in kills.drain(..) {
                            kill.fire();
                        }
                    }
                }
            }
        }

        if cancelled {
            // The waited set has drained above; fire-and-forget tasks were
            // killed too and must be terminal before this run concludes.
            for handle in detached {
                if let Err(err) = handle.await {
                    error!(error = %err, "task runner panicked");
                }
            }
            return RunResult::Cancelled;
        }

        let failed: Vec<TaskName> = reports
            .iter()
            .filter(|report| report.outcome.is_failure())
            .map(|report| report.task.clone())
            .collect();

        if failed.is_empty() {
            RunResult::AllSucceeded
        } else {
            RunResult::SomeFailed(failed)
        }
    }
}
