// src/engine/runtime.rs

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::engine::queue::PendingTrigger;
use crate::run::{RunRequest, RunResult, RunSupervisor, Task, TriggerReason};

/// Kind of filesystem change, as reported by the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    CloseWrite,
}

/// Events sent into the runtime from the watcher, finished runs, or
/// external signals.
///
/// The idea is that:
/// - the watcher sends `ChangeDetected` for qualifying changes
/// - each spawned run sends `RunFinished` when it concludes
/// - Ctrl-C handling sends `InterruptRequested`
/// - the watcher sends `WatchFailed` for watch-mechanism errors
#[derive(Debug)]
pub enum RuntimeEvent {
    ChangeDetected {
        path: PathBuf,
        kind: ChangeKind,
    },
    /// Sent only after every process the run had to drain is terminal.
    RunFinished {
        result: RunResult,
    },
    InterruptRequested,
    WatchFailed {
        message: String,
        fatal: bool,
    },
}

/// Options that influence how the runtime behaves.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    /// If true, exit as soon as the first run concludes (no watching).
    pub exit_after_first_run: bool,
}

/// Handle on the in-flight run.
///
/// `cancel()` takes the sender, so the run is cancelled at most once no
/// matter how many cancellation causes arrive.
struct ActiveRun {
    cancel_tx: Option<oneshot::Sender<()>>,
}

impl ActiveRun {
    fn cancel(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            // The run may be concluding right now; a closed channel is fine.
            let _ = tx.send(());
        }
    }
}

/// The trigger loop.
///
/// Maintains at most one active run. A qualifying change while a run is in
/// progress cancels it and queues the change as the next trigger; the next
/// run starts only once the cancelled run has fully drained. An operator
/// interrupt cancels the active run (if any) and terminates the loop; an
/// interrupt while idle terminates immediately.
pub struct Runtime {
    tasks: Arc<[Task]>,
    pending: PendingTrigger,
    options: RuntimeOptions,

    /// Unified event stream from all producers (watcher, runs, ctrl-c).
    events_rx: mpsc::Receiver<RuntimeEvent>,
    /// Sender cloned into each spawned run so it can report back.
    events_tx: mpsc::Sender<RuntimeEvent>,

    active: Option<ActiveRun>,
    shutting_down: bool,
    fatal_watch_error: Option<String>,
}

impl Runtime {
    pub fn new(
        tasks: Arc<[Task]>,
        options: RuntimeOptions,
        events_rx: mpsc::Receiver<RuntimeEvent>,
        events_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            tasks,
            pending: PendingTrigger::new(),
            options,
            events_rx,
            events_tx,
            active: None,
            shutting_down: false,
            fatal_watch_error: None,
        }
    }

    /// Main event loop.
    ///
    /// Seeds the startup run, then reacts to events until interrupted (or
    /// until the first run concludes with `exit_after_first_run`).
    pub async fn run(mut self) -> Result<()> {
        info!("onchange runtime started");

        self.start_run(TriggerReason::Startup);

        while let Some(event) = self.events_rx.recv().await {
            debug!(?event, "runtime received event");

            let keep_running = match event {
                RuntimeEvent::ChangeDetected { path, kind } => self.handle_change(path, kind),
                RuntimeEvent::RunFinished { result } => self.handle_run_finished(result),
                RuntimeEvent::InterruptRequested => self.handle_interrupt(),
                RuntimeEvent::WatchFailed { message, fatal } => {
                    self.handle_watch_failure(message, fatal)
                }
            };

            if !keep_running {
                break;
            }
        }

        match self.fatal_watch_error.take() {
            Some(message) => Err(anyhow!("file watching failed: {message}")),
            None => {
                info!("onchange runtime exiting");
                Ok(())
            }
        }
    }

    fn handle_change(&mut self, path: PathBuf, kind: ChangeKind) -> bool {
        if self.shutting_down {
            debug!(path = %path.display(), "ignoring change while shutting down");
            return true;
        }

        match self.active.as_mut() {
            Some(active) => {
                info!(
                    path = %path.display(),
                    ?kind,
                    "change during active run, cancelling current run"
                );
                active.cancel();
                self.pending.record(path);
            }
            None => {
                info!(path = %path.display(), ?kind, "change detected");
                self.start_run(TriggerReason::FileChange(path));
            }
        }

        true
    }

    fn handle_run_finished(&mut self, result: RunResult) -> bool {
        self.active = None;

        match &result {
            RunResult::AllSucceeded => info!("run finished, all tasks succeeded"),
            RunResult::SomeFailed(failed) => {
                warn!(failed = ?failed, "run finished, {} task(s) failed", failed.len());
            }
            RunResult::Cancelled => info!("run cancelled, all of its processes are terminal"),
        }

        if self.shutting_down || self.options.exit_after_first_run {
            return false;
        }

        // A change that arrived mid-run starts the next run only now, after
        // the previous run has drained.
        if let Some(path) = self.pending.take() {
            self.start_run(TriggerReason::FileChange(path));
        }

        true
    }

    fn handle_interrupt(&mut self) -> bool {
        match self.active.as_mut() {
            Some(active) => {
                info!("interrupt received, cancelling active run before exiting");
                active.cancel();
                self.pending.clear();
                self.shutting_down = true;
                true
            }
            None => {
                info!("interrupt received while idle, exiting");
                false
            }
        }
    }

    fn handle_watch_failure(&mut self, message: String, fatal: bool) -> bool {
        if !fatal {
            warn!(%message, "transient watch error, continuing");
            return true;
        }

        error!(%message, "fatal watch error");
        self.fatal_watch_error = Some(message);

        match self.active.as_mut() {
            Some(active) => {
                active.cancel();
                self.pending.clear();
                self.shutting_down = true;
                true
            }
            None => false,
        }
    }

    /// Spawn a run for the given reason and install its cancellation handle.
    ///
    /// Each run gets a fresh supervisor and a fresh cancel channel; fired
    /// sources are never reused across runs.
    fn start_run(&mut self, reason: TriggerReason) {
        let supervisor = RunSupervisor::new(Arc::clone(&self.tasks));
        let request = RunRequest { reason };
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let events_tx = self.events_tx.clone();

        tokio::spawn(async move {
            let result = supervisor.execute(request, cancel_rx).await;
            // The runtime holds the receive half for its whole life; a
            // closed channel only happens at teardown.
            let _ = events_tx.send(RuntimeEvent::RunFinished { result }).await;
        });

        self.active = Some(ActiveRun {
            cancel_tx: Some(cancel_tx),
        });
    }
}
