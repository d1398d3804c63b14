// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use notify::event::{AccessKind, AccessMode, EventKind};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{ChangeKind, RuntimeEvent};
use crate::errors::{OnchangeError, Result};
use crate::watch::filter::ChangeFilter;

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive
/// for as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher that observes the given `root` directory
/// recursively and forwards every change that passes `filter` to the
/// runtime as a `ChangeDetected` event.
///
/// Watch-mechanism errors are forwarded as `WatchFailed`; they are fatal
/// only if the watch root itself is gone.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    filter: ChangeFilter,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone()); // best-effort

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            if event_tx.send(res).is_err() {
                // We can't log via tracing here easily, so fallback to stderr.
                eprintln!("onchange: failed to forward notify event (runtime gone)");
            }
        },
        Config::default(),
    )
    .map_err(|err| OnchangeError::Watch(err.to_string()))?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|err| OnchangeError::Watch(format!("watching {root:?}: {err}")))?;

    info!("file watcher started on {:?}", root);

    // Async task that consumes notify events and forwards qualifying
    // changes to the runtime.
    let async_root = root.clone();
    tokio::spawn(async move {
        while let Some(res) = event_rx.recv().await {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    let fatal = is_fatal_watch_error(&err, &async_root);
                    let sent = runtime_tx
                        .send(RuntimeEvent::WatchFailed {
                            message: err.to_string(),
                            fatal,
                        })
                        .await;
                    if sent.is_err() || fatal {
                        return;
                    }
                    continue;
                }
            };

            debug!("received notify event: {:?}", event);

            let Some(kind) = change_kind(&event.kind) else {
                continue;
            };

            for path in &event.paths {
                let Some(rel_str) = relative_str(&async_root, path) else {
                    debug!(
                        "could not relativize path {:?} against root {:?}",
                        path, async_root
                    );
                    continue;
                };

                if !filter.is_qualifying(&rel_str) {
                    debug!(path = %rel_str, "change does not qualify");
                    continue;
                }

                let sent = runtime_tx
                    .send(RuntimeEvent::ChangeDetected {
                        path: path.clone(),
                        kind,
                    })
                    .await;
                if sent.is_err() {
                    // If the runtime channel is closed, there's no point
                    // keeping the watcher loop alive.
                    warn!("runtime channel closed, stopping watch forwarding");
                    return;
                }
            }
        }

        debug!("file watcher loop ended");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Map notify's event taxonomy onto the change kinds that can trigger runs.
fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => Some(ChangeKind::CloseWrite),
        _ => None,
    }
}

/// The watch is only unrecoverable when the watched root itself is gone.
fn is_fatal_watch_error(err: &notify::Error, root: &Path) -> bool {
    matches!(err.kind, notify::ErrorKind::PathNotFound) || !root.exists()
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Returns `None` if the path is not under `root` and cannot be relativized.
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let s = rel.to_string_lossy().replace('\\', "/");
    Some(s)
}
