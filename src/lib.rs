// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod run;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::debug;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{Runtime, RuntimeEvent, RuntimeOptions};
use crate::run::Task;
use crate::watch::ChangeFilter;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file, or the legacy `&&`-joined command string)
/// - the change filter + file watcher
/// - Ctrl-C handling
/// - the runtime trigger loop
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = match args.commands {
        Some(ref commands) => ConfigFile::from_command_string(commands)?,
        None => load_and_validate(&args.config)?,
    };

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let tasks: Arc<[Task]> = cfg.tasks().into();

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    // Optional file watcher (disabled in --once mode).
    let _watcher_handle = if !args.once {
        let filter = ChangeFilter::new(&cfg.watch.extensions, &cfg.watch.ignore)?;
        Some(watch::spawn_watcher(
            cfg.watch.dir.clone(),
            filter,
            rt_tx.clone(),
        )?)
    } else {
        None
    };

    // Ctrl-C → interrupt event.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::InterruptRequested).await;
        });
    }

    let options = RuntimeOptions {
        exit_after_first_run: args.once,
    };

    let runtime = Runtime::new(tasks, options, rt_rx, rt_tx);
    runtime.run().await
}

/// Simple dry-run output: print watch settings and the task table.
fn print_dry_run(cfg: &ConfigFile) {
    println!("onchange dry-run");
    println!("  watch.dir = {}", cfg.watch.dir);
    println!("  watch.extensions = {:?}", cfg.watch.extensions);
    println!("  watch.ignore = {:?}", cfg.watch.ignore);
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name}");
        println!("      cmd: {}", task.cmd);
        if task.nowait {
            println!("      nowait: true");
        }
    }

    debug!("dry-run complete (no execution)");
}
