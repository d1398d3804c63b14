// src/config/validate.rs

use globset::Glob;

use crate::config::model::ConfigFile;
use crate::errors::{OnchangeError, Result};

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - there is at least one task
/// - no task has a blank `cmd`
/// - the extension allow-list is non-empty
/// - every ignore pattern compiles as a glob
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_task_commands(cfg)?;
    validate_watch_section(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &ConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(OnchangeError::Config(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_commands(cfg: &ConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.cmd.trim().is_empty() {
            return Err(OnchangeError::Config(format!(
                "task '{name}' has an empty `cmd`"
            )));
        }
    }
    Ok(())
}

fn validate_watch_section(cfg: &ConfigFile) -> Result<()> {
    if cfg.watch.dir.trim().is_empty() {
        return Err(OnchangeError::Config(
            "[watch].dir must not be empty".to_string(),
        ));
    }

    if cfg.watch.extensions.is_empty() {
        return Err(OnchangeError::Config(
            "[watch].extensions must list at least one extension".to_string(),
        ));
    }

    for pat in cfg.watch.ignore.iter() {
        if let Err(err) = Glob::new(pat) {
            return Err(OnchangeError::Config(format!(
                "invalid [watch].ignore glob pattern {pat:?}: {err}"
            )));
        }
    }

    Ok(())
}
