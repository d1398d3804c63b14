// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::errors::{OnchangeError, Result};
use crate::run::{Task, WaitPolicy};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [watch]
/// dir = "."
/// extensions = ["rs", "toml", "html", "js"]
/// ignore = ["target/**"]
///
/// [task.build]
/// cmd = "cargo build"
///
/// [task.assets]
/// cmd = "npm run bundle"
/// nowait = true
/// ```
///
/// All sections are optional and have reasonable defaults, except that at
/// least one `[task.<name>]` must be present (checked by `validate.rs`).
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Watch settings from `[watch]`.
    #[serde(default)]
    pub watch: WatchSection,

    /// All tasks from `[task.<name>]`.
    ///
    /// Keys are the *task names* (e.g. `"build"`, `"test"`). The map is
    /// ordered by name, which is the launch order for a run.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Directory to watch, recursively. Relative to the working directory.
    #[serde(default = "default_dir")]
    pub dir: String,

    /// Extension allow-list; a change only qualifies if its file extension
    /// is in this list. Entries may be given with or without a leading dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Glob patterns (relative to `dir`) that never qualify, typically
    /// build-output directories.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

fn default_dir() -> String {
    ".".to_string()
}

fn default_extensions() -> Vec<String> {
    ["rs", "toml", "html", "js"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_ignore() -> Vec<String> {
    vec!["target/**".to_string()]
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            extensions: default_extensions(),
            ignore: default_ignore(),
        }
    }
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// The command to execute, split shell-style into executable + args.
    pub cmd: String,

    /// If true, a run does not wait for this task to finish before reporting
    /// its result; the task keeps running in the background. A cancellation
    /// still kills it.
    #[serde(default)]
    pub nowait: bool,
}

impl ConfigFile {
    /// Build a configuration from a single `&&`-joined command string, as
    /// accepted in legacy CLI mode (`onchange "cargo build && cargo test"`).
    ///
    /// Each segment becomes a task named `cmd-1`, `cmd-2`, ... that the run
    /// waits on. Watch settings take their defaults.
    pub fn from_command_string(commands: &str) -> Result<Self> {
        let mut task = BTreeMap::new();
        for (i, segment) in commands.split("&&").enumerate() {
            let cmd = segment.trim();
            if cmd.is_empty() {
                continue;
            }
            task.insert(
                format!("cmd-{}", i + 1),
                TaskConfig {
                    cmd: cmd.to_string(),
                    nowait: false,
                },
            );
        }

        if task.is_empty() {
            return Err(OnchangeError::Config(format!(
                "no commands found in argument string {commands:?}"
            )));
        }

        Ok(Self {
            watch: WatchSection::default(),
            task,
        })
    }

    /// The immutable, ordered task set for a run.
    ///
    /// Returned in name order; this is the order tasks are launched in.
    pub fn tasks(&self) -> Vec<Task> {
        self.task
            .iter()
            .map(|(name, cfg)| Task {
                name: name.clone(),
                cmd: cfg.cmd.clone(),
                wait_policy: if cfg.nowait {
                    WaitPolicy::FireAndForget
                } else {
                    WaitPolicy::MustComplete
                },
            })
            .collect()
    }
}
