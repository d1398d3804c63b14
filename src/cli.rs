// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `onchange`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "onchange",
    version,
    about = "Watch a directory and re-run build/test commands on file changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Onchange.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Onchange.toml")]
    pub config: String,

    /// Run the task set once and exit, no watching.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ONCHANGE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the watch settings and task table, but don't
    /// execute any commands.
    #[arg(long)]
    pub dry_run: bool,

    /// Legacy mode: a single `&&`-joined command string to run as the task
    /// set instead of reading a config file.
    ///
    /// Example: `onchange "cargo build && cargo test"`.
    #[arg(value_name = "COMMANDS")]
    pub commands: Option<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
