// src/errors.rs

//! Crate-wide error types.
//!
//! Startup problems (bad config, unwatchable directory) are fatal and
//! surface through these variants; per-task failures never appear here,
//! they are aggregated into a run result instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OnchangeError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("file watch error: {0}")]
    Watch(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, OnchangeError>;
