// src/watch/mod.rs

//! File watching and change filtering.
//!
//! This module is responsible for:
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Deciding which changed paths qualify to trigger a run (hidden files,
//!   ignore globs, extension allow-list).
//!
//! It does **not** know about tasks or runs; it only turns filesystem
//! changes into qualifying-change events for the runtime.

pub mod filter;
pub mod watcher;

pub use filter::ChangeFilter;
pub use watcher::{WatcherHandle, spawn_watcher};
