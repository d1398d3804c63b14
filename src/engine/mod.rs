// src/engine/mod.rs

//! Orchestration engine for onchange.
//!
//! This module ties together:
//! - the trigger loop that owns the at-most-one active run and reacts to:
//!   - qualifying file changes
//!   - run completion
//!   - operator interrupts
//!   - watch errors
//! - the pending-trigger slot for changes that arrive while a run is active

pub mod queue;
pub mod runtime;

pub use queue::PendingTrigger;
pub use runtime::{ChangeKind, Runtime, RuntimeEvent, RuntimeOptions};
