//! Sync module
//!
//! One-way mirroring of a source tree into a replica tree, re-run on a
//! fixed interval.

pub mod action;
pub mod engine;
pub mod log;
pub mod scheduler;

pub use action::{SyncAction, SyncFailure, SyncReport};
pub use engine::{SyncOptions, Synchronizer};
pub use log::{ActionLog, FileActionLog, MemoryLog};
pub use scheduler::{exit_status, shutdown_signal, Scheduler};
