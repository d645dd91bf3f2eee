// Library module for foldersync
// Re-exports modules for use in integration tests and the binary

pub mod config;
pub mod error;
pub mod fs;
pub mod hash;
pub mod sync;

pub use config::{Cli, SyncConfig};
pub use error::SyncError;
pub use sync::{ActionLog, FileActionLog, Scheduler, SyncOptions, SyncReport, Synchronizer};
