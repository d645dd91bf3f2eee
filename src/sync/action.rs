//! Actions applied during a sync pass and the per-pass report.

use std::path::PathBuf;
use std::time::Duration;

use humansize::{format_size, DECIMAL};

/// A mutation of the replica tree. Each one is applied immediately and logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Copy a source file over its replica counterpart.
    CopyOrOverwrite { path: PathBuf },
    /// Create a directory in the replica.
    CreateDirectory { path: PathBuf },
    /// Remove a replica file (or symlink / special file).
    RemoveFile { path: PathBuf },
    /// Remove a replica directory with everything below it.
    RemoveDirectorySubtree { path: PathBuf },
}

/// An entry whose synchronization failed and was skipped for this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of one sync pass.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Mutations, in the order they were applied.
    pub actions: Vec<SyncAction>,
    /// Files whose replica copy already matched.
    pub unchanged: usize,
    /// Source entries that are neither files nor folders.
    pub skipped: usize,
    /// Bytes written by copies.
    pub bytes_copied: u64,
    /// Entries that failed and were isolated.
    pub failures: Vec<SyncFailure>,
    /// The pass stopped early on a shutdown request.
    pub interrupted: bool,
    pub duration: Duration,
}

impl SyncReport {
    pub fn record(&mut self, action: SyncAction) {
        self.actions.push(action);
    }

    pub fn files_copied(&self) -> usize {
        self.count(|a| matches!(a, SyncAction::CopyOrOverwrite { .. }))
    }

    pub fn dirs_created(&self) -> usize {
        self.count(|a| matches!(a, SyncAction::CreateDirectory { .. }))
    }

    pub fn files_removed(&self) -> usize {
        self.count(|a| matches!(a, SyncAction::RemoveFile { .. }))
    }

    pub fn dirs_removed(&self) -> usize {
        self.count(|a| matches!(a, SyncAction::RemoveDirectorySubtree { .. }))
    }

    /// True when the pass changed nothing on disk.
    pub fn is_noop(&self) -> bool {
        self.actions.is_empty()
    }

    /// True when no entry failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} copied ({}), {} folders created, {} files removed, {} folders removed, \
             {} unchanged, {} skipped, {} failed in {:.2?}{}",
            self.files_copied(),
            format_size(self.bytes_copied, DECIMAL),
            self.dirs_created(),
            self.files_removed(),
            self.dirs_removed(),
            self.unchanged,
            self.skipped,
            self.failures.len(),
            self.duration,
            if self.interrupted { " (interrupted)" } else { "" },
        )
    }

    fn count(&self, predicate: impl Fn(&SyncAction) -> bool) -> usize {
        self.actions.iter().filter(|a| predicate(a)).count()
    }
}
