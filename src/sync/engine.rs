//! Tree synchronizer.
//!
//! Walks the source and replica trees in tandem, one directory level at a
//! time. Each level runs two phases:
//!
//! 1. Descend: every source entry is materialized in the replica. Folders are
//!    created and fully synchronized before the next sibling; files are copied
//!    when the replica counterpart is missing or its digest differs.
//! 2. Prune: every replica entry without a same-named source entry is removed,
//!    folders together with their whole subtree.
//!
//! Pruning only starts once the level's descend phase is complete, so a name
//! missing from the source listing is a reliable orphan signal.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::error::SyncError;
use crate::fs::{EntryKind, EntryStat, Filesystem};
use crate::hash::{DigestComputer, HashAlgorithm};
use crate::sync::action::{SyncAction, SyncFailure, SyncReport};
use crate::sync::log::ActionLog;

/// Knobs that change how a pass decides, never what it converges to.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Digest algorithm for content comparison.
    pub hash: HashAlgorithm,
    /// Skip hashing when size and modification time already match.
    pub quick_check: bool,
    /// Abort the pass on the first failure instead of skipping the entry.
    pub fail_fast: bool,
}

/// Mirrors a source tree into a replica tree.
pub struct Synchronizer {
    fs: Arc<dyn Filesystem>,
    log: Arc<dyn ActionLog>,
    digests: DigestComputer,
    options: SyncOptions,
    cancel: Arc<AtomicBool>,
}

impl Synchronizer {
    pub fn new(fs: Arc<dyn Filesystem>, log: Arc<dyn ActionLog>, options: SyncOptions) -> Self {
        Self {
            fs,
            log,
            digests: DigestComputer::new(options.hash),
            options,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share a shutdown flag. Once set, the pass stops at the next entry boundary.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run one full pass making `replica` a mirror of `source`.
    ///
    /// Fails only if the source root cannot be listed, or on the first
    /// failure when `fail_fast` is set. Otherwise per-entry failures are
    /// logged and collected in the report.
    pub fn synchronize(&self, source: &Path, replica: &Path) -> Result<SyncReport, SyncError> {
        let started = Instant::now();
        let mut report = SyncReport::default();
        debug!(source = %source.display(), replica = %replica.display(), "sync pass started");

        match self.sync_root(source, replica, &mut report) {
            Ok(()) => {}
            Err(SyncError::Interrupted) => report.interrupted = true,
            Err(err) => return Err(err),
        }

        report.duration = started.elapsed();
        Ok(report)
    }

    fn sync_root(&self, source: &Path, replica: &Path, report: &mut SyncReport) -> Result<(), SyncError> {
        self.check_cancelled()?;

        // The replica root may have been removed since startup
        if self.fs.stat(replica)?.is_none() {
            self.create_dir(replica, report)?;
        }

        self.sync_dir(source, replica, report)
    }

    fn sync_dir(&self, source: &Path, replica: &Path, report: &mut SyncReport) -> Result<(), SyncError> {
        let entries = self.fs.list_dir(source)?;
        let mut names: HashSet<OsString> = HashSet::with_capacity(entries.len());

        // Descend
        for entry in entries {
            self.check_cancelled()?;

            let src = source.join(&entry.name);
            let dst = replica.join(&entry.name);
            names.insert(entry.name);

            let outcome = match entry.kind {
                EntryKind::Directory => self.sync_subdir(&src, &dst, report),
                EntryKind::File => self.sync_file(&src, &dst, report),
                EntryKind::Other => {
                    warn!("Skipping {}: {} entries are not mirrored", src.display(), entry.kind.label());
                    report.skipped += 1;
                    Ok(())
                }
            };

            if let Err(err) = outcome {
                self.isolate(&src, err, report)?;
            }
        }

        // Prune
        let replica_entries = match self.fs.list_dir(replica) {
            Ok(entries) => entries,
            Err(err) => return self.isolate(replica, err, report),
        };

        for entry in replica_entries {
            if names.contains(&entry.name) {
                continue;
            }
            self.check_cancelled()?;

            let orphan = replica.join(&entry.name);
            if let Err(err) = self.prune_entry(&source.join(&entry.name), &orphan, entry.kind, report) {
                self.isolate(&orphan, err, report)?;
            }
        }

        Ok(())
    }

    fn sync_subdir(&self, source: &Path, replica: &Path, report: &mut SyncReport) -> Result<(), SyncError> {
        match self.fs.stat(replica)? {
            Some(EntryStat { kind: EntryKind::Directory, .. }) => {}
            Some(stat) => {
                self.remove_entry(replica, stat.kind, report)?;
                self.create_dir(replica, report)?;
            }
            None => self.create_dir(replica, report)?,
        }

        self.sync_dir(source, replica, report)
    }

    fn sync_file(&self, source: &Path, replica: &Path, report: &mut SyncReport) -> Result<(), SyncError> {
        match self.fs.stat(replica)? {
            Some(stat) if stat.kind == EntryKind::File => {
                if !self.content_differs(source, replica, &stat)? {
                    report.unchanged += 1;
                    return Ok(());
                }
            }
            Some(stat) => self.remove_entry(replica, stat.kind, report)?,
            None => {}
        }

        let bytes = self.fs.copy_file(source, replica)?;
        report.bytes_copied += bytes;
        self.log.record(&format!(
            "File copied/overwritten: {} -> {}",
            source.display(),
            replica.display()
        ));
        report.record(SyncAction::CopyOrOverwrite { path: replica.to_path_buf() });
        Ok(())
    }

    fn content_differs(&self, source: &Path, replica: &Path, replica_stat: &EntryStat) -> Result<bool, SyncError> {
        let source_stat = self.fs.stat(source)?.ok_or_else(|| SyncError::NotFound {
            path: source.to_path_buf(),
            operation: "comparing".to_string(),
        })?;

        if source_stat.size != replica_stat.size {
            return Ok(true);
        }

        if self.options.quick_check
            && source_stat.modified.is_some()
            && source_stat.modified == replica_stat.modified
        {
            return Ok(false);
        }

        let source_digest = self.digests.digest_file(source)?;
        let replica_digest = self.digests.digest_file(replica)?;
        Ok(source_digest != replica_digest)
    }

    /// Remove a replica entry whose name the source listing lacks.
    ///
    /// On a case-insensitive filesystem `a.txt` still resolves when the source
    /// holds `A.txt`; such an entry is the counterpart just synced, not an orphan.
    fn prune_entry(
        &self,
        source: &Path,
        orphan: &Path,
        kind: EntryKind,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        if self.fs.stat(source)?.is_some() {
            debug!(path = %orphan.display(), "kept: name resolves in source");
            return Ok(());
        }

        self.remove_entry(orphan, kind, report)
    }

    fn create_dir(&self, path: &Path, report: &mut SyncReport) -> Result<(), SyncError> {
        self.fs.create_dir(path)?;
        self.log.record(&format!("Folder created: {}", path.display()));
        report.record(SyncAction::CreateDirectory { path: path.to_path_buf() });
        Ok(())
    }

    fn remove_entry(&self, path: &Path, kind: EntryKind, report: &mut SyncReport) -> Result<(), SyncError> {
        if kind == EntryKind::Directory {
            self.fs.remove_dir_all(path)?;
            self.log.record(&format!("Folder removed: {}", path.display()));
            report.record(SyncAction::RemoveDirectorySubtree { path: path.to_path_buf() });
        } else {
            self.fs.remove_file(path)?;
            self.log.record(&format!("File removed: {}", path.display()));
            report.record(SyncAction::RemoveFile { path: path.to_path_buf() });
        }
        Ok(())
    }

    /// Record a failed entry and carry on, unless the pass must stop.
    fn isolate(&self, path: &Path, err: SyncError, report: &mut SyncReport) -> Result<(), SyncError> {
        if self.options.fail_fast || matches!(err, SyncError::Interrupted) {
            return Err(err);
        }

        warn!("Skipping {}: {}", path.display(), err);
        self.log.record(&format!("Error: {}", err));
        report.failures.push(SyncFailure {
            path: path.to_path_buf(),
            error: err.to_string(),
        });
        Ok(())
    }

    fn check_cancelled(&self) -> Result<(), SyncError> {
        if self.cancel.load(Ordering::SeqCst) {
            Err(SyncError::Interrupted)
        } else {
            Ok(())
        }
    }
}
