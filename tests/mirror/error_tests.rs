// Failure isolation: one bad entry must not stop the rest of the pass

use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::sync::Arc;

use foldersync::fs::{DirectoryEntry, EntryStat, Filesystem, LocalFs};
use foldersync::{SyncError, SyncOptions};

use crate::common::{tree, write, Fixture};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Op {
    List,
    Copy,
    RemoveFile,
    RemoveDir,
}

/// Local filesystem that fails one operation on paths with a given file name
struct FaultyFs {
    op: Op,
    name: String,
}

impl FaultyFs {
    fn new(op: Op, name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { op, name: name.into() })
    }

    fn check(&self, op: Op, path: &Path) -> Result<(), SyncError> {
        if op == self.op && path.file_name() == Some(OsStr::new(&self.name)) {
            return Err(SyncError::from_io_error(
                io::Error::new(io::ErrorKind::PermissionDenied, "injected"),
                "testing",
                path,
            ));
        }
        Ok(())
    }
}

impl Filesystem for FaultyFs {
    fn list_dir(&self, path: &Path) -> Result<Vec<DirectoryEntry>, SyncError> {
        self.check(Op::List, path)?;
        LocalFs.list_dir(path)
    }

    fn stat(&self, path: &Path) -> Result<Option<EntryStat>, SyncError> {
        LocalFs.stat(path)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<u64, SyncError> {
        self.check(Op::Copy, to)?;
        LocalFs.copy_file(from, to)
    }

    fn remove_file(&self, path: &Path) -> Result<(), SyncError> {
        self.check(Op::RemoveFile, path)?;
        LocalFs.remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), SyncError> {
        self.check(Op::RemoveDir, path)?;
        LocalFs.remove_dir_all(path)
    }

    fn create_dir(&self, path: &Path) -> Result<(), SyncError> {
        LocalFs.create_dir(path)
    }
}

#[test]
fn test_failed_copy_does_not_block_siblings() {
    let fx = Fixture::new();
    write(fx.source.path(), "a.txt", "a");
    write(fx.source.path(), "bad.txt", "bad");
    write(fx.source.path(), "c.txt", "c");
    write(fx.replica.path(), "orphan.txt", "o");

    let sync = fx.synchronizer_with(FaultyFs::new(Op::Copy, "bad.txt"), SyncOptions::default());
    let report = sync.synchronize(fx.source.path(), fx.replica.path()).unwrap();

    assert_eq!(fx.replica_tree(), tree(&[("a.txt", Some("a")), ("c.txt", Some("c"))]));
    assert_eq!(report.files_copied(), 2);
    assert_eq!(report.files_removed(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, fx.source.path().join("bad.txt"));

    let errors: Vec<String> = fx.lines().into_iter().filter(|l| l.starts_with("Error: ")).collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("bad.txt"));
}

#[test]
fn test_failed_copy_retried_next_pass() {
    let fx = Fixture::new();
    write(fx.source.path(), "bad.txt", "bad");

    let faulty = fx.synchronizer_with(FaultyFs::new(Op::Copy, "bad.txt"), SyncOptions::default());
    let report = faulty.synchronize(fx.source.path(), fx.replica.path()).unwrap();
    assert!(!report.is_clean());

    let report = fx.sync();
    assert!(report.is_clean());
    assert_eq!(fx.replica_tree(), tree(&[("bad.txt", Some("bad"))]));
}

#[test]
fn test_fail_fast_aborts_pass() {
    let fx = Fixture::new();
    write(fx.source.path(), "a.txt", "a");
    write(fx.source.path(), "b.txt", "b");
    write(fx.replica.path(), "orphan.txt", "o");

    let options = SyncOptions { fail_fast: true, ..Default::default() };
    let sync = fx.synchronizer_with(FaultyFs::new(Op::Copy, "a.txt"), options);
    let err = sync.synchronize(fx.source.path(), fx.replica.path()).unwrap_err();

    assert!(matches!(err, SyncError::PermissionDenied { .. }));
    // Nothing after the failing entry ran, the orphan survives
    assert_eq!(fx.replica_tree(), tree(&[("orphan.txt", Some("o"))]));
}

#[test]
fn test_unlistable_source_folder_is_not_pruned() {
    let fx = Fixture::new();
    write(fx.source.path(), "locked/a.txt", "a");
    write(fx.source.path(), "open/b.txt", "b");
    write(fx.replica.path(), "locked/a.txt", "a");
    write(fx.replica.path(), "locked/replica-only.txt", "r");

    let sync = fx.synchronizer_with(FaultyFs::new(Op::List, "locked"), SyncOptions::default());
    let report = sync.synchronize(fx.source.path(), fx.replica.path()).unwrap();

    assert_eq!(report.failures.len(), 1);
    // The unreadable level keeps its replica content untouched
    assert!(fx.replica.path().join("locked/replica-only.txt").exists());
    assert_eq!(
        std::fs::read_to_string(fx.replica.path().join("open/b.txt")).unwrap(),
        "b"
    );
}

#[test]
fn test_failed_orphan_removal_continues() {
    let fx = Fixture::new();
    write(fx.replica.path(), "stuck/x.txt", "x");
    write(fx.replica.path(), "loose.txt", "l");

    let sync = fx.synchronizer_with(FaultyFs::new(Op::RemoveDir, "stuck"), SyncOptions::default());
    let report = sync.synchronize(fx.source.path(), fx.replica.path()).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.files_removed(), 1);
    assert!(!fx.replica.path().join("loose.txt").exists());
    assert!(fx.replica.path().join("stuck/x.txt").exists());
}

#[test]
fn test_unlistable_source_root_fails_pass() {
    let fx = Fixture::new();
    let name = fx.source.path().file_name().unwrap().to_string_lossy().to_string();

    let sync = fx.synchronizer_with(FaultyFs::new(Op::List, name), SyncOptions::default());
    let err = sync.synchronize(fx.source.path(), fx.replica.path()).unwrap_err();

    assert!(matches!(err, SyncError::PermissionDenied { .. }));
}

#[test]
fn test_blocked_kind_change_skips_subtree() {
    let fx = Fixture::new();
    write(fx.source.path(), "x/inner.txt", "in");
    write(fx.source.path(), "y.txt", "y");
    write(fx.replica.path(), "x", "a file where a folder belongs");

    let sync = fx.synchronizer_with(FaultyFs::new(Op::RemoveFile, "x"), SyncOptions::default());
    let report = sync.synchronize(fx.source.path(), fx.replica.path()).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(
        fx.replica_tree(),
        tree(&[("x", Some("a file where a folder belongs")), ("y.txt", Some("y"))])
    );
}
