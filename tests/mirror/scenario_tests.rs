// Reference scenarios: one small source/replica layout per test

use std::fs;

use foldersync::sync::SyncAction;

use crate::common::{mkdir, tree, write, Fixture};

#[test]
fn test_new_file_is_copied() {
    let fx = Fixture::new();
    write(fx.source.path(), "a.txt", "hi");

    let report = fx.sync();

    assert_eq!(fx.replica_tree(), tree(&[("a.txt", Some("hi"))]));
    assert_eq!(report.files_copied(), 1);

    let lines = fx.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(
        lines[0],
        format!(
            "File copied/overwritten: {} -> {}",
            fx.source.path().join("a.txt").display(),
            fx.replica.path().join("a.txt").display()
        )
    );
}

#[test]
fn test_matching_file_is_left_alone() {
    let fx = Fixture::new();
    write(fx.source.path(), "a.txt", "hi");
    write(fx.replica.path(), "a.txt", "hi");
    let before = fs::metadata(fx.replica.path().join("a.txt")).unwrap().modified().unwrap();

    let report = fx.sync();

    assert!(report.is_noop());
    assert_eq!(report.unchanged, 1);
    assert!(fx.lines().is_empty());
    let after = fs::metadata(fx.replica.path().join("a.txt")).unwrap().modified().unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_changed_file_is_overwritten() {
    let fx = Fixture::new();
    write(fx.source.path(), "a.txt", "hi");
    write(fx.replica.path(), "a.txt", "bye");

    let report = fx.sync();

    assert_eq!(fx.replica_tree(), tree(&[("a.txt", Some("hi"))]));
    assert_eq!(
        report.actions,
        vec![SyncAction::CopyOrOverwrite { path: fx.replica.path().join("a.txt") }]
    );
    let lines = fx.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("File copied/overwritten: "));
}

#[test]
fn test_same_size_different_content_is_overwritten() {
    let fx = Fixture::new();
    write(fx.source.path(), "a.txt", "abc");
    write(fx.replica.path(), "a.txt", "xyz");

    fx.sync();

    assert_eq!(fx.replica_tree(), tree(&[("a.txt", Some("abc"))]));
}

#[test]
fn test_orphans_are_removed() {
    let fx = Fixture::new();
    write(fx.replica.path(), "old.txt", "x");
    write(fx.replica.path(), "sub/nested.txt", "y");

    let report = fx.sync();

    assert!(fx.replica_tree().is_empty());
    assert_eq!(report.files_removed(), 1);
    assert_eq!(report.dirs_removed(), 1);
    assert_eq!(
        fx.lines(),
        vec![
            format!("File removed: {}", fx.replica.path().join("old.txt").display()),
            format!("Folder removed: {}", fx.replica.path().join("sub").display()),
        ]
    );
}

#[test]
fn test_empty_folder_is_created() {
    let fx = Fixture::new();
    mkdir(fx.source.path(), "dir");

    let report = fx.sync();

    assert_eq!(fx.replica_tree(), tree(&[("dir", None)]));
    assert_eq!(
        report.actions,
        vec![SyncAction::CreateDirectory { path: fx.replica.path().join("dir") }]
    );
    assert_eq!(
        fx.lines(),
        vec![format!("Folder created: {}", fx.replica.path().join("dir").display())]
    );
}

#[test]
fn test_existing_folder_is_not_recreated() {
    let fx = Fixture::new();
    mkdir(fx.source.path(), "dir");
    mkdir(fx.replica.path(), "dir");

    let report = fx.sync();

    assert!(report.is_noop());
    assert!(fx.lines().is_empty());
}

#[test]
fn test_orphan_subtree_removed_whole() {
    let fx = Fixture::new();
    write(fx.source.path(), "keep/a.txt", "a");
    write(fx.replica.path(), "keep/a.txt", "a");
    write(fx.replica.path(), "keep/stale/deep/x.txt", "x");
    write(fx.replica.path(), "keep/stale/y.txt", "y");

    let report = fx.sync();

    assert_eq!(fx.replica_tree(), tree(&[("keep", None), ("keep/a.txt", Some("a"))]));
    // One removal for the whole stale subtree, nothing inside it is visited
    assert_eq!(
        report.actions,
        vec![SyncAction::RemoveDirectorySubtree { path: fx.replica.path().join("keep/stale") }]
    );
}
