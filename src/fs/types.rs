use std::ffi::OsString;
use std::fs::{FileType, Metadata};
use std::time::SystemTime;

/// Kind tag of a directory entry. Symlinks are never followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Symlinks, sockets, devices, FIFOs.
    Other,
}

impl EntryKind {
    pub fn from_file_type(file_type: FileType) -> Self {
        if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "folder",
            EntryKind::Other => "special file",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: OsString,
    pub kind: EntryKind,
}

impl DirectoryEntry {
    pub fn new(name: impl Into<OsString>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// What `stat` reports about a single path, without following symlinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStat {
    pub kind: EntryKind,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl From<&Metadata> for EntryStat {
    fn from(metadata: &Metadata) -> Self {
        Self {
            kind: EntryKind::from_file_type(metadata.file_type()),
            size: metadata.len(),
            modified: metadata.modified().ok(),
        }
    }
}
