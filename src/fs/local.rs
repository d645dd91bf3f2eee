use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use filetime::FileTime;
use tempfile::NamedTempFile;

use crate::error::SyncError;
use crate::fs::types::{DirectoryEntry, EntryKind, EntryStat};

/// Filesystem primitives the synchronizer is built on.
///
/// Every method is a single platform operation; none of them log. The
/// synchronizer decides what to do and records it, the filesystem only does it.
pub trait Filesystem: Send + Sync {
    /// List the entries of a directory, sorted by name.
    fn list_dir(&self, path: &Path) -> Result<Vec<DirectoryEntry>, SyncError>;

    /// Stat a path without following symlinks. `Ok(None)` if nothing is there.
    fn stat(&self, path: &Path) -> Result<Option<EntryStat>, SyncError>;

    /// Copy a regular file over `to`, preserving permissions and timestamps.
    /// Returns the number of bytes copied.
    fn copy_file(&self, from: &Path, to: &Path) -> Result<u64, SyncError>;

    fn remove_file(&self, path: &Path) -> Result<(), SyncError>;

    fn remove_dir_all(&self, path: &Path) -> Result<(), SyncError>;

    /// Create a directory and any missing parents. Not an error if it exists.
    fn create_dir(&self, path: &Path) -> Result<(), SyncError>;
}

/// The local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    /// Lexically resolve `.` and `..` components.
    pub fn normalize_path(path: &Path) -> PathBuf {
        let mut normalized = PathBuf::new();

        for component in path.components() {
            match component {
                Component::ParentDir => {
                    normalized.pop();
                }
                Component::CurDir => {}
                _ => normalized.push(component),
            }
        }

        normalized
    }

    fn stage_copy(from: &Path, to: &Path) -> io::Result<u64> {
        let parent = match to.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut source = File::open(from)?;
        let metadata = source.metadata()?;

        // Staged next to the destination so the final rename stays on one filesystem
        let mut staged = NamedTempFile::new_in(parent)?;
        let bytes = io::copy(&mut source, staged.as_file_mut())?;
        staged.as_file().sync_all()?;

        staged.as_file().set_permissions(metadata.permissions())?;
        filetime::set_file_handle_times(
            staged.as_file(),
            Some(FileTime::from_last_access_time(&metadata)),
            Some(FileTime::from_last_modification_time(&metadata)),
        )?;

        staged.persist(to).map_err(|err| err.error)?;
        Ok(bytes)
    }
}

impl Filesystem for LocalFs {
    fn list_dir(&self, path: &Path) -> Result<Vec<DirectoryEntry>, SyncError> {
        let read_dir = fs::read_dir(path)
            .map_err(|e| SyncError::from_io_error(e, "listing folder", path))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| SyncError::from_io_error(e, "listing folder", path))?;
            let file_type = entry
                .file_type()
                .map_err(|e| SyncError::from_io_error(e, "reading entry type", entry.path()))?;

            entries.push(DirectoryEntry {
                name: entry.file_name(),
                kind: EntryKind::from_file_type(file_type),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn stat(&self, path: &Path) -> Result<Option<EntryStat>, SyncError> {
        match fs::symlink_metadata(path) {
            Ok(metadata) => Ok(Some(EntryStat::from(&metadata))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SyncError::from_io_error(e, "reading metadata of", path)),
        }
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<u64, SyncError> {
        Self::stage_copy(from, to).map_err(|e| SyncError::from_io_error(e, "copying to", to))
    }

    fn remove_file(&self, path: &Path) -> Result<(), SyncError> {
        fs::remove_file(path).map_err(|e| SyncError::from_io_error(e, "removing file", path))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), SyncError> {
        fs::remove_dir_all(path).map_err(|e| SyncError::from_io_error(e, "removing folder", path))
    }

    fn create_dir(&self, path: &Path) -> Result<(), SyncError> {
        fs::create_dir_all(path).map_err(|e| SyncError::from_io_error(e, "creating folder", path))
    }
}
