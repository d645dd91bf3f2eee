//! Command line and validated run configuration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use crate::error::SyncError;
use crate::fs::LocalFs;
use crate::hash::HashAlgorithm;
use crate::sync::SyncOptions;

#[derive(Debug, Parser)]
#[command(name = "foldersync")]
#[command(version)]
#[command(about = "Keep a replica folder an exact mirror of a source folder")]
pub struct Cli {
    /// Source folder (must exist)
    pub source: PathBuf,

    /// Replica folder (created if missing)
    pub replica: PathBuf,

    /// Seconds between sync passes
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Log file, opened for append
    pub log_file: PathBuf,

    /// Digest used to compare file contents
    #[arg(long, value_enum, default_value_t = HashAlgorithm::Md5)]
    pub hash: HashAlgorithm,

    /// Treat files with equal size and modification time as unchanged without hashing
    #[arg(long)]
    pub quick_check: bool,

    /// Abort a pass on the first error instead of skipping the failing entry
    #[arg(long)]
    pub fail_fast: bool,

    /// Run a single pass and exit
    #[arg(long)]
    pub once: bool,

    /// Enable verbose diagnostics
    #[arg(short, long)]
    pub verbose: bool,
}

/// Configuration that passed every startup check.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub source: PathBuf,
    pub replica: PathBuf,
    pub interval: Duration,
    pub log_file: PathBuf,
    pub options: SyncOptions,
    pub once: bool,
}

impl SyncConfig {
    /// Validate the command line and prepare the replica root.
    ///
    /// Creates the replica folder (with parents) if it does not exist.
    pub fn from_cli(cli: &Cli) -> Result<Self, SyncError> {
        let source = &cli.source;
        match fs::metadata(source) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Err(SyncError::SourceNotDirectory { path: source.clone() }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SyncError::SourceMissing { path: source.clone() })
            }
            Err(e) => return Err(SyncError::from_io_error(e, "checking source", source)),
        }

        let replica = &cli.replica;
        match fs::metadata(replica) {
            Ok(metadata) if !metadata.is_dir() => {
                return Err(SyncError::ReplicaNotDirectory { path: replica.clone() })
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(SyncError::from_io_error(e, "checking replica", replica)),
        }

        // Checked before the replica is created so a bad layout leaves no trace
        let source_resolved = resolve_path(source)
            .map_err(|e| SyncError::from_io_error(e, "resolving", source))?;
        let replica_resolved = resolve_path(replica)
            .map_err(|e| SyncError::from_io_error(e, "resolving", replica))?;
        if source_resolved.starts_with(&replica_resolved)
            || replica_resolved.starts_with(&source_resolved)
        {
            return Err(SyncError::OverlappingRoots {
                source: source.clone(),
                replica: replica.clone(),
            });
        }

        fs::create_dir_all(replica)
            .map_err(|e| SyncError::from_io_error(e, "creating replica", replica))?;

        Ok(Self {
            source: source.clone(),
            replica: replica.clone(),
            interval: Duration::from_secs(cli.interval),
            log_file: cli.log_file.clone(),
            options: SyncOptions {
                hash: cli.hash,
                quick_check: cli.quick_check,
                fail_fast: cli.fail_fast,
            },
            once: cli.once,
        })
    }
}

/// Canonical form of a path that may not exist yet: the deepest existing
/// ancestor is canonicalized and the missing tail appended lexically.
pub fn resolve_path(path: &Path) -> io::Result<PathBuf> {
    let absolute = LocalFs::normalize_path(&std::path::absolute(path)?);

    let mut existing = absolute.as_path();
    let mut tail = Vec::new();
    loop {
        match existing.canonicalize() {
            Ok(canonical) => {
                let mut resolved = canonical;
                for component in tail.iter().rev() {
                    resolved.push(component);
                }
                return Ok(resolved);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                match (existing.parent(), existing.file_name()) {
                    (Some(parent), Some(name)) => {
                        tail.push(name.to_os_string());
                        existing = parent;
                    }
                    _ => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }
    }
}
