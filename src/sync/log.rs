//! Action log: the append-only record of every mutation a pass makes.
//!
//! The synchronizer receives an [`ActionLog`] at construction and calls
//! [`ActionLog::record`] once per mutation. Logging is best effort: a failed
//! write never undoes or aborts the filesystem change that triggered it.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use chrono::Local;

/// Sink for action log lines.
pub trait ActionLog: Send + Sync {
    fn record(&self, message: &str);
}

/// Appends timestamped lines to a log file and echoes each message to stdout.
#[derive(Debug)]
pub struct FileActionLog {
    path: PathBuf,
    echo: bool,
    // Serializes writers; the file itself is reopened per message.
    lock: Mutex<()>,
}

impl FileActionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            echo: true,
            lock: Mutex::new(()),
        }
    }

    /// Same as [`FileActionLog::new`] but without the stdout echo.
    pub fn quiet(path: impl Into<PathBuf>) -> Self {
        Self {
            echo: false,
            ..Self::new(path)
        }
    }

    /// Open the log file for append without writing to it.
    pub fn probe(&self) -> io::Result<()> {
        self.open().map(|_| ())
    }

    fn open(&self) -> io::Result<std::fs::File> {
        OpenOptions::new().create(true).append(true).open(&self.path)
    }

    fn append(&self, message: &str) -> io::Result<()> {
        let mut file = self.open()?;
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "{} - {}", timestamp, message)
    }
}

impl ActionLog for FileActionLog {
    fn record(&self, message: &str) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        if self.echo {
            println!("{}", message);
        }

        if let Err(e) = self.append(message) {
            println!(
                "Error: Couldn't write to log file at {}: {}",
                self.path.display(),
                e
            );
            tracing::warn!(path = %self.path.display(), error = %e, "action log write failed");
        }
    }
}

/// Keeps log lines in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ActionLog for MemoryLog {
    fn record(&self, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
