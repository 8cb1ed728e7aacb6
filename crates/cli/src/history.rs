//! Persistent command history.
//!
//! This module provides an append-only history log backed by a plain-text
//! file with one entry per line. When the number of entries exceeds the
//! configured maximum, the oldest entries are dropped and the file is
//! rewritten; otherwise new entries are appended.

use std::collections::VecDeque;
use std::fs::{self, DirBuilder, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

use crate::paths::expand_tilde;

/// Errors that can occur while recording history.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The entry is empty or whitespace only.
    #[error("history entry is empty")]
    Empty,

    /// The entry contains a line break.
    #[error("history entry contains a newline")]
    EmbeddedNewline,

    /// The entry repeats the most recent entry.
    #[error("history entry duplicates the previous entry")]
    ConsecutiveDuplicate,

    /// The backing file could not be read or written.
    #[error("history file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Thread-safe command history persisted to a file.
pub struct History {
    /// Expanded path to the backing file.
    path: PathBuf,
    /// Maximum number of entries retained.
    max_entries: usize,
    /// Entries, oldest first.
    entries: RwLock<VecDeque<String>>,
}

impl History {
    /// Open the history at `path`, loading any existing entries.
    ///
    /// A leading `~` in `path` is expanded. A missing file is not an error;
    /// it is created on the first [`add`](Self::add). Only the newest
    /// `max_entries` entries are kept.
    pub fn open(path: &str, max_entries: usize) -> Result<Self, HistoryError> {
        let path = expand_tilde(path);

        let mut entries = VecDeque::new();
        match fs::read_to_string(&path) {
            Ok(contents) => {
                for line in contents.lines().filter(|l| !l.trim().is_empty()) {
                    entries.push_back(line.to_string());
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("History file not found at {:?}, starting empty", path);
            }
            Err(source) => return Err(HistoryError::Io { path, source }),
        }

        while entries.len() > max_entries {
            entries.pop_front();
        }

        tracing::debug!("Loaded {} history entries from {:?}", entries.len(), path);
        Ok(Self {
            path,
            max_entries,
            entries: RwLock::new(entries),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a new entry.
    pub fn add(&self, entry: &str) -> Result<(), HistoryError> {
        if entry.trim().is_empty() {
            return Err(HistoryError::Empty);
        }
        if entry.contains(['\n', '\r']) {
            return Err(HistoryError::EmbeddedNewline);
        }

        let mut entries = self.write_entries();
        if entries.back().is_some_and(|last| last == entry) {
            return Err(HistoryError::ConsecutiveDuplicate);
        }

        // Memory only changes once the file write has succeeded.
        if entries.len() >= self.max_entries {
            let mut trimmed = entries.clone();
            trimmed.push_back(entry.to_string());
            while trimmed.len() > self.max_entries {
                trimmed.pop_front();
            }
            self.rewrite(&trimmed)?;
            *entries = trimmed;
        } else {
            self.append(entry)?;
            entries.push_back(entry.to_string());
        }
        Ok(())
    }

    /// All entries, oldest first.
    pub fn list(&self) -> Vec<String> {
        self.read_entries().iter().cloned().collect()
    }

    /// Number of entries.
    pub fn size(&self) -> usize {
        self.read_entries().len()
    }

    /// The most recent entry, if any.
    pub fn last(&self) -> Option<String> {
        self.read_entries().back().cloned()
    }

    /// Remove every entry and truncate the backing file.
    pub fn clear(&self) -> Result<(), HistoryError> {
        let mut entries = self.write_entries();
        self.rewrite(&VecDeque::new())?;
        entries.clear();
        Ok(())
    }

    // Entries stay a valid list even if a holder panicked mid-operation.
    fn read_entries(&self) -> RwLockReadGuard<'_, VecDeque<String>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, VecDeque<String>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn append(&self, entry: &str) -> Result<(), HistoryError> {
        self.ensure_parent()?;
        let mut file = history_file_options()
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;
        writeln!(file, "{}", entry).map_err(|source| self.io_error(source))
    }

    fn rewrite(&self, entries: &VecDeque<String>) -> Result<(), HistoryError> {
        self.ensure_parent()?;
        let mut contents = String::new();
        for entry in entries {
            contents.push_str(entry);
            contents.push('\n');
        }

        let mut file = history_file_options()
            .truncate(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;
        file.write_all(contents.as_bytes())
            .map_err(|source| self.io_error(source))?;

        tracing::debug!("Rewrote history with {} entries", entries.len());
        Ok(())
    }

    fn ensure_parent(&self) -> Result<(), HistoryError> {
        let Some(parent) = self.path.parent() else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() || parent.exists() {
            return Ok(());
        }

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder.create(parent).map_err(|source| HistoryError::Io {
            path: parent.to_path_buf(),
            source,
        })
    }

    fn io_error(&self, source: io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn history_file_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}
