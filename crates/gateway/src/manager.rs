//! Boundary-enforcing file operations.
//!
//! [`FileManagerImpl`] validates every caller path with a [`PathValidator`]
//! before touching the file system. A per-instance reader/writer lock makes
//! the validate-then-act sequence atomic: read operations share it, mutating
//! operations hold it exclusively.

use std::fs::{self, DirBuilder, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, MAIN_SEPARATOR};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{GatewayError, Result};
use crate::info::FileInfo;
use crate::validate::{PathValidator, ResolvedPath};

/// Mode for files created by the gateway.
pub const FILE_MODE: u32 = 0o600;

/// Mode for directories created by the gateway.
pub const DIR_MODE: u32 = 0o700;

/// File operations confined to a base directory.
///
/// Paths are caller-supplied strings; relative paths are anchored at the base
/// directory. Any path that fails validation yields
/// [`GatewayError::InvalidPath`] and no file-system call is made.
pub trait FileManager: Send + Sync {
    /// The directory all operations are confined to.
    fn base_dir(&self) -> &Path;

    /// Read the whole file as UTF-8 text.
    fn read(&self, path: &str) -> Result<String>;

    /// Write `content`, creating parent directories and the file as needed
    /// and truncating an existing file.
    fn write(&self, path: &str, content: &str) -> Result<()>;

    /// List a directory.
    ///
    /// Non-recursive listings return immediate child names. Recursive
    /// listings return every descendant as a `/`-separated path relative to
    /// `path`. The directory itself is never included.
    fn list(&self, path: &str, recursive: bool) -> Result<Vec<String>>;

    /// Whether the path exists. A missing path is `Ok(false)`, not an error.
    fn exists(&self, path: &str) -> Result<bool>;

    /// Create a directory and any missing parents. Succeeds if the directory
    /// already exists.
    fn create_directory(&self, path: &str) -> Result<()>;

    /// Delete a file, or a directory with all of its contents.
    fn delete(&self, path: &str) -> Result<()>;

    /// Metadata for the path, following symlinks.
    fn stat(&self, path: &str) -> Result<FileInfo>;
}

/// Local file-system implementation of [`FileManager`].
#[derive(Debug)]
pub struct FileManagerImpl {
    /// Validator holding the immutable base directory.
    validator: PathValidator,
    /// Guards the validate-then-act window of every operation.
    lock: RwLock<()>,
}

impl FileManagerImpl {
    /// Create a manager confined to `base_dir`.
    ///
    /// A relative `base_dir` is resolved against the current working
    /// directory. It does not need to exist yet.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        let validator = PathValidator::new(base_dir);
        debug!("File manager confined to {:?}", validator.base_dir());
        Self {
            validator,
            lock: RwLock::new(()),
        }
    }

    // The lock guards `()`, so a panic in another holder leaves nothing
    // inconsistent and the guard can be recovered.
    fn shared(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn exclusive(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, path: &str) -> Result<ResolvedPath> {
        Ok(self.validator.validate(path)?)
    }
}

impl FileManager for FileManagerImpl {
    fn base_dir(&self) -> &Path {
        self.validator.base_dir()
    }

    fn read(&self, path: &str) -> Result<String> {
        let _guard = self.shared();
        let target = self.resolve(path)?;
        let full = target.path();

        let metadata = fs::metadata(full).map_err(|e| GatewayError::from_io(full, e))?;
        if metadata.is_dir() {
            return Err(GatewayError::IsDirectory(full.to_path_buf()));
        }

        fs::read_to_string(full).map_err(|e| GatewayError::from_io(full, e))
    }

    fn write(&self, path: &str, content: &str) -> Result<()> {
        let _guard = self.exclusive();
        let target = self.resolve(path)?;
        let full = target.path();

        // Normalization drops a trailing separator, so "dir/" would otherwise
        // become a regular file named "dir".
        if path.ends_with(['/', MAIN_SEPARATOR]) {
            return Err(GatewayError::IsDirectory(full.to_path_buf()));
        }

        match fs::metadata(full) {
            Ok(metadata) if metadata.is_dir() => {
                return Err(GatewayError::IsDirectory(full.to_path_buf()));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(GatewayError::from_io(full, e)),
        }

        if let Some(parent) = full.parent() {
            if !parent.exists() {
                dir_builder()
                    .create(parent)
                    .map_err(|e| GatewayError::from_io(parent, e))?;
            }
        }

        let mut file = file_options()
            .open(full)
            .map_err(|e| GatewayError::from_io(full, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| GatewayError::from_io(full, e))?;

        debug!("Wrote {} bytes to {:?}", content.len(), full);
        Ok(())
    }

    fn list(&self, path: &str, recursive: bool) -> Result<Vec<String>> {
        let _guard = self.shared();
        let target = self.resolve(path)?;
        let full = target.path();

        let metadata = fs::metadata(full).map_err(|e| GatewayError::from_io(full, e))?;
        if !metadata.is_dir() {
            return Err(GatewayError::NotDirectory(full.to_path_buf()));
        }

        let mut names = if recursive {
            list_recursive(full)?
        } else {
            list_children(full)?
        };
        names.sort();
        Ok(names)
    }

    fn exists(&self, path: &str) -> Result<bool> {
        let _guard = self.shared();
        let target = self.resolve(path)?;
        let full = target.path();

        match fs::metadata(full) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(GatewayError::from_io(full, e)),
        }
    }

    fn create_directory(&self, path: &str) -> Result<()> {
        let _guard = self.exclusive();
        let target = self.resolve(path)?;
        let full = target.path();

        match fs::metadata(full) {
            Ok(metadata) if metadata.is_dir() => return Ok(()),
            Ok(_) => return Err(GatewayError::NotDirectory(full.to_path_buf())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(GatewayError::from_io(full, e)),
        }

        dir_builder()
            .create(full)
            .map_err(|e| GatewayError::from_io(full, e))?;

        debug!("Created directory {:?}", full);
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        let _guard = self.exclusive();
        let target = self.resolve(path)?;
        if target.is_base() {
            debug!("Refusing to delete the base directory via {:?}", path);
            return Err(GatewayError::InvalidPath(path.to_string()));
        }
        let full = target.path();

        let metadata = fs::symlink_metadata(full).map_err(|e| GatewayError::from_io(full, e))?;
        let removed = if metadata.is_dir() {
            fs::remove_dir_all(full)
        } else {
            fs::remove_file(full)
        };
        removed.map_err(|e| GatewayError::from_io(full, e))?;

        debug!("Deleted {:?}", full);
        Ok(())
    }

    fn stat(&self, path: &str) -> Result<FileInfo> {
        let _guard = self.shared();
        let target = self.resolve(path)?;
        let full = target.path();

        let metadata = fs::metadata(full).map_err(|e| GatewayError::from_io(full, e))?;
        let name = full
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "/".to_string());

        Ok(FileInfo::from_metadata(name, path, &metadata))
    }
}

/// Immediate child names of `dir`.
fn list_children(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| GatewayError::from_io(dir, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| GatewayError::from_io(dir, e))?;
        names.push(entry.file_name().to_string_lossy().to_string());
    }
    Ok(names)
}

/// Every descendant of `dir` as a `/`-separated path relative to `dir`.
///
/// Symlinks are listed but not followed.
fn list_recursive(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| io::Error::other("directory walk failed"));
            GatewayError::from_io(path, source)
        })?;

        let Ok(relative) = entry.path().strip_prefix(dir) else {
            continue;
        };
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        names.push(parts.join("/"));
    }
    Ok(names)
}

fn dir_builder() -> DirBuilder {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder
}

fn file_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }
    options
}
