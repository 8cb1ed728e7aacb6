//! Path validation against a base directory.
//!
//! Every caller-supplied path goes through [`PathValidator::validate`] before
//! any file-system call is made. Checks run in order and stop at the first
//! failure:
//!
//! 1. Format: empty paths, null bytes and shell metacharacters are rejected.
//! 2. Lexical normalization: `.` and `..` are collapsed; relative paths are
//!    anchored at the base directory.
//! 3. Relative-boundary check: the normalized path, taken relative to the
//!    base, must not start with `..`.
//! 4. Prefix check: the normalized path must equal the base or sit below it.
//! 5. Symlink-aware check: the path (or its deepest existing ancestor) is
//!    canonicalized and must still sit below the canonical base.
//!
//! Steps 3 and 4 are cheap string-level fast paths. Step 5 is authoritative:
//! a path that looks in-bounds but aliases an outside location through a
//! symlink is only caught there.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

use crate::error::ValidationError;

/// Characters rejected anywhere in a path.
pub const FORBIDDEN_CHARS: &[char] = &['|', ';', '$', '&', '<', '>', '`'];

/// A path that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Absolute, lexically normalized path. Operations act on this.
    path: PathBuf,
    /// Whether the path designates the base directory itself.
    is_base: bool,
}

impl ResolvedPath {
    /// The absolute, normalized path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this is the base directory itself.
    pub fn is_base(&self) -> bool {
        self.is_base
    }
}

/// Validates caller paths against a fixed base directory.
#[derive(Debug, Clone)]
pub struct PathValidator {
    /// Absolute, lexically normalized base directory.
    base_dir: PathBuf,
}

impl PathValidator {
    /// Create a validator for `base_dir`.
    ///
    /// Relative base directories are resolved against the current working
    /// directory. The directory does not need to exist yet, but every
    /// validation fails until it does.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        let base_dir = base_dir.as_ref();
        let absolute = match std::path::absolute(base_dir) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(
                    "Could not make base directory {:?} absolute: {}",
                    base_dir,
                    e
                );
                base_dir.to_path_buf()
            }
        };

        Self {
            base_dir: normalize(&absolute),
        }
    }

    /// The base directory every path must stay inside.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Validate `path` and resolve it to a location inside the base
    /// directory.
    pub fn validate(&self, path: &str) -> Result<ResolvedPath, ValidationError> {
        check_format(path)?;

        let requested = Path::new(path);
        let candidate = if requested.is_absolute() {
            normalize(requested)
        } else {
            normalize(&self.base_dir.join(requested))
        };

        match relative_to(&self.base_dir, &candidate) {
            Some(rel) if !matches!(rel.components().next(), Some(Component::ParentDir)) => {}
            _ => return Err(ValidationError::traversal(path, "escapes base directory")),
        }

        if !has_prefix(&candidate, &self.base_dir) {
            return Err(ValidationError::traversal(path, "outside base directory"));
        }

        let canonical_base = fs::canonicalize(&self.base_dir).map_err(|e| {
            ValidationError::invalid(path, "base directory is not accessible").with_source(e)
        })?;

        let resolved = resolve_existing(path, &candidate)?;
        if !resolved.starts_with(&canonical_base) {
            return Err(ValidationError::traversal(
                path,
                "resolves outside base directory",
            ));
        }

        Ok(ResolvedPath {
            is_base: resolved == canonical_base,
            path: candidate,
        })
    }
}

/// Reject empty paths, null bytes and shell metacharacters.
fn check_format(path: &str) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::invalid(path, "empty path"));
    }
    if path.contains('\0') {
        return Err(ValidationError::invalid(path, "path contains null byte"));
    }
    if path.contains(FORBIDDEN_CHARS) {
        return Err(ValidationError::invalid(
            path,
            "path contains forbidden characters",
        ));
    }
    Ok(())
}

/// Lexically collapse `.` and `..` components.
///
/// `..` at the root of an absolute path is dropped. Leading `..` in a
/// relative path are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                let last = out.components().next_back();
                if matches!(last, Some(Component::Normal(_))) {
                    out.pop();
                } else if !matches!(last, Some(Component::RootDir | Component::Prefix(_))) {
                    out.push("..");
                }
            }
        }
    }
    out
}

/// Lexical path of `target` relative to `base`.
///
/// Both paths must be normalized. Returns `None` when they share no root,
/// for example different drives.
fn relative_to(base: &Path, target: &Path) -> Option<PathBuf> {
    let mut base_iter = base.components().peekable();
    let mut target_iter = target.components().peekable();

    match (base_iter.peek(), target_iter.peek()) {
        (Some(Component::Prefix(a)), Some(Component::Prefix(b))) if a != b => return None,
        (Some(Component::RootDir), Some(Component::RootDir)) => {}
        (Some(Component::Prefix(_)), Some(Component::Prefix(_))) => {}
        (Some(_), Some(_)) if base.is_absolute() != target.is_absolute() => return None,
        _ => {}
    }

    while let (Some(a), Some(b)) = (base_iter.peek(), target_iter.peek()) {
        if a != b {
            break;
        }
        base_iter.next();
        target_iter.next();
    }

    let mut rel = PathBuf::new();
    for _ in base_iter {
        rel.push("..");
    }
    for component in target_iter {
        rel.push(component.as_os_str());
    }
    Some(rel)
}

/// String-level prefix check: `path` equals `base` or starts with `base`
/// followed by a separator.
fn has_prefix(path: &Path, base: &Path) -> bool {
    let path = path.to_string_lossy();
    let base = base.to_string_lossy();
    if path == base {
        return true;
    }
    if base.ends_with(MAIN_SEPARATOR) {
        return path.starts_with(&*base);
    }
    path.strip_prefix(&*base)
        .is_some_and(|rest| rest.starts_with(MAIN_SEPARATOR))
}

/// Resolve symlinks in `candidate`.
///
/// Walks up to the deepest ancestor that exists, canonicalizes it and
/// re-appends the missing components. Any component that exists but cannot
/// be resolved, such as a dangling or looping symlink, is rejected.
fn resolve_existing(path: &str, candidate: &Path) -> Result<PathBuf, ValidationError> {
    let mut existing = candidate;
    let mut missing: Vec<OsString> = Vec::new();

    loop {
        match fs::symlink_metadata(existing) {
            Ok(_) => break,
            Err(e) if is_missing(&e) => {
                let (Some(name), Some(parent)) = (existing.file_name(), existing.parent()) else {
                    return Err(ValidationError::invalid(path, "no existing ancestor").with_source(e));
                };
                missing.push(name.to_os_string());
                existing = parent;
            }
            Err(e) => {
                return Err(ValidationError::invalid(path, "cannot inspect path").with_source(e));
            }
        }
    }

    let mut resolved = fs::canonicalize(existing).map_err(|e| {
        ValidationError::traversal(path, "symlink could not be resolved").with_source(e)
    })?;
    for name in missing.iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}
