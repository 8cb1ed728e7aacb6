//! File metadata returned by `stat`.

use std::fs::Metadata;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Metadata for a single path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Final component of the requested path.
    pub name: String,
    /// The path exactly as the caller supplied it.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, serialized as whole seconds since the Unix
    /// epoch.
    #[serde(with = "unix_secs")]
    pub modified: SystemTime,
    /// Whether the path is a directory.
    pub is_dir: bool,
    /// Permission string, e.g. `-rw-------` or `drwx------`.
    pub mode: String,
}

impl FileInfo {
    pub(crate) fn from_metadata(name: String, path: &str, metadata: &Metadata) -> Self {
        Self {
            name,
            path: path.to_string(),
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            is_dir: metadata.is_dir(),
            mode: mode_string(metadata),
        }
    }

    /// Modification time as seconds since the Unix epoch.
    pub fn modified_unix_secs(&self) -> u64 {
        unix_secs::to_secs(&self.modified)
    }
}

mod unix_secs {
    use std::time::{Duration, SystemTime};

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn to_secs(time: &SystemTime) -> u64 {
        time.duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    pub fn serialize<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(to_secs(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SystemTime, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    }
}

/// Render the mode as a ten character `ls -l` style string.
#[cfg(unix)]
pub fn mode_string(metadata: &Metadata) -> String {
    use std::os::unix::fs::{FileTypeExt, PermissionsExt};

    let file_type = metadata.file_type();
    let kind = if file_type.is_dir() {
        'd'
    } else if file_type.is_symlink() {
        'l'
    } else if file_type.is_fifo() {
        'p'
    } else if file_type.is_socket() {
        's'
    } else if file_type.is_char_device() {
        'c'
    } else if file_type.is_block_device() {
        'b'
    } else {
        '-'
    };

    format_mode(kind, metadata.permissions().mode())
}

/// Fallback where no Unix mode bits exist: type marker plus octal digits.
#[cfg(not(unix))]
pub fn mode_string(metadata: &Metadata) -> String {
    let kind = if metadata.is_dir() { 'd' } else { '-' };
    let bits = if metadata.permissions().readonly() {
        0o444
    } else {
        0o666
    };
    format!("{kind}{bits:o}")
}

#[cfg_attr(not(unix), allow(dead_code))]
fn format_mode(kind: char, mode: u32) -> String {
    const RWX: [(u32, char); 9] = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];

    let mut out = String::with_capacity(10);
    out.push(kind);
    for (bit, ch) in RWX {
        out.push(if mode & bit != 0 { ch } else { '-' });
    }
    out
}
