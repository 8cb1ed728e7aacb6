//! Home directory expansion for configured paths.

use std::path::PathBuf;

/// Expand a leading `~` to the user's home directory.
///
/// Only `~` and `~/...` are expanded. `~user` forms and paths without a
/// leading tilde are returned unchanged, as is everything when no home
/// directory can be determined.
pub fn expand_tilde(path: &str) -> PathBuf {
    let Some(home) = dirs::home_dir() else {
        return PathBuf::from(path);
    };

    if path == "~" {
        return home;
    }

    match path.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(path),
    }
}
