//! Path helpers: the peoplemem home directory and `~` expansion.

use std::path::{Path, PathBuf};

/// Root for default data and model paths (`~/.peoplemem`).
pub fn peoplemem_home() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    home.join(".peoplemem")
}

/// Expand a leading `~` in place.
pub fn expand_tilde(path: &mut PathBuf) {
    *path = expand_tilde_path(path);
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde_path(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
