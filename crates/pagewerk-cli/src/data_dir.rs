// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution.

use std::path::{Path, PathBuf};

/// Return the application data directory. Not created on read.
pub fn data_dir() -> PathBuf {
    base_dir().join("pagewerk")
}

fn base_dir() -> PathBuf {
    resolve(
        std::env::var_os("XDG_DATA_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn resolve(xdg: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    // XDG first, then ~/.local/share
    if let Some(xdg) = xdg.filter(|p| p.is_absolute()) {
        return xdg;
    }
    if let Some(home) = home {
        return home.join(".local").join("share");
    }
    // Last resort
    Path::new("/tmp").to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_wins_over_home() {
        let dir = resolve(Some("/xdg".into()), Some("/home/me".into()));
        assert_eq!(dir, PathBuf::from("/xdg"));
    }

    #[test]
    fn relative_xdg_is_ignored() {
        let dir = resolve(Some("relative".into()), Some("/home/me".into()));
        assert_eq!(dir, PathBuf::from("/home/me/.local/share"));
    }

    #[test]
    fn falls_back_to_tmp() {
        assert_eq!(resolve(None, None), PathBuf::from("/tmp"));
    }
}
