//! Include-path candidates and validation.
//!
//! A ruleset is looked up as `<dir>/rules/<name>.xml` across an ordered
//! list of include directories. This module owns the usability check for
//! one directory and the construction of the default candidate list from
//! the environment.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::DEFAULT_XKB_CONFIG_ROOT;

/// Whether `path` can serve as an include directory: it exists, is a
/// directory, and carries both read and search (execute) permission.
pub(crate) fn is_searchable_dir(path: &Path) -> bool {
    let Ok(meta) = fs::metadata(path) else {
        return false;
    };
    meta.is_dir() && has_search_permission(&meta) && fs::read_dir(path).is_ok()
}

/// A directory with no read bit or no search bit set at all cannot be
/// searched for rules files. The `read_dir` probe alone does not catch
/// this for privileged callers, which bypass the permission check.
#[cfg(unix)]
fn has_search_permission(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;

    let mode = meta.permissions().mode();
    mode & 0o444 != 0 && mode & 0o111 != 0
}

#[cfg(not(unix))]
fn has_search_permission(_meta: &fs::Metadata) -> bool {
    true
}

/// Read-only environment lookup. A seam so candidate construction can be
/// exercised against a fixed environment.
pub(crate) trait Env {
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
pub(crate) struct SystemEnv;

impl Env for SystemEnv {
    fn var(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }
}

/// Default include-path candidates, in search order:
/// `$XDG_CONFIG_HOME/xkb` (falling back to `$HOME/.config/xkb`), then
/// `$HOME/.xkb`, then `$XKB_CONFIG_ROOT` or the compiled-in root. No
/// validation happens here; unusable candidates are dropped by the caller.
pub(crate) fn default_candidates(env: &dyn Env) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    let home = env.var("HOME");

    if let Some(xdg) = env.var("XDG_CONFIG_HOME") {
        candidates.push(Path::new(&xdg).join("xkb"));
    } else if let Some(home) = &home {
        candidates.push(Path::new(home).join(".config").join("xkb"));
    }

    if let Some(home) = &home {
        candidates.push(Path::new(home).join(".xkb"));
    }

    match env.var("XKB_CONFIG_ROOT") {
        Some(root) => candidates.push(PathBuf::from(root)),
        None => candidates.push(PathBuf::from(DEFAULT_XKB_CONFIG_ROOT)),
    }

    candidates
}
