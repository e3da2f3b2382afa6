//! Lexical path math.
//!
//! The resolver compares and rewrites paths for files that may not exist
//! yet, so everything here works on path components alone and never touches
//! the filesystem.

use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` components without consulting the filesystem.
///
/// `a/b/../c` becomes `a/c`; leading `..` components of a relative path are
/// kept since there is nothing to pop. Symlinks are not resolved — module
/// identity in a traversal is the cleaned join, exactly as each import was
/// written.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // Rooted paths cannot climb above the root.
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }

    out
}

/// Express `target` relative to the directory `base`.
///
/// Both paths must be pre-normalized and either both absolute or both
/// relative. Returns `None` when no lexical relation exists (mixed
/// absolute/relative, or `base` still contains `..`).
#[must_use]
pub fn relative_from(target: &Path, base: &Path) -> Option<PathBuf> {
    if target.is_absolute() != base.is_absolute() {
        return None;
    }

    let mut target_iter = target.components();
    let mut base_iter = base.components();
    let mut out: Vec<Component> = Vec::new();

    loop {
        match (target_iter.next(), base_iter.next()) {
            (None, None) => break,
            (Some(t), None) => {
                out.push(t);
                out.extend(target_iter);
                break;
            }
            (None, Some(_)) => out.push(Component::ParentDir),
            (Some(t), Some(b)) if out.is_empty() && t == b => {}
            (Some(t), Some(Component::CurDir)) => out.push(t),
            (Some(_), Some(Component::ParentDir)) => return None,
            (Some(t), Some(_)) => {
                out.push(Component::ParentDir);
                out.extend(base_iter.map(|_| Component::ParentDir));
                out.push(t);
                out.extend(target_iter);
                break;
            }
        }
    }

    Some(out.iter().map(|c| c.as_os_str()).collect())
}
