//! Bare-reference resolution against the mirror tree.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::fsx;

/// Resolve a bare package specifier to a loadable file in the mirror
/// tree.
///
/// `spec` is a package name with optional scope or subpath (`left-pad`,
/// `@scope/pkg`, `pkg/dist`). Files directly under the package's
/// mirrored directory are checked first; when none match, subdirectories
/// are searched depth-first in pre-order, in deterministic filename
/// order, and the first directory that yields a loadable file wins.
///
/// Returns `None` when no loadable file exists anywhere under the
/// mirrored directory; the caller records the reference as unresolved.
/// Entries the walk cannot read are skipped with a warning.
#[must_use]
pub fn resolve_bare(web_modules: &Path, spec: &str) -> Option<PathBuf> {
    let package_dir = web_modules.join(spec);

    if let Some(found) = fsx::pick_loadable(&package_dir) {
        return Some(found);
    }

    for entry in WalkDir::new(&package_dir).min_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(&package_dir).to_path_buf();
                tracing::warn!(path = %path.display(), "skipping unreadable mirror entry: {err}");
                continue;
            }
        };
        if entry.file_type().is_dir() {
            if let Some(found) = fsx::pick_loadable(entry.path()) {
                return Some(found);
            }
        }
    }

    None
}
