//! Package materialization into the mirror tree.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::Error;
use crate::fsx;
use crate::report::{Failure, FailureKind};

/// What one [`materialize`] call did.
#[derive(Debug, Default)]
pub struct MaterializeOutcome {
    /// Loadable files copied into the mirror tree.
    pub files_copied: u32,
    /// Per-file walk or copy failures. A failed file never stops the
    /// remaining files from being copied.
    pub failures: Vec<Failure>,
}

/// Copy a package's browser-loadable files from the dependency cache
/// into the mirror tree.
///
/// Walks `<cache>/<spec>` in deterministic filename order and copies
/// every non-directory entry with a loadable extension to the same
/// relative position under `<mirror>`, creating parent directories as
/// needed. The mirror is a strict filtered subset of the cache: nothing
/// else is copied. Existing mirrored files are overwritten byte-verbatim,
/// so repeating a materialization changes nothing observable.
///
/// A missing package directory yields zero copies and one recorded
/// failure.
#[must_use]
pub fn materialize(cache_root: &Path, mirror_root: &Path, spec: &str) -> MaterializeOutcome {
    let package_dir = cache_root.join(spec);
    let mut outcome = MaterializeOutcome::default();

    for entry in WalkDir::new(&package_dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(&package_dir).to_path_buf();
                outcome
                    .failures
                    .push(Failure::new(FailureKind::Materialize, path, err.to_string()));
                continue;
            }
        };
        if entry.file_type().is_dir() || !fsx::is_loadable(entry.path()) {
            continue;
        }
        match copy_into_mirror(entry.path(), cache_root, mirror_root) {
            Ok(()) => outcome.files_copied += 1,
            Err(err) => outcome.failures.push(err.into_failure()),
        }
    }

    outcome
}

/// Copy one cache file to the equivalent position under the mirror root.
fn copy_into_mirror(source: &Path, cache_root: &Path, mirror_root: &Path) -> Result<(), Error> {
    let relative = source.strip_prefix(cache_root).unwrap_or(source);
    let dest = mirror_root.join(relative);

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|err| Error::Copy {
            path: dest.clone(),
            source: err,
        })?;
    }
    fs::copy(source, &dest).map_err(|err| Error::Copy {
        path: source.to_path_buf(),
        source: err,
    })?;
    Ok(())
}
