//! Filesystem and extension helpers.
//!
//! The constants here carry the whole extension policy of the stage:
//! which files count as browser-loadable, and which component source
//! extension gets rewritten to plain-script form inside import paths.

use std::fs;
use std::path::{Path, PathBuf};

/// Plain script extension, the rewrite target for component paths.
pub const SCRIPT_EXT: &str = "js";
/// Module-file extension, equally browser-loadable.
pub const MODULE_EXT: &str = "mjs";
/// Component source extension left behind in compiled import paths.
pub const COMPONENT_EXT: &str = "svelte";

/// Check whether a path exists on disk.
///
/// Directories satisfy the check too. The walker treats any existing
/// location as a local module and surfaces a read failure later if it
/// turns out not to be a file.
#[must_use]
pub fn path_exists(path: &Path) -> bool {
    path.exists()
}

/// Check whether a file's extension marks it as browser-loadable.
#[must_use]
pub fn is_loadable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == SCRIPT_EXT || ext == MODULE_EXT)
}

/// Check whether a specifier carries the component source extension.
#[must_use]
pub fn is_component(spec: &str) -> bool {
    Path::new(spec)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == COMPONENT_EXT)
}

/// Rewrite a component specifier to its plain-script form.
///
/// Idempotent: anything without the component extension, including
/// specifiers that already end in `.js`, comes back unchanged.
#[must_use]
pub fn component_to_script(spec: &str) -> String {
    if !is_component(spec) {
        return spec.to_string();
    }
    match spec.strip_suffix(COMPONENT_EXT) {
        Some(stem) => format!("{stem}{SCRIPT_EXT}"),
        None => spec.to_string(),
    }
}

/// Classify a specifier as a bare package reference: no relative or
/// absolute prefix, and no file extension. The package name may carry a
/// scope (`@scope/pkg`) or a subpath (`pkg/dist`).
#[must_use]
pub fn is_bare(spec: &str) -> bool {
    !spec.is_empty()
        && !spec.starts_with('.')
        && !spec.starts_with('/')
        && Path::new(spec).extension().is_none()
}

/// Pick a loadable script file from a directory's direct children.
///
/// When several loadable files coexist the choice is deterministic: a
/// file whose stem is exactly `index` wins (`.mjs` preferred over `.js`),
/// otherwise the lexicographically smallest loadable filename is chosen.
/// Unreadable or empty directories yield `None`.
#[must_use]
pub fn pick_loadable(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|ty| ty.is_file()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_loadable(Path::new(name)))
        .collect();
    names.sort();

    for preferred in [format!("index.{MODULE_EXT}"), format!("index.{SCRIPT_EXT}")] {
        if names.iter().any(|name| *name == preferred) {
            return Some(dir.join(preferred));
        }
    }
    names.first().map(|name| dir.join(name))
}
