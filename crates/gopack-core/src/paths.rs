//! Fixed directory layout of a resolution run.
//!
//! Every path the stage touches derives from two roots: the project root,
//! which holds the dependency cache, and the build output root, which
//! holds the compiled components and receives the mirror tree.

use std::path::{Path, PathBuf};

use gopack_util::path::normalize;

/// Dependency cache directory name under the project root.
pub const NODE_MODULES_DIR: &str = "node_modules";
/// Single-page-app directory under the build root.
pub const SPA_DIR: &str = "spa";
/// Mirror tree directory under `spa/`.
pub const WEB_MODULES_DIR: &str = "web_modules";
/// Compiled component directory under `spa/`.
pub const EJECTED_DIR: &str = "ejected";
/// Entry module filename inside the ejected directory.
pub const ENTRY_FILE: &str = "main.js";

/// Directory roots for one resolution run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    project_root: PathBuf,
    build_root: PathBuf,
}

impl Layout {
    /// Create a layout from the project root and the build output root.
    ///
    /// Both paths are normalized lexically. Callers should pass absolute
    /// paths so module identity stays stable across the traversal.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>, build_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: normalize(&project_root.into()),
            build_root: normalize(&build_root.into()),
        }
    }

    /// The project root, parent of the dependency cache.
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// The build output root.
    #[must_use]
    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    /// Dependency cache root: `<project>/node_modules`.
    #[must_use]
    pub fn node_modules(&self) -> PathBuf {
        self.project_root.join(NODE_MODULES_DIR)
    }

    /// Mirror output root: `<build>/spa/web_modules`.
    #[must_use]
    pub fn web_modules(&self) -> PathBuf {
        self.build_root.join(SPA_DIR).join(WEB_MODULES_DIR)
    }

    /// Compiled component root: `<build>/spa/ejected`.
    #[must_use]
    pub fn ejected_dir(&self) -> PathBuf {
        self.build_root.join(SPA_DIR).join(EJECTED_DIR)
    }

    /// Entry module: `<build>/spa/ejected/main.js`.
    #[must_use]
    pub fn entry(&self) -> PathBuf {
        self.ejected_dir().join(ENTRY_FILE)
    }
}
