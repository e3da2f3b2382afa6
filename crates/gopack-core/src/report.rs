//! Structured run report.
//!
//! Every diagnostic a run produces lands here instead of aborting the
//! traversal. Callers inspect or serialize the report to decide whether
//! the output is clean.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Category of a recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// A module could not be read.
    Read,
    /// A rewritten module could not be written back.
    Write,
    /// A dependency-cache walk or copy failed.
    Materialize,
    /// A resolved path could not be made relative to its importer.
    RelativePath,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Materialize => "materialize",
            Self::RelativePath => "relative-path",
        };
        f.write_str(name)
    }
}

/// One non-fatal failure recorded during a run.
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub path: PathBuf,
    pub message: String,
}

impl Failure {
    /// Create a failure record.
    #[must_use]
    pub fn new(kind: FailureKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A reference that resolved to neither a local file nor a mirrored
/// package file. Its statement is left untouched in the module text.
#[derive(Debug, Clone, Serialize)]
pub struct UnresolvedRef {
    /// Module the reference appears in.
    pub module: PathBuf,
    /// The specifier as written in the source.
    pub specifier: String,
}

/// One package materialization attempt during a run.
#[derive(Debug, Clone, Serialize)]
pub struct PackageEntry {
    /// The bare specifier that triggered the materialization.
    pub spec: String,
    /// Loadable files copied for it; zero when the cache entry was
    /// missing or empty.
    pub files_copied: u32,
}

/// Result of one whole-graph resolution run.
#[derive(Debug, Default, Serialize)]
pub struct PackReport {
    /// Modules processed, in visit order. Contains no duplicates: the
    /// traversal context guarantees each module is visited at most once.
    pub modules: Vec<PathBuf>,
    /// Static references whose specifier text changed.
    pub rewritten_static: u32,
    /// Dynamic-call references whose specifier text changed.
    pub rewritten_dynamic: u32,
    /// Package materialization attempts, in first-reference order.
    pub packages: Vec<PackageEntry>,
    /// References left untouched because nothing resolved.
    pub unresolved: Vec<UnresolvedRef>,
    /// Non-fatal failures encountered along the way.
    pub failures: Vec<Failure>,
    /// Wall-clock duration of the run.
    pub duration_ms: u64,
}

impl PackReport {
    /// True when the run finished with no failures and no unresolved
    /// references.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.failures.is_empty() && self.unresolved.is_empty()
    }
}
