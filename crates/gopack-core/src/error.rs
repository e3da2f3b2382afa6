//! Error types for the core passes.

use std::path::PathBuf;

use thiserror::Error;

use crate::report::{Failure, FailureKind};

/// Errors raised while processing a single module or cache file.
///
/// Nothing here aborts a run. The walker converts every error into a
/// report entry and continues with whatever remains reachable.
#[derive(Error, Debug)]
pub enum Error {
    #[error("could not read module {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write module {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not copy {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Convert into a report entry, splitting off the path and keeping
    /// the underlying cause as the message.
    #[must_use]
    pub fn into_failure(self) -> Failure {
        match self {
            Self::Read { path, source } => {
                Failure::new(FailureKind::Read, path, source.to_string())
            }
            Self::Write { path, source } => {
                Failure::new(FailureKind::Write, path, source.to_string())
            }
            Self::Copy { path, source } => {
                Failure::new(FailureKind::Materialize, path, source.to_string())
            }
        }
    }
}
