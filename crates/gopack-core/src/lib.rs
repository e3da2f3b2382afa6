#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]

//! Core passes for gopack: the link-resolution stage that turns compiled
//! component output into something a browser can load directly.
//!
//! Starting from a fixed entry module, the walker scans each reachable
//! module for import/export references, rewrites component extensions,
//! mirrors referenced npm packages into the build output and repoints
//! bare specifiers at the mirrored files. The whole stage is best-effort:
//! individual failures are recorded in the run report and the traversal
//! keeps going.

pub mod error;
pub mod fsx;
pub mod mirror;
pub mod paths;
pub mod report;
pub mod resolve;
pub mod rewrite;
pub mod scan;
pub mod walk;

pub use error::Error;
pub use paths::Layout;
pub use report::{Failure, FailureKind, PackReport, PackageEntry, UnresolvedRef};
pub use scan::{scan_references, RefKind, Reference};
pub use walk::{pack, Walker};
