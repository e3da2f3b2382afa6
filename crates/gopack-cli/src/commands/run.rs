//! `gopack run` command implementation.
//!
//! Runs whole-graph link resolution over a build output directory and
//! prints the run report.

use gopack_core::{pack, Failure, Layout, PackReport, PackageEntry, UnresolvedRef};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Run command action.
#[derive(Debug, Clone)]
pub struct RunAction {
    /// Build output directory containing `spa/ejected/main.js`.
    pub build_dir: PathBuf,
    /// Project root, parent of `node_modules`.
    pub cwd: PathBuf,
}

/// JSON output for the run command.
#[derive(Serialize)]
struct RunResultJson {
    ok: bool,
    build_dir: String,
    modules: Vec<String>,
    rewritten_static: u32,
    rewritten_dynamic: u32,
    packages: Vec<PackageEntry>,
    unresolved: Vec<UnresolvedRef>,
    failures: Vec<Failure>,
    duration_ms: u64,
}

/// Run the link-resolution command.
///
/// Problems inside the run never change the exit status: the stage is
/// best-effort, and callers inspect the report (or the JSON `ok` field)
/// to detect an unclean result.
pub fn run(action: RunAction, json: bool) -> Result<()> {
    let project_root = absolutize(&action.cwd)?;
    let build_root = if action.build_dir.is_absolute() {
        action.build_dir.clone()
    } else {
        project_root.join(&action.build_dir)
    };

    let layout = Layout::new(project_root, build_root.clone());
    tracing::debug!(entry = %layout.entry().display(), "running link resolution");

    let report = pack(&layout);

    if json {
        print_json(&build_root, report);
    } else {
        print_human(&build_root, &report);
    }
    Ok(())
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir().into_diagnostic()?.join(path))
    }
}

fn print_json(build_root: &Path, report: PackReport) {
    let json_result = RunResultJson {
        ok: report.ok(),
        build_dir: build_root.display().to_string(),
        modules: report
            .modules
            .iter()
            .map(|module| module.display().to_string())
            .collect(),
        rewritten_static: report.rewritten_static,
        rewritten_dynamic: report.rewritten_dynamic,
        packages: report.packages,
        unresolved: report.unresolved,
        failures: report.failures,
        duration_ms: report.duration_ms,
    };
    println!("{}", serde_json::to_string(&json_result).unwrap());
}

fn print_human(build_root: &Path, report: &PackReport) {
    for failure in &report.failures {
        eprintln!(
            "  warning: {} failure at {}: {}",
            failure.kind,
            failure.path.display(),
            failure.message
        );
    }
    for unresolved in &report.unresolved {
        eprintln!(
            "  warning: import '{}' not resolvable from {}",
            unresolved.specifier,
            unresolved.module.display()
        );
    }

    let files_mirrored: u32 = report.packages.iter().map(|pkg| pkg.files_copied).sum();
    println!(
        "  {} ({} modules, {} static + {} dynamic rewrites, {} packages, {} files mirrored, {}ms)",
        build_root.display(),
        report.modules.len(),
        report.rewritten_static,
        report.rewritten_dynamic,
        report.packages.len(),
        files_mirrored,
        report.duration_ms
    );
}
