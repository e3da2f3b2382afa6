//! Whole-graph link resolution.
//!
//! The walker starts at an entry module and drives everything else: it
//! scans each module's text for references, rewrites dynamic-import
//! extensions, resolves static references (recursing into local files,
//! materializing and resolving bare packages), patches the text and
//! writes it back, then moves on to the next discovered module.
//!
//! Traversal is an explicit work-list over a shared visited set rather
//! than call-stack recursion, so cyclic graphs terminate and deep graphs
//! cannot overflow the stack. Each module is read, rewritten and written
//! back at most once per run.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use gopack_util::fs::atomic_write;
use gopack_util::path::{normalize, relative_from};

use crate::error::Error;
use crate::fsx;
use crate::mirror;
use crate::paths::Layout;
use crate::report::{Failure, FailureKind, PackReport, PackageEntry, UnresolvedRef};
use crate::resolve::resolve_bare;
use crate::rewrite::{self, Patch};
use crate::scan::{scan_references, RefKind};

/// Run link resolution over the layout's fixed entry module.
#[must_use]
pub fn pack(layout: &Layout) -> PackReport {
    let entry = layout.entry();
    Walker::new(layout.clone()).run(&entry)
}

/// Graph walker: owns the traversal context and the run report.
pub struct Walker {
    layout: Layout,
    /// Modules already visited this run; the cycle and re-entry guard.
    visited: HashSet<PathBuf>,
    queue: VecDeque<PathBuf>,
    /// Packages already materialized this run.
    materialized: HashSet<String>,
    /// Memoized bare resolutions, misses included.
    resolved: HashMap<String, Option<PathBuf>>,
    report: PackReport,
}

impl Walker {
    /// Create a walker for one run over `layout`.
    #[must_use]
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            visited: HashSet::new(),
            queue: VecDeque::new(),
            materialized: HashSet::new(),
            resolved: HashMap::new(),
            report: PackReport::default(),
        }
    }

    /// Walk the graph reachable from `entry` and return the run report.
    ///
    /// Never fails: every read, write, materialization or resolution
    /// problem is recorded in the report and the traversal continues
    /// with whatever remains reachable.
    #[must_use]
    pub fn run(mut self, entry: &Path) -> PackReport {
        let start = Instant::now();
        self.queue.push_back(normalize(entry));

        while let Some(module) = self.queue.pop_front() {
            if !self.visited.insert(module.clone()) {
                continue;
            }
            if let Err(err) = self.process_module(&module) {
                self.report.failures.push(err.into_failure());
            }
        }

        self.report.duration_ms = start.elapsed().as_millis() as u64;
        self.report
    }

    /// Process one module: scan, resolve, patch, write back.
    ///
    /// The module is handled as raw bytes throughout, so content outside
    /// the patched specifier spans round-trips byte for byte. Read and
    /// write failures abort this module only. Resolution problems are
    /// recorded per reference and abort nothing.
    fn process_module(&mut self, module: &Path) -> Result<(), Error> {
        let bytes = fs::read(module).map_err(|source| Error::Read {
            path: module.to_path_buf(),
            source,
        })?;
        self.report.modules.push(module.to_path_buf());

        let module_dir = module.parent().unwrap_or(Path::new(".")).to_path_buf();
        let mut patches: Vec<Patch> = Vec::new();

        for reference in scan_references(&bytes) {
            if reference.specifier.is_empty() {
                continue;
            }
            match reference.kind {
                RefKind::DynamicCall => {
                    if fsx::is_component(&reference.specifier) {
                        let rewritten = fsx::component_to_script(&reference.specifier);
                        patches.push(Patch::new(
                            reference.specifier_span.clone(),
                            requote(&rewritten, reference.quote),
                        ));
                        self.report.rewritten_dynamic += 1;
                    }
                }
                RefKind::StaticDeclaration => {
                    match self.resolve_static(&reference.specifier, &module_dir, module) {
                        Some(replacement) => {
                            if replacement != reference.specifier {
                                patches.push(Patch::new(
                                    reference.specifier_span.clone(),
                                    requote(&replacement, reference.quote),
                                ));
                                self.report.rewritten_static += 1;
                            }
                        }
                        None => {
                            self.report.unresolved.push(UnresolvedRef {
                                module: module.to_path_buf(),
                                specifier: reference.specifier.clone(),
                            });
                        }
                    }
                }
            }
        }

        let rewritten = rewrite::apply(&bytes, patches);
        atomic_write(module, &rewritten).map_err(|source| Error::Write {
            path: module.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// Resolve one static reference to its replacement specifier.
    ///
    /// Local files win over packages: an existing path relative to the
    /// module is enqueued for traversal and keeps its relative form. A
    /// bare specifier is materialized and resolved against the mirror
    /// tree. `None` means nothing resolved and the span stays untouched.
    fn resolve_static(
        &mut self,
        specifier: &str,
        module_dir: &Path,
        module: &Path,
    ) -> Option<String> {
        let spec = fsx::component_to_script(specifier);
        let location = normalize(&module_dir.join(&spec));

        if fsx::path_exists(&location) {
            self.queue.push_back(location);
            return Some(strip_build_root(&spec, self.layout.build_root()));
        }

        if fsx::is_bare(&spec) {
            return self.resolve_package(&spec, module_dir, module);
        }

        None
    }

    /// Materialize a package (once per run) and resolve the specifier to
    /// a mirror-tree path relative to the referencing module's directory.
    fn resolve_package(&mut self, spec: &str, module_dir: &Path, module: &Path) -> Option<String> {
        if self.materialized.insert(spec.to_string()) {
            let outcome =
                mirror::materialize(&self.layout.node_modules(), &self.layout.web_modules(), spec);
            self.report.packages.push(PackageEntry {
                spec: spec.to_string(),
                files_copied: outcome.files_copied,
            });
            self.report.failures.extend(outcome.failures);
        }

        let web_modules = self.layout.web_modules();
        let target = self
            .resolved
            .entry(spec.to_string())
            .or_insert_with(|| resolve_bare(&web_modules, spec))
            .clone()?;

        match relative_from(&target, module_dir) {
            Some(relative) => {
                let replacement = specifier_string(&relative);
                Some(strip_build_root(&replacement, self.layout.build_root()))
            }
            None => {
                self.report.failures.push(Failure::new(
                    FailureKind::RelativePath,
                    module,
                    format!(
                        "could not make {} relative to {}",
                        target.display(),
                        module_dir.display()
                    ),
                ));
                None
            }
        }
    }
}

/// Wrap a specifier in its original quote character.
fn requote(spec: &str, quote: char) -> String {
    format!("{quote}{spec}{quote}")
}

/// Join path components with forward slashes, the only separator import
/// specifiers understand.
fn slash_join(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Format a relative path as an import specifier, prefixing `./` when
/// the path does not already climb.
fn specifier_string(path: &Path) -> String {
    let joined = slash_join(path);
    if joined.starts_with("../") || joined.starts_with("./") {
        joined
    } else {
        format!("./{joined}")
    }
}

/// Strip a lingering build-output prefix, leaving a root-relative URL.
/// Resolved specifiers are normally already relative, so this is a
/// safety net for the rare absolute leak.
fn strip_build_root(spec: &str, build_root: &Path) -> String {
    match Path::new(spec).strip_prefix(build_root) {
        Ok(rest) => format!("/{}", slash_join(rest)),
        Err(_) => spec.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(path: &Path, contents: impl AsRef<[u8]>) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn layout_in(project: &Path) -> Layout {
        Layout::new(project, project.join("public"))
    }

    fn read_ejected(layout: &Layout, name: &str) -> String {
        fs::read_to_string(layout.ejected_dir().join(name)).unwrap()
    }

    #[test]
    fn test_local_component_import_rewritten_and_traversed() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        write(
            &layout.entry(),
            "import { App } from './app.svelte';\nApp();\n",
        );
        write(
            &layout.ejected_dir().join("app.js"),
            "export function App() {}\n",
        );

        let report = pack(&layout);

        assert!(report.ok());
        assert_eq!(
            read_ejected(&layout, "main.js"),
            "import { App } from './app.js';\nApp();\n"
        );
        assert_eq!(report.rewritten_static, 1);
        assert_eq!(report.modules.len(), 2);
        assert_eq!(report.modules[0], layout.entry());
        assert_eq!(report.modules[1], layout.ejected_dir().join("app.js"));
    }

    #[test]
    fn test_cycle_terminates_and_each_module_visited_once() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        write(&layout.entry(), "import './router.js';\n");
        write(
            &layout.ejected_dir().join("router.js"),
            "import './main.js';\nexport const route = 1;\n",
        );

        let report = pack(&layout);

        assert!(report.ok());
        assert_eq!(report.modules.len(), 2);
        let unique: std::collections::HashSet<_> = report.modules.iter().collect();
        assert_eq!(unique.len(), report.modules.len());
    }

    #[test]
    fn test_dynamic_import_extension_rewrite_is_idempotent() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        write(
            &layout.entry(),
            "const a = import('./lazy.svelte');\nconst b = import('./done.js');\n",
        );

        let report = pack(&layout);

        let main = read_ejected(&layout, "main.js");
        assert!(main.contains("import('./lazy.js')"));
        assert!(main.contains("import('./done.js')"));
        assert_eq!(report.rewritten_dynamic, 1);
    }

    #[test]
    fn test_bare_package_materialized_and_repointed() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        let body = "export default function leftPad(s, n) { return s.padStart(n); }\n";
        write(&layout.node_modules().join("left-pad/index.mjs"), body);
        write(
            &layout.node_modules().join("left-pad/README.md"),
            "# left-pad\n",
        );
        write(&layout.entry(), "import leftPad from 'left-pad';\n");

        let report = pack(&layout);

        assert!(report.ok(), "unexpected problems: {report:?}");
        let mirrored = layout.web_modules().join("left-pad/index.mjs");
        assert_eq!(fs::read_to_string(&mirrored).unwrap(), body);
        assert!(!layout.web_modules().join("left-pad/README.md").exists());

        let main = read_ejected(&layout, "main.js");
        assert!(
            main.contains("from '../web_modules/left-pad/index.mjs'"),
            "unexpected rewrite: {main}"
        );
        assert!(!main.contains(&layout.build_root().display().to_string()));

        assert_eq!(report.packages.len(), 1);
        assert_eq!(report.packages[0].spec, "left-pad");
        assert_eq!(report.packages[0].files_copied, 1);
        assert_eq!(report.rewritten_static, 1);
    }

    #[test]
    fn test_package_materialized_once_per_run() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        write(
            &layout.node_modules().join("pkg/index.mjs"),
            "export default 1;\n",
        );
        write(
            &layout.entry(),
            "import a from 'pkg';\nimport './other.js';\n",
        );
        write(
            &layout.ejected_dir().join("other.js"),
            "import b from 'pkg';\n",
        );

        let report = pack(&layout);

        assert!(report.ok());
        assert_eq!(report.packages.len(), 1);
        assert_eq!(report.rewritten_static, 2);
    }

    #[test]
    fn test_nested_package_file_resolved() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        write(
            &layout.node_modules().join("pkg/dist/pkg.esm.mjs"),
            "export default 1;\n",
        );
        write(
            &layout.node_modules().join("pkg/package.json"),
            "{ \"name\": \"pkg\" }\n",
        );
        write(&layout.entry(), "import pkg from 'pkg';\n");

        let report = pack(&layout);

        assert!(report.ok());
        let main = read_ejected(&layout, "main.js");
        assert!(main.contains("from '../web_modules/pkg/dist/pkg.esm.mjs'"));
    }

    #[test]
    fn test_scoped_package() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        write(
            &layout.node_modules().join("@scope/pkg/index.mjs"),
            "export default 1;\n",
        );
        write(&layout.entry(), "import pkg from '@scope/pkg';\n");

        let report = pack(&layout);

        assert!(report.ok());
        let main = read_ejected(&layout, "main.js");
        assert!(main.contains("from '../web_modules/@scope/pkg/index.mjs'"));
    }

    #[test]
    fn test_subpath_spec_mirrors_and_resolves_subtree_only() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        write(
            &layout.node_modules().join("pkg/index.mjs"),
            "export default 1;\n",
        );
        write(
            &layout.node_modules().join("pkg/dist/esm.mjs"),
            "export default 2;\n",
        );
        write(&layout.entry(), "import pkg from 'pkg/dist';\n");

        let report = pack(&layout);

        assert!(report.ok());
        assert!(layout.web_modules().join("pkg/dist/esm.mjs").exists());
        assert!(!layout.web_modules().join("pkg/index.mjs").exists());
        let main = read_ejected(&layout, "main.js");
        assert!(main.contains("from '../web_modules/pkg/dist/esm.mjs'"));
    }

    #[test]
    fn test_unresolvable_reference_left_untouched() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        write(&layout.entry(), "import ghost from 'ghost-pkg';\n");

        let report = pack(&layout);

        assert!(!report.ok());
        assert_eq!(
            read_ejected(&layout, "main.js"),
            "import ghost from 'ghost-pkg';\n"
        );
        assert_eq!(report.unresolved.len(), 1);
        assert_eq!(report.unresolved[0].specifier, "ghost-pkg");
        assert_eq!(report.unresolved[0].module, layout.entry());
        // missing cache directory also shows up as a materialize failure,
        // and the attempt is still listed under packages
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::Materialize);
        assert_eq!(report.packages.len(), 1);
        assert_eq!(report.packages[0].files_copied, 0);
        assert_eq!(report.rewritten_static, 0);
    }

    #[test]
    fn test_side_effect_import_traversed() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        write(&layout.entry(), "import './setup.js';\n");
        write(&layout.ejected_dir().join("setup.js"), "globalThis.s = 1;\n");

        let report = pack(&layout);

        assert!(report.ok());
        assert_eq!(report.modules.len(), 2);
        assert_eq!(read_ejected(&layout, "main.js"), "import './setup.js';\n");
    }

    #[test]
    fn test_identical_statements_each_patched() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        write(
            &layout.entry(),
            "import './widget.svelte';\nimport './widget.svelte';\n",
        );
        write(&layout.ejected_dir().join("widget.js"), "export {};\n");

        let report = pack(&layout);

        assert!(report.ok());
        assert_eq!(
            read_ejected(&layout, "main.js"),
            "import './widget.js';\nimport './widget.js';\n"
        );
        assert_eq!(report.rewritten_static, 2);
        assert_eq!(report.modules.len(), 2);
    }

    #[test]
    fn test_quote_character_preserved() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        write(&layout.entry(), "import { a } from \"./app.svelte\";\n");
        write(&layout.ejected_dir().join("app.js"), "export const a = 1;\n");

        pack(&layout);

        assert_eq!(
            read_ejected(&layout, "main.js"),
            "import { a } from \"./app.js\";\n"
        );
    }

    #[test]
    fn test_missing_entry_recorded_as_read_failure() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());

        let report = pack(&layout);

        assert!(!report.ok());
        assert!(report.modules.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::Read);
        assert_eq!(report.failures[0].path, layout.entry());
    }

    #[test]
    fn test_unwritable_module_recorded_as_write_failure() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        write(&layout.entry(), "const x = 1;\n");
        // occupy the write-back temp path so the atomic write cannot land
        let temp = layout
            .ejected_dir()
            .join(format!(".main.js.gopack-{}", std::process::id()));
        fs::create_dir_all(&temp).unwrap();

        let report = pack(&layout);

        assert!(!report.ok());
        assert_eq!(report.modules.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, FailureKind::Write);
        assert_eq!(report.failures[0].path, layout.entry());
        assert_eq!(
            fs::read_to_string(layout.entry()).unwrap(),
            "const x = 1;\n"
        );
    }

    #[test]
    fn test_unrelatable_target_recorded_as_relative_path_failure() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        write(
            &layout.node_modules().join("pkg/index.mjs"),
            "export default 1;\n",
        );
        let mut walker = Walker::new(layout);

        // a relative importer has no lexical relation to the absolute mirror tree
        let module_dir = PathBuf::from("elsewhere");
        let module = module_dir.join("main.js");
        assert_eq!(walker.resolve_package("pkg", &module_dir, &module), None);

        assert_eq!(walker.report.packages.len(), 1);
        assert_eq!(walker.report.failures.len(), 1);
        assert_eq!(walker.report.failures[0].kind, FailureKind::RelativePath);
        assert_eq!(walker.report.failures[0].path, module);
    }

    #[test]
    fn test_module_without_references_round_trips() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        let body = "const answer = 42;\nconsole.log(answer);\n";
        write(&layout.entry(), body);

        let report = pack(&layout);

        assert!(report.ok());
        assert_eq!(read_ejected(&layout, "main.js"), body);
    }

    #[test]
    fn test_non_utf8_bytes_round_trip() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        write(
            &layout.entry(),
            b"import { c } from './legacy.svelte';\nconst copyright = '\xA9 2020';\n",
        );
        write(
            &layout.ejected_dir().join("legacy.js"),
            b"export const c = '\xFF\xFE';\n",
        );

        let report = pack(&layout);

        assert!(report.ok());
        assert_eq!(report.rewritten_static, 1);
        assert_eq!(
            fs::read(layout.entry()).unwrap(),
            b"import { c } from './legacy.js';\nconst copyright = '\xA9 2020';\n"
        );
        // a module with nothing to rewrite is written back byte-identical
        assert_eq!(
            fs::read(layout.ejected_dir().join("legacy.js")).unwrap(),
            b"export const c = '\xFF\xFE';\n"
        );
    }

    #[test]
    fn test_empty_specifier_skipped() {
        let dir = tempdir().unwrap();
        let layout = layout_in(dir.path());
        write(&layout.entry(), "import '';\n");

        let report = pack(&layout);

        assert!(report.ok());
        assert!(report.unresolved.is_empty());
        assert_eq!(read_ejected(&layout, "main.js"), "import '';\n");
    }

    #[test]
    fn test_specifier_string_adds_dot_slash_only_when_needed() {
        assert_eq!(
            specifier_string(Path::new("../web_modules/pkg/index.mjs")),
            "../web_modules/pkg/index.mjs"
        );
        assert_eq!(specifier_string(Path::new("pkg/index.mjs")), "./pkg/index.mjs");
    }

    #[test]
    fn test_strip_build_root_is_a_noop_for_relative_specs() {
        let build = Path::new("/site/public");
        assert_eq!(strip_build_root("./app.js", build), "./app.js");
        assert_eq!(
            strip_build_root("../web_modules/pkg/index.mjs", build),
            "../web_modules/pkg/index.mjs"
        );
        assert_eq!(
            strip_build_root("/site/public/spa/web_modules/pkg/index.mjs", build),
            "/spa/web_modules/pkg/index.mjs"
        );
    }
}
