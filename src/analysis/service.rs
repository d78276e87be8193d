// src/analysis/service.rs
//! Orchestration: load, extract interfaces, extract calls, find
//! satisfiers, then assemble one project report with module-relative
//! positions.

use crate::analysis::calls::CallAnalyzer;
use crate::analysis::implementations::ImplementationFinder;
use crate::analysis::interfaces::{InterfaceAnalyzer, InterfaceKey};
use crate::datamodel::{Interface, Location, PackageReport, ProjectReport};
use crate::errors::AnalysisError;
use crate::flow::PositionTable;
use crate::loader::PackageLoader;
use crate::sema::Universe;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The analysis pipeline, wired from its four capabilities. Tests
/// substitute any of them with plain values.
pub struct AnalysisService<L, IA, IF, CA> {
    loader: L,
    interface_analyzer: IA,
    implementation_finder: IF,
    call_analyzer: CA,
}

impl
    AnalysisService<
        crate::loader::DirLoader,
        crate::analysis::interfaces::AstInterfaceAnalyzer,
        crate::analysis::implementations::TypeBasedImplementationFinder,
        crate::analysis::calls::FlowCallAnalyzer,
    >
{
    /// The production wiring.
    pub fn with_defaults() -> Self {
        Self {
            loader: crate::loader::DirLoader::new(),
            interface_analyzer: crate::analysis::interfaces::AstInterfaceAnalyzer::new(),
            implementation_finder:
                crate::analysis::implementations::TypeBasedImplementationFinder::new(),
            call_analyzer: crate::analysis::calls::FlowCallAnalyzer::new(),
        }
    }
}

impl<L, IA, IF, CA> AnalysisService<L, IA, IF, CA>
where
    L: PackageLoader,
    IA: InterfaceAnalyzer,
    IF: ImplementationFinder,
    CA: CallAnalyzer,
{
    pub fn new(loader: L, interface_analyzer: IA, implementation_finder: IF, call_analyzer: CA) -> Self {
        Self {
            loader,
            interface_analyzer,
            implementation_finder,
            call_analyzer,
        }
    }

    /// Analyze the project at `path` and assemble the report.
    pub fn analyze_project(&self, path: &str) -> Result<ProjectReport, AnalysisError> {
        info!(path, "loading packages");
        let packages = self.loader.load(path)?;
        info!(count = packages.len(), "loaded packages");

        // Module root comes from the first package carrying manifest
        // metadata; its absence degrades paths, not the run.
        let (module_path, module_dir) = packages
            .iter()
            .find_map(|p| p.manifest.as_ref())
            .map(|m| (m.module_path.clone(), m.dir.clone()))
            .unwrap_or_else(|| {
                warn!("no module manifest metadata found on any package");
                (String::new(), PathBuf::new())
            });

        info!("analyzing interfaces");
        let mut interfaces = match self.interface_analyzer.analyze_interfaces(&packages) {
            Ok(map) => map,
            Err(err) => {
                warn!(error = %err, "interface analysis failed; proceeding without interface data");
                FxHashMap::default()
            }
        };
        info!(count = interfaces.len(), "found interface definitions");

        let infos: Vec<(&str, &crate::sema::PackageInfo)> = packages
            .iter()
            .map(|p| (p.import_path.as_str(), &p.info))
            .collect();
        let universe = Universe::new(infos);

        info!("analyzing calls");
        let (calls_by_pkg, positions) = self.call_analyzer.analyze_calls(&packages, &universe)?;
        let call_count: usize = calls_by_pkg.values().map(Vec::len).sum();
        info!(count = call_count, "found call sites");

        info!("finding implementations");
        if let Err(err) = self.implementation_finder.find_implementations(
            &packages,
            &mut interfaces,
            &universe,
            Some(&positions),
        ) {
            warn!(error = %err, "implementation finding failed; proceeding without implementation data");
        }
        let impl_count: usize = interfaces.values().map(|i| i.implementations.len()).sum();
        info!(count = impl_count, "found implementation relationships");

        // Interface locations were taken from the loader's syntax; verify
        // them against the shared position table before serialization.
        reindex_interfaces(&mut interfaces, &positions);

        let mut grouped: FxHashMap<String, Vec<Interface>> = FxHashMap::default();
        let mut keys: Vec<InterfaceKey> = interfaces.keys().cloned().collect();
        keys.sort();
        for key in keys {
            let Some(mut iface) = interfaces.remove(&key) else {
                continue;
            };
            relativize(&mut iface.location, &module_dir);
            for method in &mut iface.methods {
                relativize(&mut method.location, &module_dir);
            }
            iface.implementations.sort_by(|a, b| {
                (&a.package_path, &a.type_name, a.is_pointer)
                    .cmp(&(&b.package_path, &b.type_name, b.is_pointer))
            });
            for imp in &mut iface.implementations {
                relativize(&mut imp.location, &module_dir);
            }
            grouped.entry(iface.package_path.clone()).or_default().push(iface);
        }

        let mut calls_by_pkg = calls_by_pkg;
        let mut report = ProjectReport {
            module_path,
            module_dir: module_dir.to_string_lossy().into_owned(),
            packages: Vec::with_capacity(packages.len()),
        };

        for pkg in &packages {
            let files = pkg
                .files
                .iter()
                .map(|f| relative_display(f, &module_dir))
                .collect();

            let mut interfaces = grouped.remove(&pkg.import_path).unwrap_or_default();
            interfaces.sort_by(|a, b| a.name.cmp(&b.name));

            let mut calls = calls_by_pkg.remove(&pkg.import_path).unwrap_or_default();
            for call in &mut calls {
                relativize(&mut call.location, &module_dir);
            }
            calls.sort_by(|a, b| {
                (&a.location.filename, a.location.line, &a.caller_func_desc)
                    .cmp(&(&b.location.filename, b.location.line, &b.caller_func_desc))
            });

            report.packages.push(PackageReport {
                name: pkg.name.clone(),
                path: pkg.import_path.clone(),
                files,
                imports: pkg.imports.clone(),
                embed_files: pkg.embed_files.clone(),
                embed_patterns: pkg.embed_patterns.clone(),
                interfaces,
                calls,
            });
        }

        info!(packages = report.packages.len(), "analysis complete");
        Ok(report)
    }
}

/// Check interface and method locations against the shared position
/// table; locations in files the lowering never saw are kept but warned
/// about, so `(file, line)` drift is at least visible.
fn reindex_interfaces(interfaces: &mut FxHashMap<InterfaceKey, Interface>, positions: &PositionTable) {
    for iface in interfaces.values_mut() {
        let path = PathBuf::from(&iface.location.filename);
        if let Some(pos) = positions.translate(&path, iface.location.line) {
            iface.location.filename = pos.filename.to_string_lossy().into_owned();
            iface.location.line = pos.line;
        } else if !iface.location.filename.is_empty() {
            warn!(
                interface = %iface.name,
                file = %iface.location.filename,
                "interface location not present in the shared position table"
            );
        }
        for method in &mut iface.methods {
            let path = PathBuf::from(&method.location.filename);
            if let Some(pos) = positions.translate(&path, method.location.line) {
                method.location.filename = pos.filename.to_string_lossy().into_owned();
                method.location.line = pos.line;
            }
        }
    }
}

/// Rewrite an absolute filename under the module root to a
/// module-relative, forward-slash form.
fn relativize(location: &mut Location, module_dir: &Path) {
    if module_dir.as_os_str().is_empty() {
        return;
    }
    let path = Path::new(&location.filename);
    if path.is_absolute() {
        if let Ok(rel) = path.strip_prefix(module_dir) {
            location.filename = slash_path(rel);
        }
    }
}

fn relative_display(path: &Path, module_dir: &Path) -> String {
    if !module_dir.as_os_str().is_empty() && path.is_absolute() {
        if let Ok(rel) = path.strip_prefix(module_dir) {
            return slash_path(rel);
        }
    }
    path.to_string_lossy().into_owned()
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn service_report(files: &[(&str, &str)]) -> ProjectReport {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/m\n").unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        let service = AnalysisService::with_defaults();
        let pattern = format!("{}/...", dir.path().display());
        service.analyze_project(&pattern).unwrap()
    }

    #[test]
    fn report_paths_are_module_relative() {
        let report = service_report(&[(
            "pkg/a.go",
            "package pkg\n\ntype I interface { M() }\n\ntype T struct{}\nfunc (t T) M() {}\n",
        )]);
        let pkg = report
            .packages
            .iter()
            .find(|p| p.path == "example.com/m/pkg")
            .unwrap();
        assert_eq!(pkg.files, vec!["pkg/a.go"]);
        let iface = &pkg.interfaces[0];
        assert_eq!(iface.location.filename, "pkg/a.go");
        for imp in &iface.implementations {
            assert_eq!(imp.location.filename, "pkg/a.go");
        }
    }

    #[test]
    fn interfaces_group_under_defining_package() {
        let report = service_report(&[
            ("alpha/a.go", "package alpha\n\ntype A interface { M() }\n"),
            ("beta/b.go", "package beta\n\ntype B interface { N() }\n"),
        ]);
        let alpha = report
            .packages
            .iter()
            .find(|p| p.path == "example.com/m/alpha")
            .unwrap();
        assert_eq!(alpha.interfaces.len(), 1);
        assert_eq!(alpha.interfaces[0].name, "A");
        let beta = report
            .packages
            .iter()
            .find(|p| p.path == "example.com/m/beta")
            .unwrap();
        assert_eq!(beta.interfaces.len(), 1);
        assert_eq!(beta.interfaces[0].name, "B");
    }

    #[test]
    fn interfaces_sorted_by_name_within_package() {
        let report = service_report(&[(
            "a.go",
            "package m\n\ntype Zed interface{}\n\ntype Abel interface{}\n\ntype Mid interface{}\n",
        )]);
        let names: Vec<&str> = report.packages[0]
            .interfaces
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, vec!["Abel", "Mid", "Zed"]);
    }

    #[test]
    fn module_metadata_present() {
        let report = service_report(&[("a.go", "package m\n\nfunc F() {}\n")]);
        assert_eq!(report.module_path, "example.com/m");
        assert!(!report.module_dir.is_empty());
    }
}
