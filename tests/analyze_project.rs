// tests/analyze_project.rs
//! End-to-end scenarios: build a module tree on disk, run the full
//! pipeline, and assert on the assembled report.

use goscope::analysis::AnalysisService;
use goscope::datamodel::{CallType, Interface, PackageReport, ProjectReport};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_tree(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("go.mod"), "module example.com/demo\n\ngo 1.22\n").unwrap();
    for (rel, content) in files {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

fn analyze(dir: &TempDir) -> ProjectReport {
    let service = AnalysisService::with_defaults();
    let pattern = format!("{}/...", dir.path().display());
    service.analyze_project(&pattern).unwrap()
}

fn package<'r>(report: &'r ProjectReport, path: &str) -> &'r PackageReport {
    report
        .packages
        .iter()
        .find(|p| p.path == path)
        .unwrap_or_else(|| panic!("package {path} missing from report"))
}

fn interface<'r>(pkg: &'r PackageReport, name: &str) -> &'r Interface {
    pkg.interfaces
        .iter()
        .find(|i| i.name == name)
        .unwrap_or_else(|| panic!("interface {name} missing from {}", pkg.path))
}

// Scenario E1: the empty abstraction is satisfied by every concrete
// named type, and never by an abstraction.
#[test]
fn empty_interface_satisfied_by_concrete_universe() {
    let dir = write_tree(&[(
        "demo.go",
        "package demo\n\
         \n\
         type EmptyInterface interface{}\n\
         \n\
         type First struct{}\n\
         type Second struct{}\n",
    )]);
    let report = analyze(&dir);
    let pkg = package(&report, "example.com/demo");
    let iface = interface(pkg, "EmptyInterface");
    assert!(iface.methods.is_empty());
    assert!(iface.embeds.is_empty());

    let names: Vec<&str> = iface
        .implementations
        .iter()
        .map(|i| i.type_name.as_str())
        .collect();
    assert!(names.contains(&"First"));
    assert!(names.contains(&"Second"));
    assert!(
        !names.contains(&"EmptyInterface"),
        "an abstraction is not a concrete type"
    );
}

// Scenario E2: embeds keep first-occurrence order; the extra method is
// the only method.
#[test]
fn embedding_interface_order_and_methods() {
    let dir = write_tree(&[(
        "demo.go",
        "package demo\n\
         \n\
         import \"io\"\n\
         \n\
         type EmptyInterface interface{}\n\
         \n\
         type EmbeddingInterface interface {\n\
         \tio.Reader\n\
         \tio.Writer\n\
         \tio.Closer\n\
         \tEmptyInterface\n\
         \tExtraMethod() string\n\
         }\n",
    )]);
    let report = analyze(&dir);
    let pkg = package(&report, "example.com/demo");
    let iface = interface(pkg, "EmbeddingInterface");
    assert_eq!(
        iface.embeds,
        vec!["io.Reader", "io.Writer", "io.Closer", "EmptyInterface"]
    );
    assert_eq!(iface.methods.len(), 1);
    assert_eq!(iface.methods[0].name, "ExtraMethod");
    assert_eq!(iface.methods[0].signature, "ExtraMethod() string");
    assert_eq!(iface.methods[0].return_types, vec!["string"]);
}

// Scenario E3: value- and pointer-satisfaction recorded independently;
// value methods are reachable through the pointer form.
#[test]
fn value_vs_pointer_satisfaction() {
    let dir = write_tree(&[(
        "demo.go",
        "package demo\n\
         \n\
         type InterfaceWithoutDocs interface { DoSomething() }\n\
         \n\
         type ConcreteType struct{}\n\
         \n\
         func (c ConcreteType) DoSomething() {}\n\
         \n\
         type PointerImplementer struct{}\n\
         \n\
         func (p *PointerImplementer) DoSomething() {}\n",
    )]);
    let report = analyze(&dir);
    let pkg = package(&report, "example.com/demo");
    let iface = interface(pkg, "InterfaceWithoutDocs");

    let mut forms: Vec<(&str, bool)> = iface
        .implementations
        .iter()
        .map(|i| (i.type_name.as_str(), i.is_pointer))
        .collect();
    forms.sort();
    assert_eq!(
        forms,
        vec![
            ("ConcreteType", false),
            ("ConcreteType", true),
            ("PointerImplementer", true),
        ]
    );
}

// Scenario E4: the four call flavors in source order with one caller.
#[test]
fn call_flavors_in_source_order() {
    let dir = write_tree(&[(
        "demo.go",
        "package demo\n\
         \n\
         type Doer interface { Do() }\n\
         \n\
         func helper() {}\n\
         \n\
         func cleanup() {}\n\
         \n\
         func Run(d Doer) {\n\
         \thelper()\n\
         \td.Do()\n\
         \tgo helper()\n\
         \tdefer cleanup()\n\
         }\n",
    )]);
    let report = analyze(&dir);
    let pkg = package(&report, "example.com/demo");
    let sites: Vec<_> = pkg
        .calls
        .iter()
        .filter(|c| c.caller_func_desc == "example.com/demo.Run")
        .collect();
    assert_eq!(sites.len(), 4);
    let flavors: Vec<CallType> = sites.iter().map(|s| s.call_type).collect();
    assert_eq!(
        flavors,
        vec![
            CallType::Static,
            CallType::Interface,
            CallType::ConcurrentSpawn,
            CallType::Deferred,
        ]
    );
    assert!(sites
        .iter()
        .all(|s| s.caller_func_desc == sites[0].caller_func_desc));
    let lines: Vec<u32> = sites.iter().map(|s| s.location.line).collect();
    assert!(lines.windows(2).all(|w| w[0] < w[1]), "source order: {lines:?}");
}

// Scenario E5: every filename is module-relative.
#[test]
fn path_relativization() {
    let dir = write_tree(&[(
        "pkg/a.go",
        "package pkg\n\
         \n\
         type Store interface { Get(key string) string }\n\
         \n\
         type MemStore struct{}\n\
         \n\
         func (m MemStore) Get(key string) string { return \"\" }\n\
         \n\
         func Use(s Store) { s.Get(\"k\") }\n",
    )]);
    let report = analyze(&dir);
    assert_eq!(report.module_dir, dir.path().to_string_lossy());
    let pkg = package(&report, "example.com/demo/pkg");
    assert_eq!(pkg.files, vec!["pkg/a.go"]);
    let iface = interface(pkg, "Store");
    assert_eq!(iface.location.filename, "pkg/a.go");
    for method in &iface.methods {
        assert_eq!(method.location.filename, "pkg/a.go");
    }
    for imp in &iface.implementations {
        assert_eq!(imp.location.filename, "pkg/a.go");
    }
    for call in &pkg.calls {
        assert_eq!(call.location.filename, "pkg/a.go");
    }
}

// Scenario E6: one concrete type satisfying two unrelated abstractions
// in different packages appears in both satisfier lists.
#[test]
fn multiple_satisfactions_across_packages() {
    let dir = write_tree(&[
        (
            "readers/readers.go",
            "package readers\n\ntype Named interface { Name() string }\n",
        ),
        (
            "writers/writers.go",
            "package writers\n\ntype Sized interface { Size() int }\n",
        ),
        (
            "impl/impl.go",
            "package impl\n\
             \n\
             type Both struct{}\n\
             \n\
             func (b Both) Name() string { return \"\" }\n\
             \n\
             func (b Both) Size() int { return 0 }\n",
        ),
    ]);
    let report = analyze(&dir);
    let named = interface(package(&report, "example.com/demo/readers"), "Named");
    let sized = interface(package(&report, "example.com/demo/writers"), "Sized");

    let in_named = named
        .implementations
        .iter()
        .find(|i| i.type_name == "Both" && !i.is_pointer)
        .expect("Both satisfies Named");
    let in_sized = sized
        .implementations
        .iter()
        .find(|i| i.type_name == "Both" && !i.is_pointer)
        .expect("Both satisfies Sized");
    // Byte-equal records apart from the owning abstraction.
    assert_eq!(in_named, in_sized);
    assert_eq!(in_named.package_path, "example.com/demo/impl");
}

// Determinism: two runs over an unchanged tree serialize identically.
#[test]
fn repeated_analysis_is_deterministic() {
    let dir = write_tree(&[
        (
            "a/a.go",
            "package a\n\
             \n\
             type Alpha interface { A() }\n\
             type Beta interface { B() }\n\
             \n\
             type Impl struct{}\n\
             func (i Impl) A() {}\n\
             func (i Impl) B() {}\n\
             \n\
             func Work(x Alpha) {\n\
             \tx.A()\n\
             \tgo func() { x.A() }()\n\
             }\n",
        ),
        (
            "b/b.go",
            "package b\n\
             \n\
             type Gamma interface { C() }\n\
             \n\
             func Helper() {}\n\
             \n\
             func Drive() {\n\
             \tHelper()\n\
             \tdefer Helper()\n\
             }\n",
        ),
    ]);
    let first = serde_json::to_string(&analyze(&dir)).unwrap();
    let second = serde_json::to_string(&analyze(&dir)).unwrap();
    assert_eq!(first, second);
}

// Adding an unrelated file changes only the enclosing package's file
// list.
#[test]
fn unrelated_file_only_extends_file_list() {
    let dir = write_tree(&[(
        "demo.go",
        "package demo\n\
         \n\
         type I interface { M() }\n\
         \n\
         type T struct{}\n\
         func (t T) M() {}\n",
    )]);
    let before = analyze(&dir);

    fs::write(
        dir.path().join("extra.go"),
        "package demo\n\nconst unrelated = 1\n",
    )
    .unwrap();
    let after = analyze(&dir);

    let before_pkg = package(&before, "example.com/demo");
    let after_pkg = package(&after, "example.com/demo");
    assert_eq!(
        after_pkg.files,
        vec!["demo.go".to_string(), "extra.go".to_string()]
    );
    assert_eq!(before_pkg.interfaces, after_pkg.interfaces);
    assert_eq!(before_pkg.calls, after_pkg.calls);
    assert_eq!(before_pkg.imports, after_pkg.imports);
}

// Universal invariants 1 and 2: satisfier and call positions refer to
// files listed by their owning packages.
#[test]
fn positions_refer_to_listed_files() {
    let dir = write_tree(&[
        (
            "core/core.go",
            "package core\n\
             \n\
             type Runner interface { Run() error }\n",
        ),
        (
            "jobs/jobs.go",
            "package jobs\n\
             \n\
             import \"example.com/demo/core\"\n\
             \n\
             type Job struct{}\n\
             \n\
             func (j Job) Run() error { return nil }\n\
             \n\
             func Drive(r core.Runner) {\n\
             \tr.Run()\n\
             }\n",
        ),
    ]);
    let report = analyze(&dir);
    for pkg in &report.packages {
        for call in &pkg.calls {
            assert!(
                pkg.files.contains(&call.location.filename),
                "call location {} not in {:?}",
                call.location.filename,
                pkg.files
            );
        }
    }
    let runner = interface(package(&report, "example.com/demo/core"), "Runner");
    for imp in &runner.implementations {
        let owner = package(&report, &imp.package_path);
        assert!(
            owner.files.contains(&imp.location.filename),
            "satisfier location {} not in {:?}",
            imp.location.filename,
            owner.files
        );
    }
}

// Cross-package interface dispatch and static calls render with
// path-qualified names.
#[test]
fn cross_package_call_descriptions() {
    let dir = write_tree(&[
        (
            "core/core.go",
            "package core\n\
             \n\
             type Runner interface { Run() error }\n\
             \n\
             func Spawn() {}\n",
        ),
        (
            "jobs/jobs.go",
            "package jobs\n\
             \n\
             import \"example.com/demo/core\"\n\
             \n\
             func Drive(r core.Runner) {\n\
             \tr.Run()\n\
             \tcore.Spawn()\n\
             }\n",
        ),
    ]);
    let report = analyze(&dir);
    let jobs = package(&report, "example.com/demo/jobs");
    let descs: Vec<&str> = jobs.calls.iter().map(|c| c.callee_desc.as_str()).collect();
    assert!(descs.contains(&"Interface method Run on example.com/demo/core.Runner"));
    assert!(descs.contains(&"example.com/demo/core.Spawn"));
}

// JSON-level invariants: no Column keys, omitted empties, PascalCase.
#[test]
fn serialized_report_honors_field_contract() {
    let dir = write_tree(&[(
        "demo.go",
        "package demo\n\
         \n\
         type I interface { M() }\n\
         \n\
         type T struct{}\n\
         func (t T) M() {}\n\
         \n\
         func Use(i I) { i.M() }\n",
    )]);
    let value = serde_json::to_value(analyze(&dir)).unwrap();
    let text = value.to_string();
    assert!(!text.contains("\"Column\""));
    assert!(value.get("ModulePath").is_some());
    assert!(value.get("ModuleDir").is_some());
    let packages = value["Packages"].as_array().unwrap();
    for pkg in packages {
        assert!(pkg.get("Name").is_some());
        assert!(pkg.get("Path").is_some());
        assert!(pkg.get("Files").is_some());
        assert!(pkg.get("Imports").is_some());
        assert!(pkg.get("Interfaces").is_some());
        // Empty embed lists are omitted entirely.
        assert!(pkg.get("EmbedFiles").is_none());
        assert!(pkg.get("EmbedPatterns").is_none());
        if let Some(calls) = pkg.get("Calls") {
            assert!(!calls.as_array().unwrap().is_empty());
        }
    }
}

// A module with no Go files at all is a loader failure, not an empty
// report.
#[test]
fn empty_module_fails_to_load() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("go.mod"), "module example.com/empty\n").unwrap();
    let service = AnalysisService::with_defaults();
    let result = service.analyze_project(&dir.path().to_string_lossy());
    assert!(result.is_err());
}

// Test packages participate: satisfaction is interesting for them too.
#[test]
fn test_files_are_included() {
    let dir = write_tree(&[
        (
            "demo.go",
            "package demo\n\ntype I interface { M() }\n",
        ),
        (
            "demo_test.go",
            "package demo\n\ntype TestDouble struct{}\n\nfunc (t TestDouble) M() {}\n",
        ),
    ]);
    let report = analyze(&dir);
    let iface = interface(package(&report, "example.com/demo"), "I");
    assert!(iface
        .implementations
        .iter()
        .any(|i| i.type_name == "TestDouble"));
}

// Nonexistent directories surface the loader failure.
#[test]
fn missing_directory_is_fatal() {
    assert!(!Path::new("/definitely/missing/goscope-test").exists());
    let service = AnalysisService::with_defaults();
    assert!(service
        .analyze_project("/definitely/missing/goscope-test")
        .is_err());
}
