// src/loader/mod.rs
//! Package loading: turns a directory path into parsed, checked packages.
//!
//! `DirLoader` is the production implementation of the `PackageLoader`
//! capability: it normalizes the requested path (including the `/...`
//! recursive-descent suffix), discovers package directories under the
//! module root, parses and checks each package, and filters out packages
//! that carry neither type information nor a clean parse.

pub mod manifest;

pub use manifest::{find_manifest, parse_manifest, Manifest};

use crate::errors::{LoadError, ParseError};
use crate::frontend::ast::{Decl, File};
use crate::frontend::Parser;
use crate::sema::{check_package, PackageInfo};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What the loader is asked to populate, mirroring the external loader's
/// request-flag style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadMode(u32);

impl LoadMode {
    pub const NAME: LoadMode = LoadMode(1 << 0);
    pub const FILES: LoadMode = LoadMode(1 << 1);
    pub const COMPILED_FILES: LoadMode = LoadMode(1 << 2);
    pub const IMPORTS: LoadMode = LoadMode(1 << 3);
    pub const DEPS: LoadMode = LoadMode(1 << 4);
    pub const TYPES: LoadMode = LoadMode(1 << 5);
    pub const SYNTAX: LoadMode = LoadMode(1 << 6);
    pub const TYPES_INFO: LoadMode = LoadMode(1 << 7);
    pub const TYPES_SIZES: LoadMode = LoadMode(1 << 8);
    pub const MODULE: LoadMode = LoadMode(1 << 9);
    pub const EMBED_FILES: LoadMode = LoadMode(1 << 10);
    pub const EMBED_PATTERNS: LoadMode = LoadMode(1 << 11);

    /// Everything the analyses need.
    pub fn analysis_default() -> LoadMode {
        LoadMode::NAME
            | LoadMode::FILES
            | LoadMode::COMPILED_FILES
            | LoadMode::IMPORTS
            | LoadMode::DEPS
            | LoadMode::TYPES
            | LoadMode::SYNTAX
            | LoadMode::TYPES_INFO
            | LoadMode::TYPES_SIZES
            | LoadMode::MODULE
            | LoadMode::EMBED_FILES
            | LoadMode::EMBED_PATTERNS
    }

    pub fn contains(self, other: LoadMode) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for LoadMode {
    type Output = LoadMode;
    fn bitor(self, rhs: LoadMode) -> LoadMode {
        LoadMode(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub mode: LoadMode,
    /// Include test files and external test packages.
    pub tests: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            mode: LoadMode::analysis_default(),
            tests: true,
        }
    }
}

/// One loaded package.
#[derive(Debug, Clone)]
pub struct Package {
    /// Package clause name.
    pub name: String,
    pub import_path: String,
    pub dir: PathBuf,
    /// Absolute source file paths, sorted.
    pub files: Vec<PathBuf>,
    /// Imported package paths, sorted and deduplicated.
    pub imports: Vec<String>,
    pub syntax: Vec<File>,
    pub info: PackageInfo,
    pub errors: Vec<ParseError>,
    /// Files matched by `go:embed` directives, package-relative.
    pub embed_files: Vec<String>,
    /// Raw `go:embed` patterns.
    pub embed_patterns: Vec<String>,
    pub manifest: Option<Manifest>,
}

impl Package {
    /// A package participates in analysis only with a populated scope,
    /// usable type info, and at least one syntax tree.
    pub fn is_analyzable(&self) -> bool {
        !self.info.scope.is_empty() && self.info.has_type_info() && !self.syntax.is_empty()
    }
}

/// Capability boundary over package loading; tests substitute plain
/// values.
pub trait PackageLoader {
    fn load(&self, path: &str) -> Result<Vec<Package>, LoadError>;
}

/// Production loader rooted in the filesystem.
#[derive(Debug, Default)]
pub struct DirLoader {
    pub config: LoadConfig,
}

impl DirLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PackageLoader for DirLoader {
    fn load(&self, path: &str) -> Result<Vec<Package>, LoadError> {
        let (root, recursive) = normalize_pattern(path);
        let root = PathBuf::from(root);
        if !root.is_dir() {
            return Err(LoadError::DirectoryNotFound { path: root });
        }
        let manifest = find_manifest(&root)?;
        debug!(module = %manifest.module_path, dir = %manifest.dir.display(), "resolved module manifest");

        let mut dirs = Vec::new();
        if recursive {
            collect_package_dirs(&root, &mut dirs)?;
        } else {
            dirs.push(root.clone());
        }
        dirs.sort();

        let mut packages = Vec::new();
        for dir in dirs {
            packages.extend(self.load_dir(&dir, &manifest)?);
        }

        // Keep packages that have type info or at least parsed cleanly.
        let mut packages: Vec<Package> = packages
            .into_iter()
            .filter(|pkg| {
                let keep = pkg.info.has_type_info() || pkg.errors.is_empty();
                if !keep {
                    warn!(
                        package = %pkg.import_path,
                        errors = pkg.errors.len(),
                        "skipping package with critical loading errors"
                    );
                }
                keep
            })
            .collect();
        if packages.is_empty() {
            return Err(LoadError::NoPackages {
                path: PathBuf::from(path),
            });
        }
        packages.sort_by(|a, b| a.import_path.cmp(&b.import_path));
        Ok(packages)
    }
}

impl DirLoader {
    /// Load the package(s) in one directory. A directory can hold both a
    /// primary package and an external test package (`name_test`).
    fn load_dir(&self, dir: &Path, manifest: &Manifest) -> Result<Vec<Package>, LoadError> {
        let mut go_files: Vec<PathBuf> = Vec::new();
        let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !file_name.ends_with(".go")
                || file_name.starts_with('.')
                || file_name.starts_with('_')
            {
                continue;
            }
            if !self.config.tests && file_name.ends_with("_test.go") {
                continue;
            }
            if path.is_file() {
                go_files.push(path);
            }
        }
        if go_files.is_empty() {
            return Ok(Vec::new());
        }
        go_files.sort();

        let import_path = import_path_for(dir, manifest);

        // Parse every file, then group by package clause: in-package test
        // files merge with the primary package, `name_test` files form an
        // external test package.
        let mut parsed: Vec<(PathBuf, File, Vec<ParseError>)> = Vec::new();
        for path in &go_files {
            let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            let (file, errors) = Parser::parse_file(&source, path.clone());
            parsed.push((path.clone(), file, errors));
        }

        let mut group_names: Vec<String> = Vec::new();
        for (_, file, _) in &parsed {
            if !group_names.contains(&file.package.name) {
                group_names.push(file.package.name.clone());
            }
        }
        group_names.sort();

        let mut packages = Vec::new();
        for group in group_names {
            if group.is_empty() {
                continue;
            }
            let in_group: Vec<&(PathBuf, File, Vec<ParseError>)> = parsed
                .iter()
                .filter(|(_, file, _)| file.package.name == group)
                .collect();
            let is_xtest = group.ends_with("_test");
            if is_xtest && !self.config.tests {
                continue;
            }
            let group_path = if is_xtest {
                format!("{}_test", import_path)
            } else {
                import_path.clone()
            };

            let files: Vec<PathBuf> = in_group.iter().map(|(p, _, _)| p.clone()).collect();
            let syntax: Vec<File> = in_group.iter().map(|(_, f, _)| f.clone()).collect();
            let errors: Vec<ParseError> = in_group
                .iter()
                .flat_map(|(_, _, e)| e.iter().cloned())
                .collect();

            let info = if self.config.mode.contains(LoadMode::TYPES) {
                check_package(&group_path, &syntax)
            } else {
                PackageInfo::default()
            };

            let mut imports: Vec<String> = syntax
                .iter()
                .flat_map(|f| f.imports.iter().map(|i| i.path.clone()))
                .collect();
            imports.sort();
            imports.dedup();

            let (embed_patterns, embed_files) =
                if self.config.mode.contains(LoadMode::EMBED_PATTERNS) {
                    collect_embeds(dir, &syntax)
                } else {
                    (Vec::new(), Vec::new())
                };

            packages.push(Package {
                name: group.clone(),
                import_path: group_path,
                dir: dir.to_path_buf(),
                files,
                imports,
                syntax,
                info,
                errors,
                embed_files,
                embed_patterns,
                manifest: Some(manifest.clone()),
            });
        }
        Ok(packages)
    }
}

/// Strip a trailing separator; split off the `/...` recursive suffix.
pub fn normalize_pattern(path: &str) -> (String, bool) {
    let mut normalized = path.to_string();
    while normalized.len() > 1 && normalized.ends_with(std::path::MAIN_SEPARATOR) {
        normalized.pop();
    }
    let suffix = format!("{}...", std::path::MAIN_SEPARATOR);
    if let Some(root) = normalized.strip_suffix(&suffix) {
        let root = if root.is_empty() { "." } else { root };
        (root.to_string(), true)
    } else {
        (normalized, false)
    }
}

fn import_path_for(dir: &Path, manifest: &Manifest) -> String {
    match dir.strip_prefix(&manifest.dir) {
        Ok(rel) if rel.as_os_str().is_empty() => manifest.module_path.clone(),
        Ok(rel) => {
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            format!("{}/{}", manifest.module_path, rel)
        }
        Err(_) => manifest.module_path.clone(),
    }
}

/// Recursively collect directories that may hold packages, skipping
/// hidden, underscore, `testdata` and `vendor` directories.
fn collect_package_dirs(root: &Path, out: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    out.push(root.to_path_buf());
    let entries = std::fs::read_dir(root).map_err(|source| LoadError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    let mut children: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    children.sort();
    for child in children {
        let Some(name) = child.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.')
            || name.starts_with('_')
            || name == "testdata"
            || name == "vendor"
        {
            continue;
        }
        collect_package_dirs(&child, out)?;
    }
    Ok(())
}

/// Gather `go:embed` patterns from var declarations and resolve them to
/// package-relative files.
fn collect_embeds(dir: &Path, syntax: &[File]) -> (Vec<String>, Vec<String>) {
    let mut patterns = Vec::new();
    for file in syntax {
        for decl in &file.decls {
            if let Decl::Var(var_decl) = decl {
                for directive in &var_decl.directives {
                    if let Some(rest) = directive.strip_prefix("go:embed") {
                        for pattern in rest.split_whitespace() {
                            if !patterns.contains(&pattern.to_string()) {
                                patterns.push(pattern.to_string());
                            }
                        }
                    }
                }
            }
        }
    }
    let mut files = Vec::new();
    for pattern in &patterns {
        resolve_embed_pattern(dir, pattern, &mut files);
    }
    files.sort();
    files.dedup();
    (patterns, files)
}

fn resolve_embed_pattern(dir: &Path, pattern: &str, out: &mut Vec<String>) {
    if let Some(prefix) = pattern.strip_suffix("/*").or_else(|| pattern.strip_suffix('*')) {
        let base = dir.join(prefix);
        let scan_dir = if base.is_dir() {
            base
        } else {
            match base.parent() {
                Some(parent) => parent.to_path_buf(),
                None => return,
            }
        };
        if let Ok(entries) = std::fs::read_dir(&scan_dir) {
            let mut names: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
            names.sort();
            for path in names {
                if path.is_file() {
                    if let Ok(rel) = path.strip_prefix(dir) {
                        out.push(rel.to_string_lossy().replace('\\', "/"));
                    }
                }
            }
        }
        return;
    }
    let target = dir.join(pattern);
    if target.is_file() {
        out.push(pattern.to_string());
    } else if target.is_dir() {
        collect_files_under(&target, dir, out);
    }
}

fn collect_files_under(current: &Path, base: &Path, out: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(current) else {
        return;
    };
    let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
    paths.sort();
    for path in paths {
        if path.is_dir() {
            collect_files_under(&path, base, out);
        } else if let Ok(rel) = path.strip_prefix(base) {
            out.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_module(dir: &Path, module: &str) {
        fs::write(dir.join("go.mod"), format!("module {}\n\ngo 1.22\n", module)).unwrap();
    }

    fn write_file(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn normalize_strips_recursive_suffix() {
        let (root, recursive) = normalize_pattern("/proj/mod/...");
        assert_eq!(root, "/proj/mod");
        assert!(recursive);
        let (root, recursive) = normalize_pattern("/proj/mod/");
        assert_eq!(root, "/proj/mod");
        assert!(!recursive);
    }

    #[test]
    fn loads_packages_recursively() {
        let dir = TempDir::new().unwrap();
        write_module(dir.path(), "example.com/m");
        write_file(dir.path(), "a.go", "package m\n\nfunc A() {}\n");
        write_file(dir.path(), "sub/b.go", "package sub\n\nfunc B() {}\n");
        write_file(
            dir.path(),
            "testdata/skip.go",
            "package skip\n\nfunc S() {}\n",
        );

        let loader = DirLoader::new();
        let pattern = format!("{}/...", dir.path().display());
        let packages = loader.load(&pattern).unwrap();
        let paths: Vec<&str> = packages.iter().map(|p| p.import_path.as_str()).collect();
        assert_eq!(paths, vec!["example.com/m", "example.com/m/sub"]);
    }

    #[test]
    fn non_recursive_load_is_single_dir() {
        let dir = TempDir::new().unwrap();
        write_module(dir.path(), "example.com/m");
        write_file(dir.path(), "a.go", "package m\n\nfunc A() {}\n");
        write_file(dir.path(), "sub/b.go", "package sub\n\nfunc B() {}\n");

        let loader = DirLoader::new();
        let packages = loader.load(&dir.path().to_string_lossy()).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].import_path, "example.com/m");
    }

    #[test]
    fn missing_directory_fails() {
        let loader = DirLoader::new();
        assert!(matches!(
            loader.load("/definitely/not/here"),
            Err(LoadError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn external_test_package_splits_off() {
        let dir = TempDir::new().unwrap();
        write_module(dir.path(), "example.com/m");
        write_file(dir.path(), "a.go", "package m\n\nfunc A() {}\n");
        write_file(
            dir.path(),
            "a_test.go",
            "package m_test\n\nfunc TestA() {}\n",
        );

        let loader = DirLoader::new();
        let packages = loader.load(&dir.path().to_string_lossy()).unwrap();
        assert_eq!(packages.len(), 2);
        assert!(packages.iter().any(|p| p.name == "m_test"));
    }

    #[test]
    fn tests_excluded_when_disabled() {
        let dir = TempDir::new().unwrap();
        write_module(dir.path(), "example.com/m");
        write_file(dir.path(), "a.go", "package m\n\nfunc A() {}\n");
        write_file(
            dir.path(),
            "a_test.go",
            "package m_test\n\nfunc TestA() {}\n",
        );

        let loader = DirLoader {
            config: LoadConfig {
                tests: false,
                ..LoadConfig::default()
            },
        };
        let packages = loader.load(&dir.path().to_string_lossy()).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "m");
    }

    #[test]
    fn embed_patterns_collected() {
        let dir = TempDir::new().unwrap();
        write_module(dir.path(), "example.com/m");
        write_file(dir.path(), "static/app.css", "body{}");
        write_file(
            dir.path(),
            "a.go",
            "package m\n\n//go:embed static/*\nvar content string\n",
        );

        let loader = DirLoader::new();
        let packages = loader.load(&dir.path().to_string_lossy()).unwrap();
        assert_eq!(packages[0].embed_patterns, vec!["static/*"]);
        assert_eq!(packages[0].embed_files, vec!["static/app.css"]);
    }

    #[test]
    fn imports_are_sorted_and_deduped() {
        let dir = TempDir::new().unwrap();
        write_module(dir.path(), "example.com/m");
        write_file(
            dir.path(),
            "a.go",
            "package m\n\nimport (\n\t\"strings\"\n\t\"fmt\"\n)\n\nvar _ = fmt.Sprint\nvar _ = strings.TrimSpace\n",
        );
        write_file(
            dir.path(),
            "b.go",
            "package m\n\nimport \"fmt\"\n\nvar _ = fmt.Sprintln\n",
        );

        let loader = DirLoader::new();
        let packages = loader.load(&dir.path().to_string_lossy()).unwrap();
        assert_eq!(packages[0].imports, vec!["fmt", "strings"]);
    }
}
