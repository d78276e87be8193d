// src/loader/manifest.rs
//! Module manifest (go.mod) discovery and parsing.

use crate::errors::LoadError;
use std::path::{Path, PathBuf};

/// Parsed module manifest metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Module path from the `module` directive.
    pub module_path: String,
    /// Directory containing the manifest.
    pub dir: PathBuf,
    /// Path of the manifest file itself.
    pub file: PathBuf,
    /// Declared language version, when present.
    pub go_version: Option<String>,
}

/// Walk upward from `start` until a `go.mod` is found.
pub fn find_manifest(start: &Path) -> Result<Manifest, LoadError> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join("go.mod");
        if candidate.is_file() {
            return parse_manifest(&candidate);
        }
        dir = current.parent();
    }
    Err(LoadError::ManifestNotFound {
        path: start.to_path_buf(),
    })
}

/// Parse a manifest file. Only the `module` and `go` directives matter.
pub fn parse_manifest(path: &Path) -> Result<Manifest, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut module_path = String::new();
    let mut go_version = None;
    for line in content.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("module ") {
            module_path = rest.trim().trim_matches('"').to_string();
        } else if let Some(rest) = line.strip_prefix("go ") {
            go_version = Some(rest.trim().to_string());
        }
    }
    if module_path.is_empty() {
        return Err(LoadError::ManifestNotFound {
            path: path.to_path_buf(),
        });
    }
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(Manifest {
        module_path,
        dir,
        file: path.to_path_buf(),
        go_version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parses_module_and_go_directives() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("go.mod");
        fs::write(&path, "module example.com/acme/tool\n\ngo 1.22\n").unwrap();
        let manifest = parse_manifest(&path).unwrap();
        assert_eq!(manifest.module_path, "example.com/acme/tool");
        assert_eq!(manifest.go_version.as_deref(), Some("1.22"));
        assert_eq!(manifest.dir, dir.path());
    }

    #[test]
    fn finds_manifest_in_parent() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/m\n").unwrap();
        let nested = dir.path().join("internal").join("deep");
        fs::create_dir_all(&nested).unwrap();
        let manifest = find_manifest(&nested).unwrap();
        assert_eq!(manifest.module_path, "example.com/m");
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = find_manifest(dir.path());
        assert!(matches!(result, Err(LoadError::ManifestNotFound { .. })));
    }

    #[test]
    fn manifest_without_module_directive_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("go.mod");
        fs::write(&path, "go 1.21\n").unwrap();
        assert!(parse_manifest(&path).is_err());
    }
}
