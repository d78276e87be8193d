// src/analysis/interfaces.rs
//! Interface extraction: walks syntax trees and emits one abstraction
//! record per interface type declaration, with methods, docs and embeds.

use crate::datamodel::{Interface, Location, Method};
use crate::errors::AnalysisError;
use crate::frontend::ast::*;
use crate::loader::Package;
use crate::analysis::format::{self, FmtCtx};
use rustc_hash::FxHashMap;
use tracing::warn;

/// Primary key of an abstraction: defining package path plus name.
pub type InterfaceKey = (String, String);

/// Capability boundary: interface extraction.
pub trait InterfaceAnalyzer {
    fn analyze_interfaces(
        &self,
        packages: &[Package],
    ) -> Result<FxHashMap<InterfaceKey, Interface>, AnalysisError>;
}

/// AST-driven extractor.
#[derive(Debug, Default)]
pub struct AstInterfaceAnalyzer;

impl AstInterfaceAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl InterfaceAnalyzer for AstInterfaceAnalyzer {
    fn analyze_interfaces(
        &self,
        packages: &[Package],
    ) -> Result<FxHashMap<InterfaceKey, Interface>, AnalysisError> {
        let mut interfaces = FxHashMap::default();
        for pkg in packages {
            if !pkg.is_analyzable() {
                warn!(
                    package = %pkg.import_path,
                    "skipping package for interface analysis: missing types, syntax, or scope"
                );
                continue;
            }
            for (file_idx, file) in pkg.syntax.iter().enumerate() {
                let ctx = FmtCtx {
                    pkg_path: &pkg.import_path,
                    info: &pkg.info,
                    file: file_idx,
                };
                for decl in &file.decls {
                    let Decl::Type(type_decl) = decl else { continue };
                    for spec in &type_decl.specs {
                        extract_spec(pkg, file, &ctx, spec, &mut interfaces);
                    }
                }
            }
        }
        Ok(interfaces)
    }
}

fn extract_spec(
    pkg: &Package,
    file: &File,
    ctx: &FmtCtx<'_>,
    spec: &TypeSpec,
    interfaces: &mut FxHashMap<InterfaceKey, Interface>,
) {
    if spec.name.name.is_empty() {
        return;
    }
    let TypeExprKind::Interface(elems) = &spec.ty.unparen().kind else {
        return;
    };
    // The definition must exist in the type info and resolve to an
    // interface; a name the checker does not know is skipped.
    let Some(def) = pkg.info.named_types.get(&spec.name.name) else {
        warn!(
            name = %spec.name.name,
            package = %pkg.import_path,
            "no type definition recorded for interface spec, skipping"
        );
        return;
    };
    if !def.is_interface() {
        return;
    }

    let mut iface = Interface {
        name: spec.name.name.clone(),
        package_name: pkg.name.clone(),
        package_path: pkg.import_path.clone(),
        location: Location {
            filename: file.path.to_string_lossy().into_owned(),
            line: spec.name.span.line,
        },
        doc_comment: spec.doc.clone(),
        methods: Vec::new(),
        embeds: Vec::new(),
        implementations: Vec::new(),
    };

    for field in elems {
        if field.names.is_empty() {
            // Embedded interface: render and dedup by exact display.
            let display = format::type_display(&field.ty, ctx);
            if !display.is_empty() && display != "?" && !iface.embeds.contains(&display) {
                iface.embeds.push(display);
            }
            continue;
        }
        for name in &field.names {
            let mut method = Method {
                name: name.name.clone(),
                signature: String::new(),
                parameters: Vec::new(),
                return_types: Vec::new(),
                doc_comment: field.doc.clone(),
                location: Location {
                    filename: file.path.to_string_lossy().into_owned(),
                    line: field.span.line,
                },
            };
            match &field.ty.kind {
                TypeExprKind::Func(sig) => {
                    method.signature = format::method_signature(&name.name, sig, ctx);
                    method.parameters = format::parameters(sig, ctx);
                    method.return_types = format::return_types(sig, ctx);
                }
                _ => {
                    warn!(
                        method = %name.name,
                        interface = %iface.name,
                        package = %pkg.import_path,
                        kind = %field.ty.kind_name(),
                        "interface method has a non-function type"
                    );
                    method.signature =
                        format!("{}(...) // Analysis Error: Non-FuncType", name.name);
                }
            }
            iface.methods.push(method);
        }
    }

    let key = (pkg.import_path.clone(), iface.name.clone());
    if interfaces.contains_key(&key) {
        warn!(
            interface = %format!("{}.{}", key.0, key.1),
            "duplicate interface definition encountered, keeping first"
        );
        return;
    }
    interfaces.insert(key, iface);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{DirLoader, PackageLoader};
    use std::fs;
    use tempfile::TempDir;

    fn analyze(source: &str) -> FxHashMap<InterfaceKey, Interface> {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/m\n").unwrap();
        fs::write(dir.path().join("demo.go"), source).unwrap();
        let packages = DirLoader::new()
            .load(&dir.path().to_string_lossy())
            .unwrap();
        AstInterfaceAnalyzer::new()
            .analyze_interfaces(&packages)
            .unwrap()
    }

    fn key(name: &str) -> InterfaceKey {
        ("example.com/m".to_string(), name.to_string())
    }

    #[test]
    fn extracts_empty_interface() {
        let interfaces = analyze("package m\n\ntype EmptyInterface interface{}\n");
        let iface = &interfaces[&key("EmptyInterface")];
        assert!(iface.methods.is_empty());
        assert!(iface.embeds.is_empty());
        assert_eq!(iface.package_name, "m");
        assert_eq!(iface.location.line, 3);
    }

    #[test]
    fn doc_comments_and_method_docs() {
        let interfaces = analyze(
            "package m\n\n// Store persists items.\ntype Store interface {\n\t// Put writes one item.\n\tPut(key string) error\n}\n",
        );
        let iface = &interfaces[&key("Store")];
        assert_eq!(iface.doc_comment, "Store persists items.");
        assert_eq!(iface.methods.len(), 1);
        assert_eq!(iface.methods[0].doc_comment, "Put writes one item.");
        assert_eq!(iface.methods[0].signature, "Put(key string) error");
    }

    #[test]
    fn embeds_preserve_order_and_dedup() {
        let interfaces = analyze(
            "package m\n\ntype EmptyInterface interface{}\n\ntype EmbeddingInterface interface {\n\tio.Reader\n\tio.Writer\n\tio.Closer\n\tEmptyInterface\n\tio.Reader\n\tExtraMethod() string\n}\n",
        );
        let iface = &interfaces[&key("EmbeddingInterface")];
        assert_eq!(
            iface.embeds,
            vec!["io.Reader", "io.Writer", "io.Closer", "EmptyInterface"]
        );
        assert_eq!(iface.methods.len(), 1);
        assert_eq!(iface.methods[0].name, "ExtraMethod");
        assert_eq!(iface.methods[0].signature, "ExtraMethod() string");
    }

    #[test]
    fn non_interface_types_are_ignored() {
        let interfaces = analyze(
            "package m\n\ntype Plain struct{}\n\ntype Alias = struct{ X int }\n",
        );
        assert!(interfaces.is_empty());
    }

    #[test]
    fn methods_keep_source_order() {
        let interfaces = analyze(
            "package m\n\ntype Seq interface {\n\tZebra()\n\tAardvark()\n\tMiddle()\n}\n",
        );
        let iface = &interfaces[&key("Seq")];
        let names: Vec<&str> = iface.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Zebra", "Aardvark", "Middle"]);
    }
}
