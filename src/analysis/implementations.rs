// src/analysis/implementations.rs
//! Satisfaction discovery: for every named concrete type in the loaded
//! universe, decide value- and pointer-satisfaction against each known
//! interface and attach the type's definition location, translated
//! through the shared position table.

use crate::analysis::interfaces::InterfaceKey;
use crate::datamodel::{Implementation, Interface, Location};
use crate::errors::AnalysisError;
use crate::flow::PositionTable;
use crate::loader::Package;
use crate::sema::{NamedRef, SatisfyCtx, SymbolKind, Universe};
use rustc_hash::FxHashMap;
use tracing::warn;

/// Capability boundary: satisfaction discovery. Populates each
/// interface's implementation list in place; existing entries stay.
pub trait ImplementationFinder {
    fn find_implementations(
        &self,
        packages: &[Package],
        interfaces: &mut FxHashMap<InterfaceKey, Interface>,
        universe: &Universe<'_>,
        positions: Option<&PositionTable>,
    ) -> Result<(), AnalysisError>;
}

/// Finder backed by the method-set satisfaction predicate.
#[derive(Debug, Default)]
pub struct TypeBasedImplementationFinder;

impl TypeBasedImplementationFinder {
    pub fn new() -> Self {
        Self
    }
}

impl ImplementationFinder for TypeBasedImplementationFinder {
    fn find_implementations(
        &self,
        packages: &[Package],
        interfaces: &mut FxHashMap<InterfaceKey, Interface>,
        universe: &Universe<'_>,
        positions: Option<&PositionTable>,
    ) -> Result<(), AnalysisError> {
        if positions.is_none() {
            warn!("no position table provided; implementation locations may be inaccurate");
        }
        let ctx = SatisfyCtx::new(universe);

        // Map each extracted interface to its named type, via the
        // defining package's scope.
        let mut targets: Vec<(NamedRef, InterfaceKey)> = Vec::new();
        let mut keys: Vec<&InterfaceKey> = interfaces.keys().collect();
        keys.sort();
        for key in keys {
            let (pkg_path, name) = key;
            let Some(pkg) = packages.iter().find(|p| &p.import_path == pkg_path) else {
                warn!(
                    interface = %format!("{}.{}", pkg_path, name),
                    "defining package not loaded; skipping implementation checks"
                );
                continue;
            };
            let Some(symbol) = pkg.info.scope.lookup(name) else {
                warn!(
                    interface = %format!("{}.{}", pkg_path, name),
                    "interface name not found in package scope"
                );
                continue;
            };
            if symbol.kind != SymbolKind::Type {
                warn!(
                    interface = %format!("{}.{}", pkg_path, name),
                    "looked-up symbol is not a type name"
                );
                continue;
            }
            let named = NamedRef::new(pkg_path.clone(), name.clone());
            if ctx.interface_method_set(&named).is_none() {
                warn!(
                    interface = %format!("{}.{}", pkg_path, name),
                    "interface method set is incomplete; skipping implementation checks"
                );
                continue;
            }
            targets.push((named, key.clone()));
        }

        for pkg in packages {
            if !pkg.is_analyzable() {
                continue;
            }
            for name in pkg.info.scope.names() {
                let Some(symbol) = pkg.info.scope.lookup(name) else {
                    continue;
                };
                if symbol.kind != SymbolKind::Type {
                    continue;
                }
                let candidate = NamedRef::new(pkg.import_path.clone(), name);
                for (iface_ty, key) in &targets {
                    let value_ok = ctx.implements(&candidate, false, iface_ty);
                    let pointer_ok = ctx.implements(&candidate, true, iface_ty);
                    if !value_ok && !pointer_ok {
                        continue;
                    }
                    let Some(location) = locate(pkg, name, positions) else {
                        warn!(
                            ty = %format!("{}.{}", candidate.pkg, candidate.name),
                            interface = %format!("{}.{}", key.0, key.1),
                            "skipping implementation with no resolvable location"
                        );
                        continue;
                    };
                    let Some(iface) = interfaces.get_mut(key) else {
                        continue;
                    };
                    if value_ok {
                        add_implementation(iface, pkg, name, false, location.clone());
                    }
                    if pointer_ok {
                        add_implementation(iface, pkg, name, true, location);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Definition location of a named type: the type-spec name identifier,
/// through the position table when available.
fn locate(pkg: &Package, name: &str, positions: Option<&PositionTable>) -> Option<Location> {
    let def = pkg.info.named_types.get(name)?;
    let file = pkg.syntax.get(def.file)?;
    if def.name_span.line == 0 {
        return None;
    }
    match positions {
        Some(table) => {
            let pos = table.translate(&file.path, def.name_span.line)?;
            Some(Location {
                filename: pos.filename.to_string_lossy().into_owned(),
                line: pos.line,
            })
        }
        None => {
            warn!(
                ty = %name,
                "locating implementation without the shared position table"
            );
            Some(Location {
                filename: file.path.to_string_lossy().into_owned(),
                line: def.name_span.line,
            })
        }
    }
}

fn add_implementation(
    iface: &mut Interface,
    pkg: &Package,
    type_name: &str,
    is_pointer: bool,
    location: Location,
) {
    let duplicate = iface.implementations.iter().any(|existing| {
        existing.type_name == type_name
            && existing.package_path == pkg.import_path
            && existing.is_pointer == is_pointer
    });
    if duplicate {
        return;
    }
    iface.implementations.push(Implementation {
        type_name: type_name.to_string(),
        package_path: pkg.import_path.clone(),
        package_name: pkg.name.clone(),
        is_pointer,
        location,
    });
}
