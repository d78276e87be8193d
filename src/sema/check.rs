// src/sema/check.rs
//! Per-package checking: builds the top-level symbol scope, named-type
//! definitions with method sets, and the type table mapping type
//! expression nodes to resolved types.

use crate::frontend::ast::*;
use crate::frontend::Span;
use crate::sema::scope::{Scope, Symbol, SymbolKind};
use crate::sema::types::{basic_type, FuncTy, NamedRef, Ty};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::debug;

/// One interface method requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfaceMethod {
    pub name: String,
    pub sig: FuncTy,
}

/// Shape of a named interface type.
#[derive(Debug, Clone, Default)]
pub struct InterfaceShape {
    pub methods: Vec<IfaceMethod>,
    pub embeds: Vec<Ty>,
    /// True when the interface carries non-interface constraint elements
    /// (`~int`, unions, `comparable`); such interfaces never have a
    /// complete method set for satisfaction purposes.
    pub has_constraints: bool,
}

/// An embedded struct field, which promotes methods.
#[derive(Debug, Clone)]
pub struct EmbeddedField {
    pub ty: Ty,
    pub is_pointer: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StructShape {
    pub embedded: Vec<EmbeddedField>,
    pub fields: Vec<(String, Ty)>,
}

#[derive(Debug, Clone)]
pub enum Underlying {
    Interface(InterfaceShape),
    Struct(StructShape),
    Other(Ty),
}

/// A method declared with a receiver on a named type.
#[derive(Debug, Clone)]
pub struct MethodDef {
    pub name: String,
    pub ptr_recv: bool,
    pub sig: FuncTy,
    pub file: usize,
    pub span: Span,
}

/// A named type declared at package level. Most types carry only a
/// handful of methods, hence the inline storage.
#[derive(Debug, Clone)]
pub struct NamedTypeDef {
    pub name: String,
    pub file: usize,
    pub name_span: Span,
    pub underlying: Underlying,
    pub methods: SmallVec<[MethodDef; 4]>,
    pub is_alias: bool,
    pub has_type_params: bool,
}

impl NamedTypeDef {
    pub fn is_interface(&self) -> bool {
        matches!(self.underlying, Underlying::Interface(_))
    }
}

/// Checked type information for one package.
#[derive(Debug, Clone, Default)]
pub struct PackageInfo {
    pub scope: Scope,
    pub named_types: FxHashMap<String, NamedTypeDef>,
    /// Per-file map from type-expression node to resolved type.
    pub type_table: Vec<FxHashMap<NodeId, Ty>>,
    /// Per-file map from local import name to import path.
    pub file_imports: Vec<FxHashMap<String, String>>,
}

impl PackageInfo {
    pub fn type_entry_count(&self) -> usize {
        self.type_table.iter().map(|t| t.len()).sum()
    }

    /// Whether checking produced any usable type information. A package
    /// of bare nullary functions still counts: its scope symbols carry
    /// function types even though no type expression was recorded.
    pub fn has_type_info(&self) -> bool {
        self.type_entry_count() > 0 || !self.named_types.is_empty() || !self.scope.is_empty()
    }

    pub fn lookup_type(&self, file: usize, id: NodeId) -> Option<&Ty> {
        self.type_table.get(file)?.get(&id)
    }

    /// Import path for a local qualifier name in the given file.
    pub fn import_path(&self, file: usize, local: &str) -> Option<&str> {
        self.file_imports
            .get(file)?
            .get(local)
            .map(String::as_str)
    }

    /// Local name under which `path` is imported in `file`, honoring
    /// renames. Falls back to the last path segment.
    pub fn local_name_for(&self, file: usize, path: &str) -> String {
        if let Some(imports) = self.file_imports.get(file) {
            for (local, import_path) in imports {
                if import_path == path {
                    return local.clone();
                }
            }
        }
        default_import_name(path).to_string()
    }
}

/// Default local name of an import path: its last segment.
pub fn default_import_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Check a parsed package. `pkg_path` is the package's import path.
pub fn check_package(pkg_path: &str, files: &[File]) -> PackageInfo {
    let mut info = PackageInfo {
        type_table: vec![FxHashMap::default(); files.len()],
        file_imports: Vec::with_capacity(files.len()),
        ..PackageInfo::default()
    };

    for file in files {
        let mut imports = FxHashMap::default();
        for spec in &file.imports {
            let local = match &spec.alias {
                Some(alias) if alias.name == "_" || alias.name == "." => continue,
                Some(alias) => alias.name.clone(),
                None => default_import_name(&spec.path).to_string(),
            };
            imports.insert(local, spec.path.clone());
        }
        info.file_imports.push(imports);
    }

    // Collect every package-level type name first so bare identifiers
    // resolve against the package scope before the builtin universe.
    let mut type_names: FxHashSet<String> = FxHashSet::default();
    for file in files {
        for decl in &file.decls {
            if let Decl::Type(type_decl) = decl {
                for spec in &type_decl.specs {
                    if !spec.name.name.is_empty() {
                        type_names.insert(spec.name.name.clone());
                    }
                }
            }
        }
    }

    // Type declarations first: methods and value declarations resolve
    // against the full set of named types regardless of file order.
    for (file_idx, file) in files.iter().enumerate() {
        for decl in &file.decls {
            if let Decl::Type(type_decl) = decl {
                for spec in &type_decl.specs {
                    check_type_spec(pkg_path, &type_names, &mut info, file_idx, spec);
                }
            }
        }
    }
    for (file_idx, file) in files.iter().enumerate() {
        for decl in &file.decls {
            match decl {
                Decl::Type(_) => {}
                Decl::Func(func) => {
                    check_func_decl(pkg_path, &type_names, &mut info, file_idx, func);
                }
                Decl::Var(decl) => {
                    check_value_decl(pkg_path, &type_names, &mut info, file_idx, decl, false);
                }
                Decl::Const(decl) => {
                    check_value_decl(pkg_path, &type_names, &mut info, file_idx, decl, true);
                }
            }
        }
    }

    info
}

fn check_type_spec(
    pkg_path: &str,
    type_names: &FxHashSet<String>,
    info: &mut PackageInfo,
    file_idx: usize,
    spec: &TypeSpec,
) {
    if spec.name.name.is_empty() {
        return;
    }
    let type_params: Vec<String> = spec
        .type_params
        .iter()
        .flat_map(|p| p.names.iter().map(|n| n.name.clone()))
        .collect();

    let underlying = {
        let mut resolver = Resolver {
            pkg_path,
            type_names,
            imports: &info.file_imports[file_idx],
            type_params: &type_params,
            table: &mut info.type_table[file_idx],
        };
        match spec.ty.unparen().kind.clone() {
            TypeExprKind::Interface(elems) => {
                Underlying::Interface(resolver.interface_shape(&elems))
            }
            TypeExprKind::Struct(fields) => Underlying::Struct(resolver.struct_shape(&fields)),
            _ => Underlying::Other(resolver.resolve(&spec.ty)),
        }
    };

    let def = NamedTypeDef {
        name: spec.name.name.clone(),
        file: file_idx,
        name_span: spec.name.span,
        underlying,
        methods: SmallVec::new(),
        is_alias: spec.is_alias,
        has_type_params: !type_params.is_empty(),
    };

    if let Some(existing) = info.named_types.get(&spec.name.name) {
        debug!(
            name = %spec.name.name,
            pkg = %pkg_path,
            first_file = existing.file,
            "duplicate type definition, keeping first"
        );
        return;
    }
    info.named_types.insert(spec.name.name.clone(), def);
    info.scope.declare(
        &spec.name.name,
        Symbol {
            kind: SymbolKind::Type,
            ty: Some(Ty::Named(NamedRef::new(pkg_path, &spec.name.name))),
            file: file_idx,
            span: spec.name.span,
        },
    );
}

fn check_func_decl(
    pkg_path: &str,
    type_names: &FxHashSet<String>,
    info: &mut PackageInfo,
    file_idx: usize,
    func: &FuncDecl,
) {
    let type_params: Vec<String> = func
        .type_params
        .iter()
        .flat_map(|p| p.names.iter().map(|n| n.name.clone()))
        .collect();
    let sig = {
        let mut resolver = Resolver {
            pkg_path,
            type_names,
            imports: &info.file_imports[file_idx],
            type_params: &type_params,
            table: &mut info.type_table[file_idx],
        };
        resolver.resolve_sig(&func.sig)
    };

    match &func.recv {
        Some(recv) if !recv.base.name.is_empty() => {
            let method = MethodDef {
                name: func.name.name.clone(),
                ptr_recv: recv.is_pointer,
                sig,
                file: file_idx,
                span: func.name.span,
            };
            match info.named_types.get_mut(&recv.base.name) {
                Some(def) => def.methods.push(method),
                None => {
                    // The receiver type may be declared in a later file;
                    // create a shell that the real declaration replaces...
                    // or, when it never appears, keeps the methods
                    // reachable for call classification.
                    let def = info
                        .named_types
                        .entry(recv.base.name.clone())
                        .or_insert_with(|| NamedTypeDef {
                            name: recv.base.name.clone(),
                            file: file_idx,
                            name_span: recv.base.span,
                            underlying: Underlying::Struct(StructShape::default()),
                            methods: SmallVec::new(),
                            is_alias: false,
                            has_type_params: false,
                        });
                    def.methods.push(method);
                }
            }
        }
        _ => {
            if func.name.name.is_empty() {
                return;
            }
            info.scope.declare(
                &func.name.name,
                Symbol {
                    kind: SymbolKind::Func,
                    ty: Some(Ty::Func(Box::new(sig))),
                    file: file_idx,
                    span: func.name.span,
                },
            );
        }
    }
}

fn check_value_decl(
    pkg_path: &str,
    type_names: &FxHashSet<String>,
    info: &mut PackageInfo,
    file_idx: usize,
    decl: &ValueDecl,
    is_const: bool,
) {
    for spec in &decl.specs {
        let declared = spec.ty.as_ref().map(|ty| {
            let mut resolver = Resolver {
                pkg_path,
                type_names,
                imports: &info.file_imports[file_idx],
                type_params: &[],
                table: &mut info.type_table[file_idx],
            };
            resolver.resolve(ty)
        });
        for (i, name) in spec.names.iter().enumerate() {
            if name.name.is_empty() || name.name == "_" {
                continue;
            }
            let ty = declared.clone().or_else(|| {
                spec.values.get(i).and_then(|value| {
                    let mut resolver = Resolver {
                        pkg_path,
                        type_names,
                        imports: &info.file_imports[file_idx],
                        type_params: &[],
                        table: &mut info.type_table[file_idx],
                    };
                    resolver.infer_value(value)
                })
            });
            info.scope.declare(
                &name.name,
                Symbol {
                    kind: if is_const {
                        SymbolKind::Const
                    } else {
                        SymbolKind::Var
                    },
                    ty,
                    file: file_idx,
                    span: name.span,
                },
            );
        }
    }
}

/// Resolves type expressions against one file's import table and the
/// package's declared type names, recording results in the type table.
pub(crate) struct Resolver<'a> {
    pub pkg_path: &'a str,
    pub type_names: &'a FxHashSet<String>,
    pub imports: &'a FxHashMap<String, String>,
    pub type_params: &'a [String],
    pub table: &'a mut FxHashMap<NodeId, Ty>,
}

impl Resolver<'_> {
    pub fn resolve(&mut self, expr: &TypeExpr) -> Ty {
        let ty = match &expr.kind {
            TypeExprKind::Name(ident) => self.resolve_name(&ident.name),
            TypeExprKind::Qualified(qualifier, name) => {
                let path = self
                    .imports
                    .get(&qualifier.name)
                    .cloned()
                    .unwrap_or_else(|| qualifier.name.clone());
                Ty::Named(NamedRef::new(path, &name.name))
            }
            TypeExprKind::Pointer(inner) => Ty::pointer(self.resolve(inner)),
            TypeExprKind::Slice(inner) => Ty::Slice(Box::new(self.resolve(inner))),
            TypeExprKind::Array(len, inner) => Ty::Array(
                Some(render_const_expr(len)),
                Box::new(self.resolve(inner)),
            ),
            TypeExprKind::Map(key, value) => Ty::Map(
                Box::new(self.resolve(key)),
                Box::new(self.resolve(value)),
            ),
            TypeExprKind::Chan(dir, inner) => Ty::Chan(*dir, Box::new(self.resolve(inner))),
            TypeExprKind::Func(sig) => Ty::Func(Box::new(self.resolve_sig(sig))),
            TypeExprKind::Struct(fields) => Ty::Struct {
                empty: fields.is_empty(),
            },
            TypeExprKind::Interface(elems) => Ty::Interface {
                empty: elems.is_empty(),
            },
            // Variadic nodes are deliberately not recorded: their display
            // form (`...T`) comes from the syntax renderer.
            TypeExprKind::Variadic(inner) => return Ty::Slice(Box::new(self.resolve(inner))),
            TypeExprKind::Paren(inner) => self.resolve(inner),
            TypeExprKind::Instantiated(base, args) => {
                let base_ty = self.resolve(base);
                let arg_tys: Vec<Ty> = args.iter().map(|a| self.resolve(a)).collect();
                match base_ty.named_ref() {
                    Some(named) => Ty::Instance(named.clone(), arg_tys),
                    None => Ty::Invalid,
                }
            }
            TypeExprKind::Approx(inner) => self.resolve(inner),
        };
        self.table.insert(expr.id, ty.clone());
        ty
    }

    fn resolve_name(&self, name: &str) -> Ty {
        if self.type_params.iter().any(|p| p == name) {
            return Ty::TypeParam(name.to_string());
        }
        if self.type_names.contains(name) {
            return Ty::Named(NamedRef::new(self.pkg_path, name));
        }
        if let Some(basic) = basic_type(name) {
            return Ty::Basic(basic);
        }
        Ty::Named(NamedRef::new(self.pkg_path, name))
    }

    /// Resolve a function signature. Parameter arity expands name groups
    /// (`a, b int` contributes two entries).
    pub fn resolve_sig(&mut self, sig: &FuncSig) -> FuncTy {
        let mut params = Vec::new();
        let mut variadic = false;
        for field in &sig.params {
            let (ty, is_variadic) = match &field.ty.kind {
                TypeExprKind::Variadic(inner) => (self.resolve(inner), true),
                _ => (self.resolve(&field.ty), false),
            };
            let count = field.names.len().max(1);
            for _ in 0..count {
                params.push(ty.clone());
            }
            if is_variadic {
                variadic = true;
            }
        }
        let mut results = Vec::new();
        for field in &sig.results {
            let ty = self.resolve(&field.ty);
            let count = field.names.len().max(1);
            for _ in 0..count {
                results.push(ty.clone());
            }
        }
        FuncTy {
            params,
            variadic,
            results,
        }
    }

    pub fn interface_shape(&mut self, elems: &[Field]) -> InterfaceShape {
        let mut shape = InterfaceShape::default();
        for field in elems {
            if field.names.is_empty() {
                if matches!(field.ty.kind, TypeExprKind::Approx(_)) {
                    shape.has_constraints = true;
                }
                let embed = self.resolve(&field.ty);
                match &embed {
                    Ty::Named(_) | Ty::Instance(..) => {}
                    Ty::Basic("error") | Ty::Basic("any") => {}
                    _ => shape.has_constraints = true,
                }
                shape.embeds.push(embed);
                continue;
            }
            let TypeExprKind::Func(sig) = &field.ty.kind else {
                // Malformed method element; the extractor reports it.
                continue;
            };
            let sig = self.resolve_sig(sig);
            for name in &field.names {
                shape.methods.push(IfaceMethod {
                    name: name.name.clone(),
                    sig: sig.clone(),
                });
            }
        }
        shape
    }

    pub fn struct_shape(&mut self, fields: &[Field]) -> StructShape {
        let mut shape = StructShape::default();
        for field in fields {
            let ty = self.resolve(&field.ty);
            if field.names.is_empty() {
                let is_pointer = matches!(ty, Ty::Pointer(_));
                shape.embedded.push(EmbeddedField { ty, is_pointer });
            } else {
                for name in &field.names {
                    shape.fields.push((name.name.clone(), ty.clone()));
                }
            }
        }
        shape
    }

    /// Shallow inference for top-level `var x = value` declarations.
    fn infer_value(&mut self, value: &Expr) -> Option<Ty> {
        match &value.kind {
            ExprKind::IntLit(_) => Some(Ty::Basic("int")),
            ExprKind::FloatLit(_) => Some(Ty::Basic("float64")),
            ExprKind::StringLit(_) => Some(Ty::Basic("string")),
            ExprKind::RuneLit(_) => Some(Ty::Basic("rune")),
            ExprKind::CompositeLit(Some(ty), _) => Some(self.resolve(ty)),
            ExprKind::FuncLit(sig, _) => Some(Ty::Func(Box::new(self.resolve_sig(sig)))),
            ExprKind::Unary(UnaryOp::Addr, inner) => {
                let inner_ty = self.infer_value(inner)?;
                Some(Ty::pointer(inner_ty))
            }
            ExprKind::Ident(ident) if ident.name == "true" || ident.name == "false" => {
                Some(Ty::Basic("bool"))
            }
            _ => None,
        }
    }
}

/// Render a constant expression as written, for array lengths.
pub(crate) fn render_const_expr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::IntLit(text) => text.clone(),
        ExprKind::Ident(ident) => ident.name.clone(),
        ExprKind::Selector(base, sel) => match &base.unparen().kind {
            ExprKind::Ident(pkg) => format!("{}.{}", pkg.name, sel.name),
            _ => "?".to_string(),
        },
        _ => "?".to_string(),
    }
}
