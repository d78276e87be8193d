// src/sema/infer.rs
//! Best-effort expression typing inside function bodies.
//!
//! Call classification needs to know three things about an expression:
//! whether it names a package-level function, whether it is a value of
//! function type, and whether a selector receiver is interface-typed.
//! Everything the checker cannot resolve stays `Ty::Invalid` and the
//! analyses degrade gracefully.

use crate::frontend::ast::*;
use crate::sema::check::{PackageInfo, Resolver, StructShape, Underlying};
use crate::sema::satisfy::Universe;
use crate::sema::scope::SymbolKind;
use crate::sema::types::{FuncTy, NamedRef, Ty};
use rustc_hash::{FxHashMap, FxHashSet};

/// Typing context for one file of one package.
pub struct BodyCtx<'a> {
    pub universe: &'a Universe<'a>,
    pub pkg_path: &'a str,
    pub info: &'a PackageInfo,
    pub file: usize,
    type_names: FxHashSet<String>,
}

impl<'a> BodyCtx<'a> {
    pub fn new(
        universe: &'a Universe<'a>,
        pkg_path: &'a str,
        info: &'a PackageInfo,
        file: usize,
    ) -> Self {
        let type_names = info.named_types.keys().cloned().collect();
        Self {
            universe,
            pkg_path,
            info,
            file,
            type_names,
        }
    }

    /// Resolve a type expression in this file's context without touching
    /// the package's type table.
    pub fn resolve_type(&self, expr: &TypeExpr) -> Ty {
        let mut scratch = FxHashMap::default();
        let empty = FxHashMap::default();
        let mut resolver = Resolver {
            pkg_path: self.pkg_path,
            type_names: &self.type_names,
            imports: self.info.file_imports.get(self.file).unwrap_or(&empty),
            type_params: &[],
            table: &mut scratch,
        };
        resolver.resolve(expr)
    }

    pub fn resolve_sig(&self, sig: &FuncSig) -> FuncTy {
        let mut scratch = FxHashMap::default();
        let empty = FxHashMap::default();
        let mut resolver = Resolver {
            pkg_path: self.pkg_path,
            type_names: &self.type_names,
            imports: self.info.file_imports.get(self.file).unwrap_or(&empty),
            type_params: &[],
            table: &mut scratch,
        };
        resolver.resolve_sig(sig)
    }

    /// Import path for a bare identifier used as a package qualifier.
    pub fn import_qualifier(&self, name: &str) -> Option<&str> {
        self.info.import_path(self.file, name)
    }

    /// Chase a named type to its structural underlying form.
    pub fn underlying(&self, ty: &Ty) -> Ty {
        let mut current = ty.clone();
        let mut seen: FxHashSet<NamedRef> = FxHashSet::default();
        loop {
            match &current {
                Ty::Named(named) => {
                    if !seen.insert(named.clone()) {
                        return Ty::Invalid;
                    }
                    match self.universe.named(named) {
                        Some(def) => match &def.underlying {
                            Underlying::Interface(shape) => {
                                return Ty::Interface {
                                    empty: shape.methods.is_empty() && shape.embeds.is_empty(),
                                }
                            }
                            Underlying::Struct(shape) => {
                                return Ty::Struct {
                                    empty: shape.embedded.is_empty() && shape.fields.is_empty(),
                                }
                            }
                            Underlying::Other(inner) => current = inner.clone(),
                        },
                        None => return Ty::Invalid,
                    }
                }
                other => return other.clone(),
            }
        }
    }

    /// Whether a type is interface-shaped once named layers are chased.
    pub fn is_interface(&self, ty: &Ty) -> bool {
        matches!(self.underlying(ty), Ty::Interface { .. })
    }

    /// Method signature on a named type, following Go's method-set
    /// shadowing through embedded fields (first match wins, breadth
    /// first).
    pub fn method_sig(&self, named: &NamedRef, name: &str) -> Option<(FuncTy, bool)> {
        let mut level = vec![named.clone()];
        let mut seen: FxHashSet<NamedRef> = FxHashSet::default();
        while !level.is_empty() {
            let mut next = Vec::new();
            for current in level.drain(..) {
                if !seen.insert(current.clone()) {
                    continue;
                }
                let Some(def) = self.universe.named(&current) else {
                    continue;
                };
                if let Some(method) = def.methods.iter().find(|m| m.name == name) {
                    return Some((method.sig.clone(), method.ptr_recv));
                }
                match &def.underlying {
                    Underlying::Interface(_) => {
                        if let Some(shape_methods) = self.interface_methods(&current) {
                            if let Some(m) = shape_methods.iter().find(|m| m.name == name) {
                                return Some((m.sig.clone(), false));
                            }
                        }
                    }
                    Underlying::Struct(shape) => {
                        for field in &shape.embedded {
                            if let Some(embedded) = field.ty.named_ref() {
                                next.push(embedded.clone());
                            }
                        }
                    }
                    Underlying::Other(_) => {}
                }
            }
            level = next;
        }
        None
    }

    fn interface_methods(&self, named: &NamedRef) -> Option<Vec<crate::sema::check::IfaceMethod>> {
        let def = self.universe.named(named)?;
        match &def.underlying {
            Underlying::Interface(shape) => {
                let mut methods = shape.methods.clone();
                for embed in &shape.embeds {
                    if let Ty::Named(embedded) = embed {
                        if let Some(mut inner) = self.interface_methods(embedded) {
                            methods.append(&mut inner);
                        }
                    }
                }
                Some(methods)
            }
            _ => None,
        }
    }

    /// Struct field type, looking through embedded fields.
    pub fn field_ty(&self, named: &NamedRef, name: &str) -> Option<Ty> {
        let mut level = vec![named.clone()];
        let mut seen: FxHashSet<NamedRef> = FxHashSet::default();
        while !level.is_empty() {
            let mut next = Vec::new();
            for current in level.drain(..) {
                if !seen.insert(current.clone()) {
                    continue;
                }
                let Some(def) = self.universe.named(&current) else {
                    continue;
                };
                if let Underlying::Struct(shape) = &def.underlying {
                    if let Some(ty) = field_in_shape(shape, name) {
                        return Some(ty);
                    }
                    for field in &shape.embedded {
                        if let Some(embedded) = field.ty.named_ref() {
                            next.push(embedded.clone());
                        }
                    }
                }
            }
            level = next;
        }
        None
    }
}

fn field_in_shape(shape: &StructShape, name: &str) -> Option<Ty> {
    shape
        .fields
        .iter()
        .find(|(field_name, _)| field_name == name)
        .map(|(_, ty)| ty.clone())
}

/// Lexical environment of local bindings.
#[derive(Debug, Clone, Default)]
pub struct Env {
    scopes: Vec<FxHashMap<String, Ty>>,
}

impl Env {
    pub fn new() -> Self {
        Self {
            scopes: vec![FxHashMap::default()],
        }
    }

    pub fn push(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    pub fn declare(&mut self, name: &str, ty: Ty) {
        if name.is_empty() || name == "_" {
            return;
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), ty);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Ty> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}

/// Infer the type of an expression. `Ty::Invalid` means "unknown".
pub fn type_of(expr: &Expr, env: &Env, ctx: &BodyCtx) -> Ty {
    match &expr.kind {
        ExprKind::Ident(ident) => ident_ty(&ident.name, env, ctx),
        ExprKind::IntLit(_) => Ty::Basic("int"),
        ExprKind::FloatLit(_) => Ty::Basic("float64"),
        ExprKind::ImagLit(_) => Ty::Basic("complex128"),
        ExprKind::RuneLit(_) => Ty::Basic("rune"),
        ExprKind::StringLit(_) => Ty::Basic("string"),
        ExprKind::Selector(base, sel) => selector_ty(base, &sel.name, env, ctx),
        ExprKind::Call(call) => call_result_ty(call, env, ctx),
        ExprKind::Index(base, _) => index_ty(base, env, ctx),
        ExprKind::Slice(base, _) => {
            let base_ty = type_of(base, env, ctx);
            match ctx.underlying(&base_ty) {
                Ty::Array(_, elem) => Ty::Slice(elem),
                Ty::Pointer(inner) => match ctx.underlying(&inner) {
                    Ty::Array(_, elem) => Ty::Slice(elem),
                    _ => base_ty,
                },
                _ => base_ty,
            }
        }
        ExprKind::Star(inner) => match type_of(inner, env, ctx) {
            Ty::Pointer(pointee) => *pointee,
            _ => Ty::Invalid,
        },
        ExprKind::Unary(op, inner) => match op {
            UnaryOp::Addr => Ty::pointer(type_of(inner, env, ctx)),
            UnaryOp::Not => Ty::Basic("bool"),
            UnaryOp::Recv => match ctx.underlying(&type_of(inner, env, ctx)) {
                Ty::Chan(_, elem) => *elem,
                _ => Ty::Invalid,
            },
            UnaryOp::Neg | UnaryOp::Pos | UnaryOp::BitNot => type_of(inner, env, ctx),
        },
        ExprKind::Binary(op, lhs, _) => match op {
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::LtEq
            | BinaryOp::Gt
            | BinaryOp::GtEq
            | BinaryOp::LogicalAnd
            | BinaryOp::LogicalOr => Ty::Basic("bool"),
            _ => type_of(lhs, env, ctx),
        },
        ExprKind::Paren(inner) => type_of(inner, env, ctx),
        ExprKind::FuncLit(sig, _) => Ty::Func(Box::new(ctx.resolve_sig(sig))),
        ExprKind::CompositeLit(Some(ty), _) => ctx.resolve_type(ty),
        ExprKind::CompositeLit(None, _) => Ty::Invalid,
        ExprKind::KeyValue(..) => Ty::Invalid,
        ExprKind::TypeAssert(_, Some(ty)) => ctx.resolve_type(ty),
        ExprKind::TypeAssert(_, None) => Ty::Invalid,
        ExprKind::TypeAsExpr(_) => Ty::Invalid,
    }
}

fn index_ty(base: &Expr, env: &Env, ctx: &BodyCtx) -> Ty {
    let base_ty = type_of(base, env, ctx);
    let mut under = ctx.underlying(&base_ty);
    if let Ty::Pointer(inner) = &under {
        under = ctx.underlying(inner);
    }
    match under {
        Ty::Slice(elem) | Ty::Array(_, elem) => *elem,
        Ty::Map(_, value) => *value,
        Ty::Basic("string") => Ty::Basic("byte"),
        // Explicit instantiation of a generic function value.
        Ty::Func(_) => base_ty,
        _ => Ty::Invalid,
    }
}

fn ident_ty(name: &str, env: &Env, ctx: &BodyCtx) -> Ty {
    if let Some(ty) = env.lookup(name) {
        return ty.clone();
    }
    if let Some(symbol) = ctx.info.scope.lookup(name) {
        if symbol.kind != SymbolKind::Type {
            return symbol.ty.clone().unwrap_or(Ty::Invalid);
        }
        return Ty::Invalid; // a bare type name is not a value
    }
    match name {
        "true" | "false" => Ty::Basic("bool"),
        _ => Ty::Invalid,
    }
}

fn selector_ty(base: &Expr, sel: &str, env: &Env, ctx: &BodyCtx) -> Ty {
    // Package-qualified member: the qualifier must not be shadowed by a
    // local binding.
    if let ExprKind::Ident(qualifier) = &base.unparen().kind {
        if env.lookup(&qualifier.name).is_none()
            && ctx.info.scope.lookup(&qualifier.name).is_none()
        {
            if let Some(path) = ctx.import_qualifier(&qualifier.name) {
                if let Some(pkg) = ctx.universe.package(path) {
                    if let Some(symbol) = pkg.scope.lookup(sel) {
                        if symbol.kind != SymbolKind::Type {
                            return symbol.ty.clone().unwrap_or(Ty::Invalid);
                        }
                    }
                }
                return Ty::Invalid;
            }
        }
    }

    let mut base_ty = type_of(base, env, ctx);
    if let Ty::Pointer(inner) = &base_ty {
        base_ty = (**inner).clone();
    }
    let Some(named) = base_ty.named_ref().cloned() else {
        return Ty::Invalid;
    };
    if let Some((sig, _)) = ctx.method_sig(&named, sel) {
        return Ty::Func(Box::new(sig));
    }
    ctx.field_ty(&named, sel).unwrap_or(Ty::Invalid)
}

fn call_result_ty(call: &CallExpr, env: &Env, ctx: &BodyCtx) -> Ty {
    // Conversions yield the converted-to type.
    if let Some(ty) = conversion_target(call, env, ctx) {
        return ty;
    }
    if let ExprKind::Ident(ident) = &call.fun.unparen().kind {
        if env.lookup(&ident.name).is_none() && ctx.info.scope.lookup(&ident.name).is_none() {
            if let Some(ty) = builtin_result(&ident.name, call, env, ctx) {
                return ty;
            }
        }
    }
    let callee_ty = match &call.fun.unparen().kind {
        // Strip explicit instantiation for result typing.
        ExprKind::Index(base, _) => type_of(base, env, ctx),
        _ => type_of(call.fun.unparen(), env, ctx),
    };
    match ctx.underlying(&callee_ty) {
        Ty::Func(sig) => results_ty(*sig),
        _ => match callee_ty {
            Ty::Func(sig) => results_ty(*sig),
            _ => Ty::Invalid,
        },
    }
}

/// The value type a call of this signature produces.
fn results_ty(sig: FuncTy) -> Ty {
    match sig.results.len() {
        0 => Ty::Invalid,
        1 => sig.results.into_iter().next().unwrap_or(Ty::Invalid),
        _ => Ty::Tuple(sig.results),
    }
}

/// If the call is actually a type conversion, the target type.
pub fn conversion_target(call: &CallExpr, env: &Env, ctx: &BodyCtx) -> Option<Ty> {
    let fun = call.fun.unparen();
    match &fun.kind {
        ExprKind::TypeAsExpr(ty) => Some(ctx.resolve_type(ty)),
        ExprKind::Star(inner) => {
            // `(*T)(x)` — a pointer conversion when T names a type.
            if let ExprKind::Ident(ident) = &inner.unparen().kind {
                if env.lookup(&ident.name).is_none() {
                    if let Some(symbol) = ctx.info.scope.lookup(&ident.name) {
                        if symbol.kind == SymbolKind::Type {
                            return Some(Ty::pointer(Ty::Named(NamedRef::new(
                                ctx.pkg_path,
                                &ident.name,
                            ))));
                        }
                    }
                }
            }
            None
        }
        ExprKind::Ident(ident) => {
            if env.lookup(&ident.name).is_some() {
                return None;
            }
            if let Some(symbol) = ctx.info.scope.lookup(&ident.name) {
                return match symbol.kind {
                    SymbolKind::Type => Some(Ty::Named(NamedRef::new(ctx.pkg_path, &ident.name))),
                    _ => None,
                };
            }
            crate::sema::types::basic_type(&ident.name).map(Ty::Basic)
        }
        ExprKind::Selector(base, sel) => {
            let ExprKind::Ident(qualifier) = &base.unparen().kind else {
                return None;
            };
            if env.lookup(&qualifier.name).is_some()
                || ctx.info.scope.lookup(&qualifier.name).is_some()
            {
                return None;
            }
            let path = ctx.import_qualifier(&qualifier.name)?;
            let pkg = ctx.universe.package(path)?;
            let symbol = pkg.scope.lookup(&sel.name)?;
            if symbol.kind == SymbolKind::Type {
                Some(Ty::Named(NamedRef::new(path, &sel.name)))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Result types of builtin calls that lower to ordinary call sites.
fn builtin_result(name: &str, call: &CallExpr, env: &Env, ctx: &BodyCtx) -> Option<Ty> {
    match name {
        "len" | "cap" => Some(Ty::Basic("int")),
        "append" => call.args.first().map(|arg| type_of(arg, env, ctx)),
        "copy" => Some(Ty::Basic("int")),
        "make" => call.args.first().and_then(|arg| match &arg.kind {
            ExprKind::TypeAsExpr(ty) => Some(ctx.resolve_type(ty)),
            _ => None,
        }),
        "new" => call.args.first().and_then(|arg| match &arg.kind {
            ExprKind::TypeAsExpr(ty) => Some(Ty::pointer(ctx.resolve_type(ty))),
            ExprKind::Ident(ident) => Some(Ty::pointer(ident_as_type(&ident.name, ctx))),
            _ => None,
        }),
        "recover" => Some(Ty::Interface { empty: true }),
        "min" | "max" => call.args.first().map(|arg| type_of(arg, env, ctx)),
        _ => None,
    }
}

fn ident_as_type(name: &str, ctx: &BodyCtx) -> Ty {
    if ctx.info.named_types.contains_key(name) {
        return Ty::Named(NamedRef::new(ctx.pkg_path, name));
    }
    crate::sema::types::basic_type(name)
        .map(Ty::Basic)
        .unwrap_or(Ty::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::Parser;
    use crate::sema::check::check_package;

    const PKG: &str = "example.com/m/demo";

    fn setup(source: &str) -> PackageInfo {
        let (file, errors) = Parser::parse_file(source, "/tmp/demo.go");
        assert!(errors.is_empty(), "parse errors: {errors:?}");
        check_package(PKG, &[file])
    }

    fn parse_expr(source: &str) -> Expr {
        let mut parser = Parser::new(source);
        parser.parse_expr().expect("expr")
    }

    #[test]
    fn locals_shadow_package_scope() {
        let info = setup("package demo\n\nfunc helper() {}\n");
        let universe = Universe::new([(PKG, &info)]);
        let ctx = BodyCtx::new(&universe, PKG, &info, 0);
        let mut env = Env::new();
        env.declare("helper", Ty::Basic("int"));
        assert_eq!(
            type_of(&parse_expr("helper"), &env, &ctx),
            Ty::Basic("int")
        );
    }

    #[test]
    fn package_func_is_func_typed() {
        let info = setup("package demo\n\nfunc run(n int) error { return nil }\n");
        let universe = Universe::new([(PKG, &info)]);
        let ctx = BodyCtx::new(&universe, PKG, &info, 0);
        let env = Env::new();
        let ty = type_of(&parse_expr("run"), &env, &ctx);
        assert!(matches!(ty, Ty::Func(_)));
    }

    #[test]
    fn method_selector_through_pointer() {
        let info = setup(
            "package demo\n\ntype Pool struct{}\n\nfunc (p *Pool) Close() error { return nil }\n",
        );
        let universe = Universe::new([(PKG, &info)]);
        let ctx = BodyCtx::new(&universe, PKG, &info, 0);
        let mut env = Env::new();
        env.declare(
            "p",
            Ty::pointer(Ty::Named(NamedRef::new(PKG, "Pool"))),
        );
        let ty = type_of(&parse_expr("p.Close"), &env, &ctx);
        assert!(matches!(ty, Ty::Func(_)));
    }

    #[test]
    fn call_result_propagates() {
        let info = setup("package demo\n\nfunc make2() (int, error) { return 0, nil }\n");
        let universe = Universe::new([(PKG, &info)]);
        let ctx = BodyCtx::new(&universe, PKG, &info, 0);
        let env = Env::new();
        let ty = type_of(&parse_expr("make2()"), &env, &ctx);
        assert_eq!(
            ty,
            Ty::Tuple(vec![Ty::Basic("int"), Ty::Basic("error")])
        );
    }

    #[test]
    fn conversion_detected_for_named_type() {
        let info = setup("package demo\n\ntype ID int\n");
        let universe = Universe::new([(PKG, &info)]);
        let ctx = BodyCtx::new(&universe, PKG, &info, 0);
        let env = Env::new();
        let expr = parse_expr("ID(42)");
        let ExprKind::Call(call) = &expr.kind else {
            panic!("expected call");
        };
        assert_eq!(
            conversion_target(call, &env, &ctx),
            Some(Ty::Named(NamedRef::new(PKG, "ID")))
        );
    }

    #[test]
    fn interface_typed_var_detected() {
        let info = setup(
            "package demo\n\ntype Doer interface { Do() }\n",
        );
        let universe = Universe::new([(PKG, &info)]);
        let ctx = BodyCtx::new(&universe, PKG, &info, 0);
        let mut env = Env::new();
        env.declare("d", Ty::Named(NamedRef::new(PKG, "Doer")));
        let ty = type_of(&parse_expr("d"), &env, &ctx);
        assert!(ctx.is_interface(&ty));
    }
}
