// src/flow/lower.rs
//! Lowers function bodies into the control-flow form.
//!
//! Lowering runs serially over analyzable packages in deterministic
//! order. Function literals become separate functions named `parent$N`;
//! generic functions lower in their declared form plus one variant per
//! explicit instantiation observed at a call site. Calls are classified
//! while the local typing environment is still at hand.

use crate::errors::AnalysisError;
use crate::flow::positions::PositionTable;
use crate::flow::{BasicBlock, Callee, CallKind, FlowFunc, FlowProgram, Instr};
use crate::frontend::ast::*;
use crate::loader::Package;
use crate::sema::infer::{conversion_target, type_of, BodyCtx, Env};
use crate::sema::scope::SymbolKind;
use crate::sema::types::{NamedRef, Ty};
use crate::sema::Universe;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Lower every analyzable package. Returns the lowered program and the
/// authoritative position table.
pub fn lower_packages(
    packages: &[Package],
    universe: &Universe<'_>,
) -> Result<(FlowProgram, PositionTable), AnalysisError> {
    let analyzable: Vec<&Package> = packages.iter().filter(|p| p.is_analyzable()).collect();
    if analyzable.is_empty() {
        return Err(AnalysisError::NoProgram);
    }

    let mut table = PositionTable::new();
    for pkg in &analyzable {
        for file in &pkg.syntax {
            table.register_file(&file.path);
        }
    }

    let mut program = FlowProgram::default();
    // Explicit generic instantiations observed at call sites, keyed by
    // (package path, function name).
    let mut observed: FxHashMap<(String, String), BTreeSet<String>> = FxHashMap::default();
    // Where each generic function is declared, for the variant pass.
    let mut generic_decls: FxHashMap<(String, String), (usize, usize)> = FxHashMap::default();

    for (pkg_idx, pkg) in analyzable.iter().enumerate() {
        lower_package_init(&mut program, &mut table, pkg, universe, &mut observed);
        let mut init_count = 0u32;
        for (file_idx, file) in pkg.syntax.iter().enumerate() {
            let ctx = BodyCtx::new(universe, &pkg.import_path, &pkg.info, file_idx);
            for decl in &file.decls {
                let Decl::Func(func) = decl else { continue };
                let Some(body) = &func.body else { continue };
                if !func.type_params.is_empty() && func.recv.is_none() {
                    generic_decls.insert(
                        (pkg.import_path.clone(), func.name.name.clone()),
                        (pkg_idx, file_idx),
                    );
                }
                let name = if func.recv.is_none() && func.name.name == "init" {
                    // Declared init functions are numbered, as in the
                    // lowered form of the reference toolchain.
                    init_count += 1;
                    format!("{}.init#{}", pkg.import_path, init_count)
                } else {
                    canonical_name(&pkg.import_path, func)
                };
                lower_one(
                    &mut program,
                    &mut table,
                    &ctx,
                    file,
                    func,
                    body,
                    name,
                    &mut observed,
                );
            }
        }
    }

    // Variant pass: lower one copy per observed explicit instantiation.
    let mut variants: Vec<((String, String), String)> = Vec::new();
    for ((pkg_path, fname), suffixes) in &observed {
        if generic_decls.contains_key(&(pkg_path.clone(), fname.clone())) {
            for suffix in suffixes {
                variants.push(((pkg_path.clone(), fname.clone()), suffix.clone()));
            }
        }
    }
    variants.sort();
    let mut discard: FxHashMap<(String, String), BTreeSet<String>> = FxHashMap::default();
    for ((pkg_path, fname), suffix) in variants {
        let (pkg_idx, file_idx) = generic_decls[&(pkg_path.clone(), fname.clone())];
        let pkg = analyzable[pkg_idx];
        let file = &pkg.syntax[file_idx];
        let ctx = BodyCtx::new(universe, &pkg.import_path, &pkg.info, file_idx);
        let Some(func) = file.decls.iter().find_map(|d| match d {
            Decl::Func(f) if f.recv.is_none() && f.name.name == fname => Some(f),
            _ => None,
        }) else {
            continue;
        };
        let Some(body) = &func.body else { continue };
        let name = format!("{}.{}{}", pkg_path, fname, suffix);
        debug!(func = %name, "lowering generic instantiation");
        lower_one(
            &mut program,
            &mut table,
            &ctx,
            file,
            func,
            body,
            name,
            &mut discard,
        );
    }

    Ok((program, table))
}

/// Synthesize the package `init` function: every package has one, and
/// top-level variable initializer expressions run inside it.
fn lower_package_init(
    program: &mut FlowProgram,
    table: &mut PositionTable,
    pkg: &Package,
    universe: &Universe<'_>,
    observed: &mut FxHashMap<(String, String), BTreeSet<String>>,
) {
    let init_name = format!("{}.init", pkg.import_path);
    let mut blocks = vec![BasicBlock::default()];
    let mut anon_base = 0;
    let mut literals: Vec<FlowFunc> = Vec::new();
    for (file_idx, file) in pkg.syntax.iter().enumerate() {
        let has_initializers = file.decls.iter().any(|d| {
            matches!(d, Decl::Var(v) if v.specs.iter().any(|s| !s.values.is_empty()))
        });
        if !has_initializers {
            continue;
        }
        let ctx = BodyCtx::new(universe, &pkg.import_path, &pkg.info, file_idx);
        let mut lowerer = Lowerer {
            ctx: &ctx,
            file,
            table,
            env: Env::new(),
            blocks: std::mem::take(&mut blocks),
            current: 0,
            name: init_name.clone(),
            anon_count: anon_base,
            queue: Vec::new(),
            observed,
        };
        lowerer.current = lowerer.blocks.len() - 1;
        for decl in &file.decls {
            if let Decl::Var(var_decl) = decl {
                for spec in &var_decl.specs {
                    for value in &spec.values {
                        lowerer.walk_expr(value);
                    }
                }
            }
        }
        anon_base = lowerer.anon_count;
        let Lowerer { blocks: b, queue, .. } = lowerer;
        blocks = b;
        drain_literal_queue(&mut literals, table, &ctx, file, queue, observed);
    }
    program.functions.push(FlowFunc {
        name: init_name,
        pkg_path: pkg.import_path.clone(),
        blocks,
    });
    program.functions.extend(literals);
}

/// Canonical name of a declared function or method.
fn canonical_name(pkg_path: &str, func: &FuncDecl) -> String {
    match &func.recv {
        Some(recv) if recv.is_pointer => {
            format!("(*{}.{}).{}", pkg_path, recv.base.name, func.name.name)
        }
        Some(recv) => format!("({}.{}).{}", pkg_path, recv.base.name, func.name.name),
        None if !func.type_params.is_empty() => {
            let params: Vec<&str> = func
                .type_params
                .iter()
                .flat_map(|p| p.names.iter().map(|n| n.name.as_str()))
                .collect();
            format!("{}.{}[{}]", pkg_path, func.name.name, params.join(", "))
        }
        None => format!("{}.{}", pkg_path, func.name.name),
    }
}

#[allow(clippy::too_many_arguments)]
fn lower_one(
    program: &mut FlowProgram,
    table: &mut PositionTable,
    ctx: &BodyCtx<'_>,
    file: &File,
    func: &FuncDecl,
    body: &Block,
    name: String,
    observed: &mut FxHashMap<(String, String), BTreeSet<String>>,
) {
    let mut env = Env::new();
    if let Some(recv) = &func.recv {
        if let Some(recv_name) = &recv.name {
            let base = Ty::Named(NamedRef::new(ctx.pkg_path, &recv.base.name));
            let ty = if recv.is_pointer {
                Ty::pointer(base)
            } else {
                base
            };
            env.declare(&recv_name.name, ty);
        }
    }
    declare_sig_bindings(&mut env, &func.sig, ctx);

    let mut lowerer = Lowerer {
        ctx,
        file,
        table,
        env,
        blocks: vec![BasicBlock::default()],
        current: 0,
        name: name.clone(),
        anon_count: 0,
        queue: Vec::new(),
        observed,
    };
    lowerer.walk_block(body);
    let Lowerer { blocks, queue, .. } = lowerer;
    program.functions.push(FlowFunc {
        name,
        pkg_path: ctx.pkg_path.to_string(),
        blocks,
    });
    let mut literals = Vec::new();
    drain_literal_queue(&mut literals, table, ctx, file, queue, observed);
    program.functions.extend(literals);
}

/// Lower queued function literals in encounter order; nested literals
/// extend the queue.
fn drain_literal_queue(
    out: &mut Vec<FlowFunc>,
    table: &mut PositionTable,
    ctx: &BodyCtx<'_>,
    file: &File,
    queue: Vec<QueuedLit>,
    observed: &mut FxHashMap<(String, String), BTreeSet<String>>,
) {
    let mut queue = queue;
    let mut idx = 0;
    while idx < queue.len() {
        let lit = queue[idx].clone();
        let mut env = lit.env;
        env.push();
        declare_sig_bindings(&mut env, &lit.sig, ctx);
        let mut lowerer = Lowerer {
            ctx,
            file,
            table,
            env,
            blocks: vec![BasicBlock::default()],
            current: 0,
            name: lit.name.clone(),
            anon_count: 0,
            queue: Vec::new(),
            observed,
        };
        lowerer.walk_block(&lit.body);
        let Lowerer {
            blocks,
            queue: nested,
            ..
        } = lowerer;
        out.push(FlowFunc {
            name: lit.name,
            pkg_path: ctx.pkg_path.to_string(),
            blocks,
        });
        queue.extend(nested);
        idx += 1;
    }
}

fn declare_sig_bindings(env: &mut Env, sig: &FuncSig, ctx: &BodyCtx<'_>) {
    for field in &sig.params {
        let ty = match &field.ty.kind {
            TypeExprKind::Variadic(inner) => Ty::Slice(Box::new(ctx.resolve_type(inner))),
            _ => ctx.resolve_type(&field.ty),
        };
        for name in &field.names {
            env.declare(&name.name, ty.clone());
        }
    }
    for field in &sig.results {
        let ty = ctx.resolve_type(&field.ty);
        for name in &field.names {
            env.declare(&name.name, ty.clone());
        }
    }
}

#[derive(Clone)]
struct QueuedLit {
    name: String,
    sig: FuncSig,
    body: Block,
    env: Env,
}

struct Lowerer<'a, 'b> {
    ctx: &'a BodyCtx<'b>,
    file: &'a File,
    table: &'a mut PositionTable,
    env: Env,
    blocks: Vec<BasicBlock>,
    current: usize,
    name: String,
    anon_count: u32,
    queue: Vec<QueuedLit>,
    observed: &'a mut FxHashMap<(String, String), BTreeSet<String>>,
}

impl Lowerer<'_, '_> {
    fn new_block(&mut self) -> usize {
        self.blocks.push(BasicBlock::default());
        self.current = self.blocks.len() - 1;
        self.current
    }

    fn emit(&mut self, kind: CallKind, callee: Callee, span: crate::frontend::Span) {
        let pos = self.table.intern(&self.file.path, span.line);
        self.blocks[self.current].instrs.push(Instr { kind, callee, pos });
    }

    fn walk_block(&mut self, block: &Block) {
        self.env.push();
        for stmt in &block.stmts {
            self.walk_stmt(stmt);
        }
        self.env.pop();
    }

    fn walk_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr) => self.walk_expr(expr),
            Stmt::Send(ch, value) => {
                self.walk_expr(ch);
                self.walk_expr(value);
            }
            Stmt::IncDec(expr, _) => self.walk_expr(expr),
            Stmt::Assign(assign) => {
                for lhs in &assign.lhs {
                    if !assign.define {
                        self.walk_expr(lhs);
                    }
                }
                for rhs in &assign.rhs {
                    self.walk_expr(rhs);
                }
                if assign.define {
                    self.bind_assign(assign);
                }
            }
            Stmt::Decl(decl) => self.walk_decl(decl),
            Stmt::Go(expr) => self.walk_spawnlike(expr, CallKind::Go),
            Stmt::Defer(expr) => self.walk_spawnlike(expr, CallKind::Defer),
            Stmt::Return(values, _) => {
                for value in values {
                    self.walk_expr(value);
                }
            }
            Stmt::Branch(..) | Stmt::Empty => {}
            Stmt::Block(block) => self.walk_block(block),
            Stmt::If(if_stmt) => {
                self.env.push();
                if let Some(init) = &if_stmt.init {
                    self.walk_stmt(init);
                }
                self.walk_expr(&if_stmt.cond);
                self.new_block();
                self.walk_block(&if_stmt.then);
                if let Some(else_branch) = &if_stmt.else_branch {
                    self.new_block();
                    self.walk_stmt(else_branch);
                }
                self.new_block();
                self.env.pop();
            }
            Stmt::For(for_stmt) => {
                self.env.push();
                if let Some(init) = &for_stmt.init {
                    self.walk_stmt(init);
                }
                if for_stmt.cond.is_some() || for_stmt.post.is_some() {
                    self.new_block();
                }
                if let Some(cond) = &for_stmt.cond {
                    self.walk_expr(cond);
                }
                self.new_block();
                self.walk_block(&for_stmt.body);
                if let Some(post) = &for_stmt.post {
                    self.walk_stmt(post);
                }
                self.new_block();
                self.env.pop();
            }
            Stmt::Range(range_stmt) => {
                self.env.push();
                self.walk_expr(&range_stmt.expr);
                if range_stmt.define {
                    self.bind_range(range_stmt);
                } else {
                    if let Some(key) = &range_stmt.key {
                        self.walk_expr(key);
                    }
                    if let Some(value) = &range_stmt.value {
                        self.walk_expr(value);
                    }
                }
                self.new_block();
                self.walk_block(&range_stmt.body);
                self.new_block();
                self.env.pop();
            }
            Stmt::Switch(switch_stmt) => {
                self.env.push();
                if let Some(init) = &switch_stmt.init {
                    self.walk_stmt(init);
                }
                if let Some(tag) = &switch_stmt.tag {
                    self.walk_expr(tag);
                }
                for case in &switch_stmt.cases {
                    self.new_block();
                    self.env.push();
                    for expr in &case.exprs {
                        self.walk_expr(expr);
                    }
                    for stmt in &case.body {
                        self.walk_stmt(stmt);
                    }
                    self.env.pop();
                }
                self.new_block();
                self.env.pop();
            }
            Stmt::TypeSwitch(type_switch) => {
                self.env.push();
                if let Some(init) = &type_switch.init {
                    self.walk_stmt(init);
                }
                self.walk_expr(&type_switch.subject);
                let subject_ty = type_of(&type_switch.subject, &self.env, self.ctx);
                for case in &type_switch.cases {
                    self.new_block();
                    self.env.push();
                    if let Some(binding) = &type_switch.binding {
                        let ty = if case.types.len() == 1 {
                            self.ctx.resolve_type(&case.types[0])
                        } else {
                            subject_ty.clone()
                        };
                        self.env.declare(&binding.name, ty);
                    }
                    for stmt in &case.body {
                        self.walk_stmt(stmt);
                    }
                    self.env.pop();
                }
                self.new_block();
                self.env.pop();
            }
            Stmt::Select(select_stmt) => {
                for case in &select_stmt.cases {
                    self.new_block();
                    self.env.push();
                    if let Some(comm) = &case.comm {
                        self.walk_stmt(comm);
                    }
                    for stmt in &case.body {
                        self.walk_stmt(stmt);
                    }
                    self.env.pop();
                }
                self.new_block();
            }
            Stmt::Labeled(_, inner) => self.walk_stmt(inner),
        }
    }

    fn walk_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Var(value_decl) | Decl::Const(value_decl) => {
                for spec in &value_decl.specs {
                    for value in &spec.values {
                        self.walk_expr(value);
                    }
                    let declared = spec.ty.as_ref().map(|ty| self.ctx.resolve_type(ty));
                    for (i, name) in spec.names.iter().enumerate() {
                        let ty = declared.clone().unwrap_or_else(|| {
                            spec.values
                                .get(i)
                                .map(|v| type_of(v, &self.env, self.ctx))
                                .unwrap_or(Ty::Invalid)
                        });
                        self.env.declare(&name.name, ty);
                    }
                }
            }
            Decl::Type(_) | Decl::Func(_) => {}
        }
    }

    fn bind_assign(&mut self, assign: &AssignStmt) {
        if assign.lhs.len() > 1 && assign.rhs.len() == 1 {
            // Tuple spread: multi-result call, map index, type assertion.
            let rhs_ty = type_of(&assign.rhs[0], &self.env, self.ctx);
            let parts: Vec<Ty> = match rhs_ty {
                Ty::Tuple(parts) => parts,
                other => {
                    // `v, ok :=` forms produce a bool second value.
                    let mut parts = vec![other];
                    while parts.len() < assign.lhs.len() {
                        parts.push(Ty::Basic("bool"));
                    }
                    parts
                }
            };
            for (lhs, ty) in assign.lhs.iter().zip(parts.into_iter()) {
                if let ExprKind::Ident(ident) = &lhs.kind {
                    self.env.declare(&ident.name, ty);
                }
            }
            return;
        }
        for (i, lhs) in assign.lhs.iter().enumerate() {
            if let ExprKind::Ident(ident) = &lhs.kind {
                let ty = assign
                    .rhs
                    .get(i)
                    .map(|rhs| type_of(rhs, &self.env, self.ctx))
                    .unwrap_or(Ty::Invalid);
                self.env.declare(&ident.name, ty);
            }
        }
    }

    fn bind_range(&mut self, range_stmt: &RangeStmt) {
        let ranged = type_of(&range_stmt.expr, &self.env, self.ctx);
        let (key_ty, value_ty) = match self.ctx.underlying(&ranged) {
            Ty::Slice(elem) => (Ty::Basic("int"), *elem),
            Ty::Array(_, elem) => (Ty::Basic("int"), *elem),
            Ty::Map(key, value) => (*key, *value),
            Ty::Chan(_, elem) => (*elem, Ty::Invalid),
            Ty::Basic("string") => (Ty::Basic("int"), Ty::Basic("rune")),
            Ty::Basic("int") => (Ty::Basic("int"), Ty::Invalid),
            _ => (Ty::Invalid, Ty::Invalid),
        };
        if let Some(ExprKind::Ident(ident)) = range_stmt.key.as_ref().map(|k| &k.kind) {
            self.env.declare(&ident.name, key_ty);
        }
        if let Some(ExprKind::Ident(ident)) = range_stmt.value.as_ref().map(|v| &v.kind) {
            self.env.declare(&ident.name, value_ty);
        }
    }

    /// `go`/`defer` operand: the call itself takes the spawn-like kind.
    fn walk_spawnlike(&mut self, expr: &Expr, kind: CallKind) {
        match &expr.unparen().kind {
            ExprKind::Call(call) => self.walk_call(call, kind),
            _ => {
                warn!(func = %self.name, "go/defer operand is not a call expression");
                self.walk_expr(expr);
            }
        }
    }

    fn walk_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Call(call) => self.walk_call(call, CallKind::Call),
            ExprKind::FuncLit(sig, body) => {
                self.queue_literal(sig, body);
            }
            ExprKind::Ident(_)
            | ExprKind::IntLit(_)
            | ExprKind::FloatLit(_)
            | ExprKind::ImagLit(_)
            | ExprKind::RuneLit(_)
            | ExprKind::StringLit(_)
            | ExprKind::TypeAsExpr(_) => {}
            ExprKind::Selector(base, _) => self.walk_expr(base),
            ExprKind::Index(base, indices) => {
                self.walk_expr(base);
                for index in indices {
                    self.walk_expr(index);
                }
            }
            ExprKind::Slice(base, parts) => {
                self.walk_expr(base);
                for part in parts.iter().flatten() {
                    self.walk_expr(part);
                }
            }
            ExprKind::Star(inner)
            | ExprKind::Unary(_, inner)
            | ExprKind::Paren(inner) => self.walk_expr(inner),
            ExprKind::Binary(_, lhs, rhs) => {
                self.walk_expr(lhs);
                self.walk_expr(rhs);
            }
            ExprKind::CompositeLit(_, elems) => {
                for elem in elems {
                    self.walk_expr(elem);
                }
            }
            ExprKind::KeyValue(key, value) => {
                self.walk_expr(key);
                self.walk_expr(value);
            }
            ExprKind::TypeAssert(inner, _) => self.walk_expr(inner),
        }
    }

    /// Queue a function literal for lowering; returns its canonical name.
    fn queue_literal(&mut self, sig: &FuncSig, body: &Block) -> String {
        self.anon_count += 1;
        let name = format!("{}${}", self.name, self.anon_count);
        self.queue.push(QueuedLit {
            name: name.clone(),
            sig: sig.clone(),
            body: body.clone(),
            env: self.env.clone(),
        });
        name
    }

    fn walk_call(&mut self, call: &CallExpr, kind: CallKind) {
        // Conversions are not calls in the lowered form.
        if conversion_target(call, &self.env, self.ctx).is_some() {
            for arg in &call.args {
                self.walk_expr(arg);
            }
            return;
        }

        let fun = call.fun.unparen();

        // Builtins that lower to memory/panic instructions, not calls.
        if let ExprKind::Ident(ident) = &fun.kind {
            if matches!(ident.name.as_str(), "make" | "new" | "panic")
                && self.env.lookup(&ident.name).is_none()
                && self.ctx.info.scope.lookup(&ident.name).is_none()
            {
                for arg in &call.args {
                    self.walk_expr(arg);
                }
                return;
            }
        }

        // Walk the callee operand's sub-expressions; the operand itself
        // is classified below, not emitted.
        let callee = match &fun.kind {
            ExprKind::FuncLit(sig, body) => {
                let name = self.queue_literal(sig, body);
                Callee::Static { name }
            }
            ExprKind::Selector(base, _) => {
                self.walk_expr(base);
                self.classify(fun)
            }
            ExprKind::Ident(_) | ExprKind::Index(..) => self.classify(fun),
            _ => {
                self.walk_expr(fun);
                self.classify(fun)
            }
        };

        for arg in &call.args {
            self.walk_expr(arg);
        }
        self.emit(kind, callee, call.span);
    }

    fn classify(&mut self, fun: &Expr) -> Callee {
        match &fun.unparen().kind {
            ExprKind::Ident(ident) => self.classify_ident(&ident.name),
            ExprKind::Selector(base, sel) => self.classify_selector(base, &sel.name),
            ExprKind::Index(base, indices) => {
                let inner = self.classify(base);
                match inner {
                    Callee::Static { name } => {
                        // Explicit generic instantiation.
                        let suffix = instantiation_suffix(indices, &self.env, self.ctx);
                        if let Some(key) = self.generic_key(base) {
                            self.observed.entry(key).or_default().insert(suffix.clone());
                        }
                        Callee::Static {
                            name: format!("{}{}", name, suffix),
                        }
                    }
                    _ => {
                        // Indexing into a collection of function values;
                        // the called value is the element.
                        for index in indices {
                            self.walk_expr(index);
                        }
                        let elem_ty = type_of(fun.unparen(), &self.env, self.ctx);
                        match self.ctx.underlying(&elem_ty) {
                            Ty::Func(_) => Callee::Dynamic {
                                operand: String::new(),
                                ty: elem_ty.display_qualified(),
                            },
                            _ => Callee::Unknown,
                        }
                    }
                }
            }
            _ => {
                let ty = type_of(fun, &self.env, self.ctx);
                match self.ctx.underlying(&ty) {
                    Ty::Func(_) => Callee::Dynamic {
                        operand: String::new(),
                        ty: ty.display_qualified(),
                    },
                    _ => Callee::Unknown,
                }
            }
        }
    }

    /// `(pkg_path, name)` when the indexed callee is a package-level
    /// generic function.
    fn generic_key(&self, base: &Expr) -> Option<(String, String)> {
        match &base.unparen().kind {
            ExprKind::Ident(ident) => {
                if self.env.lookup(&ident.name).is_some() {
                    return None;
                }
                let symbol = self.ctx.info.scope.lookup(&ident.name)?;
                (symbol.kind == SymbolKind::Func)
                    .then(|| (self.ctx.pkg_path.to_string(), ident.name.clone()))
            }
            ExprKind::Selector(qualifier, sel) => {
                let ExprKind::Ident(q) = &qualifier.unparen().kind else {
                    return None;
                };
                if self.env.lookup(&q.name).is_some() {
                    return None;
                }
                let path = self.ctx.import_qualifier(&q.name)?;
                Some((path.to_string(), sel.name.clone()))
            }
            _ => None,
        }
    }

    fn classify_ident(&mut self, name: &str) -> Callee {
        if let Some(ty) = self.env.lookup(name).cloned() {
            return Callee::Dynamic {
                operand: name.to_string(),
                ty: ty.display_qualified(),
            };
        }
        if let Some(symbol) = self.ctx.info.scope.lookup(name) {
            return match symbol.kind {
                SymbolKind::Func => Callee::Static {
                    name: format!("{}.{}", self.ctx.pkg_path, name),
                },
                SymbolKind::Var | SymbolKind::Const => Callee::Dynamic {
                    operand: name.to_string(),
                    ty: symbol
                        .ty
                        .as_ref()
                        .map(Ty::display_qualified)
                        .unwrap_or_else(|| "?".to_string()),
                },
                SymbolKind::Type => Callee::Unknown, // conversions are handled earlier
            };
        }
        if let Some(ty) = builtin_display(name) {
            return Callee::Dynamic {
                operand: name.to_string(),
                ty,
            };
        }
        warn!(func = %self.name, callee = %name, "cannot resolve call target");
        Callee::Unknown
    }

    fn classify_selector(&mut self, base: &Expr, sel: &str) -> Callee {
        // Package-qualified call.
        if let ExprKind::Ident(qualifier) = &base.unparen().kind {
            if self.env.lookup(&qualifier.name).is_none()
                && self.ctx.info.scope.lookup(&qualifier.name).is_none()
            {
                if let Some(path) = self.ctx.import_qualifier(&qualifier.name) {
                    let path = path.to_string();
                    if let Some(pkg) = self.ctx.universe.package(&path) {
                        if let Some(symbol) = pkg.scope.lookup(sel) {
                            return match symbol.kind {
                                SymbolKind::Func => Callee::Static {
                                    name: format!("{}.{}", path, sel),
                                },
                                SymbolKind::Var | SymbolKind::Const => Callee::Dynamic {
                                    operand: sel.to_string(),
                                    ty: symbol
                                        .ty
                                        .as_ref()
                                        .map(Ty::display_qualified)
                                        .unwrap_or_else(|| "?".to_string()),
                                },
                                SymbolKind::Type => Callee::Unknown,
                            };
                        }
                    }
                    // Outside the loaded universe: assume a plain function.
                    return Callee::Static {
                        name: format!("{}.{}", path, sel),
                    };
                }
            }
        }

        let recv_ty = type_of(base, &self.env, self.ctx);
        if recv_ty.is_invalid() {
            warn!(func = %self.name, method = %sel, "cannot type method call receiver");
            return Callee::Unknown;
        }
        if self.ctx.is_interface(&recv_ty) {
            return Callee::Invoke {
                method: sel.to_string(),
                recv_ty: recv_ty.display_qualified(),
            };
        }
        let mut base_ty = recv_ty.clone();
        if let Ty::Pointer(inner) = &base_ty {
            base_ty = (**inner).clone();
        }
        if let Some(named) = base_ty.named_ref().cloned() {
            if let Some((_, ptr_recv)) = self.ctx.method_sig(&named, sel) {
                let name = if ptr_recv {
                    format!("(*{}.{}).{}", named.pkg, named.name, sel)
                } else {
                    format!("({}.{}).{}", named.pkg, named.name, sel)
                };
                return Callee::Static { name };
            }
            if let Some(field_ty) = self.ctx.field_ty(&named, sel) {
                return Callee::Dynamic {
                    operand: sel.to_string(),
                    ty: field_ty.display_qualified(),
                };
            }
        }
        warn!(func = %self.name, method = %sel, "cannot resolve method call");
        Callee::Unknown
    }
}

/// Render `[T1, T2]` from explicit instantiation arguments.
fn instantiation_suffix(indices: &[Expr], env: &Env, ctx: &BodyCtx<'_>) -> String {
    let mut parts = Vec::with_capacity(indices.len());
    for index in indices {
        let rendered = match &index.kind {
            ExprKind::TypeAsExpr(ty) => ctx.resolve_type(ty).display_qualified(),
            ExprKind::Ident(ident) => {
                let as_ty = crate::frontend::ast::TypeExpr {
                    id: index.id,
                    kind: TypeExprKind::Name(Ident::new(&ident.name, ident.span)),
                    span: index.span,
                };
                ctx.resolve_type(&as_ty).display_qualified()
            }
            ExprKind::Selector(base, sel) => match &base.unparen().kind {
                ExprKind::Ident(qualifier) if env.lookup(&qualifier.name).is_none() => {
                    let as_ty = crate::frontend::ast::TypeExpr {
                        id: index.id,
                        kind: TypeExprKind::Qualified(
                            Ident::new(&qualifier.name, qualifier.span),
                            Ident::new(&sel.name, sel.span),
                        ),
                        span: index.span,
                    };
                    ctx.resolve_type(&as_ty).display_qualified()
                }
                _ => "?".to_string(),
            },
            _ => "?".to_string(),
        };
        parts.push(rendered);
    }
    format!("[{}]", parts.join(", "))
}

/// Synthetic display type for builtin callees.
fn builtin_display(name: &str) -> Option<String> {
    let display = match name {
        "len" | "cap" => "func(interface{}) int",
        "append" => "func([]T, ...T) []T",
        "copy" => "func([]T, []T) int",
        "delete" => "func(map[K]V, K)",
        "close" => "func(chan T)",
        "recover" => "func() interface{}",
        "print" | "println" => "func(...interface{})",
        "min" | "max" => "func(T, ...T) T",
        "clear" => "func(T)",
        _ => return None,
    };
    Some(display.to_string())
}
