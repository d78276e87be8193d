// src/analysis/format.rs
//! Signature formatting: stable, qualifier-aware display strings and
//! structured parameter/return records from syntax-level signatures.
//!
//! Rendering prefers the checker's type table; when an expression has no
//! resolved type it falls back to a syntax-directed renderer. Output is
//! never empty — unknowns render as `?` so downstream code needs no nil
//! checks.

use crate::datamodel::Parameter;
use crate::frontend::ast::*;
use crate::sema::check::render_const_expr;
use crate::sema::PackageInfo;

/// Formatting context: one file of one package.
#[derive(Clone, Copy)]
pub struct FmtCtx<'a> {
    pub pkg_path: &'a str,
    pub info: &'a PackageInfo,
    pub file: usize,
}

impl FmtCtx<'_> {
    /// Qualifier for a defining package path: empty for the current
    /// package, the local import name (honoring renames) otherwise.
    fn qualify(&self, pkg: &str) -> String {
        if pkg == self.pkg_path {
            String::new()
        } else {
            self.info.local_name_for(self.file, pkg)
        }
    }
}

/// Render a type expression as a display string.
pub fn type_display(expr: &TypeExpr, ctx: &FmtCtx<'_>) -> String {
    if let Some(ty) = ctx.info.lookup_type(ctx.file, expr.id) {
        if !ty.is_invalid() {
            return ty.display_with(&|pkg| ctx.qualify(pkg));
        }
    }
    syntax_display(expr, ctx)
}

/// Whether the expression is a direct pointer node; returns the rendered
/// base type when it is.
pub fn is_pointer(expr: &TypeExpr, ctx: &FmtCtx<'_>) -> (bool, String) {
    match &expr.kind {
        TypeExprKind::Pointer(inner) => (true, type_display(inner, ctx)),
        _ => (false, String::new()),
    }
}

/// `name(params) results` for a method.
pub fn method_signature(name: &str, sig: &FuncSig, ctx: &FmtCtx<'_>) -> String {
    format!("{}{}", name, func_type_display(sig, ctx))
}

/// `(params) results`. A single unnamed result omits its parentheses;
/// named or multiple results keep them.
pub fn func_type_display(sig: &FuncSig, ctx: &FmtCtx<'_>) -> String {
    let params = field_list(&sig.params, ctx);
    let results = field_list(&sig.results, ctx);
    let mut out = format!("({})", params.join(", "));
    if !results.is_empty() {
        let single_unnamed = sig.results.len() == 1 && sig.results[0].names.is_empty();
        if single_unnamed {
            out.push(' ');
            out.push_str(&results[0]);
        } else {
            out.push_str(&format!(" ({})", results.join(", ")));
        }
    }
    out
}

/// One rendered entry per field group: `a, b int` or `error`.
fn field_list(fields: &[Field], ctx: &FmtCtx<'_>) -> Vec<String> {
    let mut parts = Vec::with_capacity(fields.len());
    for field in fields {
        let ty = type_display(&field.ty, ctx);
        if field.names.is_empty() {
            parts.push(ty);
        } else {
            let names: Vec<&str> = field.names.iter().map(|n| n.name.as_str()).collect();
            parts.push(format!("{} {}", names.join(", "), ty));
        }
    }
    parts
}

/// Structured parameter records: one per named parameter, one per
/// unnamed parameter position.
pub fn parameters(sig: &FuncSig, ctx: &FmtCtx<'_>) -> Vec<Parameter> {
    let mut out = Vec::new();
    for field in &sig.params {
        let (ptr, base) = is_pointer(&field.ty, ctx);
        let ty = if ptr { base } else { type_display(&field.ty, ctx) };
        if field.names.is_empty() {
            out.push(Parameter {
                name: String::new(),
                ty: ty.clone(),
                is_pointer: ptr,
            });
        } else {
            for name in &field.names {
                out.push(Parameter {
                    name: name.name.clone(),
                    ty: ty.clone(),
                    is_pointer: ptr,
                });
            }
        }
    }
    out
}

/// Return type strings, arity-expanded: a group of names sharing a type
/// contributes one entry per name.
pub fn return_types(sig: &FuncSig, ctx: &FmtCtx<'_>) -> Vec<String> {
    let mut out = Vec::new();
    for field in &sig.results {
        let ty = type_display(&field.ty, ctx);
        let count = field.names.len().max(1);
        for _ in 0..count {
            out.push(ty.clone());
        }
    }
    out
}

/// Syntax-directed fallback renderer.
fn syntax_display(expr: &TypeExpr, ctx: &FmtCtx<'_>) -> String {
    match &expr.kind {
        TypeExprKind::Name(ident) => {
            if ident.name.is_empty() {
                "?".to_string()
            } else {
                ident.name.clone()
            }
        }
        TypeExprKind::Qualified(qualifier, name) => {
            format!("{}.{}", qualifier.name, name.name)
        }
        TypeExprKind::Pointer(inner) => format!("*{}", syntax_display(inner, ctx)),
        TypeExprKind::Slice(inner) => format!("[]{}", syntax_display(inner, ctx)),
        TypeExprKind::Array(len, inner) => {
            format!("[{}]{}", render_const_expr(len), syntax_display(inner, ctx))
        }
        TypeExprKind::Map(key, value) => format!(
            "map[{}]{}",
            syntax_display(key, ctx),
            syntax_display(value, ctx)
        ),
        TypeExprKind::Chan(ChanDir::Both, inner) => {
            format!("chan {}", syntax_display(inner, ctx))
        }
        TypeExprKind::Chan(ChanDir::Send, inner) => {
            format!("chan<- {}", syntax_display(inner, ctx))
        }
        TypeExprKind::Chan(ChanDir::Recv, inner) => {
            format!("<-chan {}", syntax_display(inner, ctx))
        }
        TypeExprKind::Func(sig) => format!("func{}", func_type_display(sig, ctx)),
        TypeExprKind::Struct(fields) => {
            if fields.is_empty() {
                "struct{}".to_string()
            } else {
                "struct{...}".to_string()
            }
        }
        TypeExprKind::Interface(elems) => {
            if elems.is_empty() {
                "interface{}".to_string()
            } else {
                "interface{...}".to_string()
            }
        }
        TypeExprKind::Variadic(inner) => format!("...{}", syntax_display(inner, ctx)),
        TypeExprKind::Paren(inner) => format!("({})", syntax_display(inner, ctx)),
        TypeExprKind::Instantiated(base, args) => {
            let rendered: Vec<String> = args.iter().map(|a| syntax_display(a, ctx)).collect();
            format!("{}[{}]", syntax_display(base, ctx), rendered.join(", "))
        }
        TypeExprKind::Approx(inner) => format!("~{}", syntax_display(inner, ctx)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::Parser;
    use crate::sema::check_package;

    const PKG: &str = "example.com/m/demo";

    fn with_iface_sig(source: &str, test: impl FnOnce(&FuncSig, FmtCtx<'_>)) {
        let (file, errors) = Parser::parse_file(source, "/tmp/demo.go");
        assert!(errors.is_empty(), "parse errors: {errors:?}");
        let info = check_package(PKG, std::slice::from_ref(&file));
        let ctx = FmtCtx {
            pkg_path: PKG,
            info: &info,
            file: 0,
        };
        let elems = file
            .decls
            .iter()
            .find_map(|decl| {
                let Decl::Type(type_decl) = decl else {
                    return None;
                };
                type_decl.specs.iter().find_map(|spec| match &spec.ty.kind {
                    TypeExprKind::Interface(elems) => Some(elems),
                    _ => None,
                })
            })
            .expect("interface decl");
        let method = elems.iter().find(|f| !f.names.is_empty()).expect("method");
        let TypeExprKind::Func(sig) = &method.ty.kind else {
            panic!("expected func type");
        };
        test(sig, ctx);
    }

    #[test]
    fn single_unnamed_result_omits_parens() {
        with_iface_sig(
            "package demo\n\ntype I interface { Name() string }\n",
            |sig, ctx| {
                assert_eq!(method_signature("Name", sig, &ctx), "Name() string");
            },
        );
    }

    #[test]
    fn multiple_results_keep_parens() {
        with_iface_sig(
            "package demo\n\ntype I interface { Read(p []byte) (int, error) }\n",
            |sig, ctx| {
                assert_eq!(
                    method_signature("Read", sig, &ctx),
                    "Read(p []byte) (int, error)"
                );
            },
        );
    }

    #[test]
    fn named_results_keep_parens() {
        with_iface_sig(
            "package demo\n\ntype I interface { Split() (head string) }\n",
            |sig, ctx| {
                assert_eq!(func_type_display(sig, &ctx), "() (head string)");
            },
        );
    }

    #[test]
    fn shared_type_parameter_group() {
        with_iface_sig(
            "package demo\n\ntype I interface { Add(a, b int) int }\n",
            |sig, ctx| {
                assert_eq!(func_type_display(sig, &ctx), "(a, b int) int");
                let params = parameters(sig, &ctx);
                assert_eq!(params.len(), 2);
                assert_eq!(params[0].name, "a");
                assert_eq!(params[1].name, "b");
                assert_eq!(params[0].ty, "int");
            },
        );
    }

    #[test]
    fn pointer_parameters_are_flagged() {
        with_iface_sig(
            "package demo\n\ntype Cfg struct{}\n\ntype I interface { Apply(c *Cfg) }\n",
            |sig, ctx| {
                let params = parameters(sig, &ctx);
                assert_eq!(params.len(), 1);
                assert!(params[0].is_pointer);
                assert_eq!(params[0].ty, "Cfg");
            },
        );
    }

    #[test]
    fn return_arity_expands_named_groups() {
        with_iface_sig(
            "package demo\n\ntype I interface { Pair() (x, y int) }\n",
            |sig, ctx| {
                assert_eq!(return_types(sig, &ctx), vec!["int", "int"]);
            },
        );
    }

    #[test]
    fn cross_package_types_use_local_import_name() {
        with_iface_sig(
            "package demo\n\nimport enc \"example.com/m/encoding\"\n\ntype I interface { Encode(v enc.Value) error }\n",
            |sig, ctx| {
                assert_eq!(func_type_display(sig, &ctx), "(v enc.Value) error");
            },
        );
    }

    #[test]
    fn variadic_renders_with_ellipsis() {
        with_iface_sig(
            "package demo\n\ntype I interface { Printf(format string, args ...interface{}) }\n",
            |sig, ctx| {
                assert_eq!(
                    func_type_display(sig, &ctx),
                    "(format string, args ...interface{})"
                );
            },
        );
    }

    #[test]
    fn chan_and_map_displays() {
        with_iface_sig(
            "package demo\n\ntype I interface { Watch(ch chan<- string) map[string]int }\n",
            |sig, ctx| {
                assert_eq!(
                    func_type_display(sig, &ctx),
                    "(ch chan<- string) map[string]int"
                );
            },
        );
    }
}
