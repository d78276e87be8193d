// src/sema/types.rs
//! Resolved type representation.
//!
//! Types are structural values: two resolved types are the same type iff
//! they are equal. Named types are identified by their defining package's
//! import path plus the type name, which makes signature comparison across
//! packages a plain equality check.

use crate::frontend::ChanDir;

/// Reference to a named type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedRef {
    /// Import path of the defining package.
    pub pkg: String,
    pub name: String,
}

impl NamedRef {
    pub fn new(pkg: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            pkg: pkg.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncTy {
    pub params: Vec<Ty>,
    pub variadic: bool,
    pub results: Vec<Ty>,
}

impl FuncTy {
    pub fn nullary() -> Self {
        Self {
            params: Vec::new(),
            variadic: false,
            results: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    /// Predeclared types: `int`, `string`, `bool`, `error`, ...
    Basic(&'static str),
    Named(NamedRef),
    Pointer(Box<Ty>),
    Slice(Box<Ty>),
    /// Array with its length expression rendered as written (`[4]T`).
    Array(Option<String>, Box<Ty>),
    Map(Box<Ty>, Box<Ty>),
    Chan(ChanDir, Box<Ty>),
    Func(Box<FuncTy>),
    /// Anonymous struct; only emptiness is tracked (display abbreviates).
    Struct { empty: bool },
    /// Anonymous interface; only emptiness is tracked.
    Interface { empty: bool },
    /// A generic type parameter in scope.
    TypeParam(String),
    /// Generic instantiation `G[A, B]`.
    Instance(NamedRef, Vec<Ty>),
    /// Multiple values from a multi-result call; never a declared type.
    Tuple(Vec<Ty>),
    Invalid,
}

pub const BASIC_TYPES: &[&str] = &[
    "bool", "byte", "complex64", "complex128", "error", "float32", "float64", "int", "int8",
    "int16", "int32", "int64", "rune", "string", "uint", "uint8", "uint16", "uint32", "uint64",
    "uintptr", "any", "comparable",
];

pub fn basic_type(name: &str) -> Option<&'static str> {
    BASIC_TYPES.iter().find(|&&b| b == name).copied()
}

impl Ty {
    pub fn pointer(inner: Ty) -> Ty {
        Ty::Pointer(Box::new(inner))
    }

    /// The named reference at the core of this type, looking through one
    /// pointer level and generic instantiation.
    pub fn named_ref(&self) -> Option<&NamedRef> {
        match self {
            Ty::Named(named) => Some(named),
            Ty::Pointer(inner) => inner.named_ref(),
            Ty::Instance(named, _) => Some(named),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Ty::Invalid)
    }

    /// Render with a qualifier: for each named type the qualifier maps
    /// its defining package path to a prefix, the empty string meaning
    /// "no qualification".
    pub fn display_with(&self, qualify: &dyn Fn(&str) -> String) -> String {
        match self {
            Ty::Basic(name) => (*name).to_string(),
            Ty::Named(named) => {
                let prefix = qualify(&named.pkg);
                if prefix.is_empty() {
                    named.name.clone()
                } else {
                    format!("{}.{}", prefix, named.name)
                }
            }
            Ty::Pointer(inner) => format!("*{}", inner.display_with(qualify)),
            Ty::Slice(inner) => format!("[]{}", inner.display_with(qualify)),
            Ty::Array(len, inner) => format!(
                "[{}]{}",
                len.as_deref().unwrap_or(""),
                inner.display_with(qualify)
            ),
            Ty::Map(key, value) => format!(
                "map[{}]{}",
                key.display_with(qualify),
                value.display_with(qualify)
            ),
            Ty::Chan(ChanDir::Both, inner) => format!("chan {}", inner.display_with(qualify)),
            Ty::Chan(ChanDir::Send, inner) => format!("chan<- {}", inner.display_with(qualify)),
            Ty::Chan(ChanDir::Recv, inner) => format!("<-chan {}", inner.display_with(qualify)),
            Ty::Func(sig) => format!("func{}", sig.display_with(qualify)),
            Ty::Struct { empty: true } => "struct{}".to_string(),
            Ty::Struct { empty: false } => "struct{...}".to_string(),
            Ty::Interface { empty: true } => "interface{}".to_string(),
            Ty::Interface { empty: false } => "interface{...}".to_string(),
            Ty::TypeParam(name) => name.clone(),
            Ty::Instance(named, args) => {
                let base = Ty::Named(named.clone()).display_with(qualify);
                let rendered: Vec<String> =
                    args.iter().map(|a| a.display_with(qualify)).collect();
                format!("{}[{}]", base, rendered.join(", "))
            }
            Ty::Tuple(parts) => {
                let rendered: Vec<String> =
                    parts.iter().map(|p| p.display_with(qualify)).collect();
                format!("({})", rendered.join(", "))
            }
            Ty::Invalid => "?".to_string(),
        }
    }

    /// Render fully qualified by import path, the form used for call-site
    /// descriptions and cross-package identity.
    pub fn display_qualified(&self) -> String {
        self.display_with(&|pkg| pkg.to_string())
    }
}

impl FuncTy {
    pub fn display_with(&self, qualify: &dyn Fn(&str) -> String) -> String {
        let mut params: Vec<String> = Vec::with_capacity(self.params.len());
        for (i, param) in self.params.iter().enumerate() {
            let rendered = param.display_with(qualify);
            if self.variadic && i == self.params.len() - 1 {
                params.push(format!("...{}", rendered));
            } else {
                params.push(rendered);
            }
        }
        let mut out = format!("({})", params.join(", "));
        match self.results.len() {
            0 => {}
            1 => {
                out.push(' ');
                out.push_str(&self.results[0].display_with(qualify));
            }
            _ => {
                let rendered: Vec<String> =
                    self.results.iter().map(|r| r.display_with(qualify)).collect();
                out.push_str(&format!(" ({})", rendered.join(", ")));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_qualify(_: &str) -> String {
        String::new()
    }

    #[test]
    fn displays_compound_types() {
        let ty = Ty::Map(
            Box::new(Ty::Basic("string")),
            Box::new(Ty::Slice(Box::new(Ty::Pointer(Box::new(Ty::Named(
                NamedRef::new("example.com/m/pkg", "Item"),
            )))))),
        );
        assert_eq!(ty.display_with(&no_qualify), "map[string][]*Item");
        assert_eq!(
            ty.display_qualified(),
            "map[string][]*example.com/m/pkg.Item"
        );
    }

    #[test]
    fn displays_channel_directions() {
        let elem = Box::new(Ty::Basic("int"));
        assert_eq!(
            Ty::Chan(ChanDir::Send, elem.clone()).display_with(&no_qualify),
            "chan<- int"
        );
        assert_eq!(
            Ty::Chan(ChanDir::Recv, elem).display_with(&no_qualify),
            "<-chan int"
        );
    }

    #[test]
    fn func_display_single_unnamed_result() {
        let sig = FuncTy {
            params: vec![Ty::Basic("int")],
            variadic: false,
            results: vec![Ty::Basic("error")],
        };
        assert_eq!(sig.display_with(&no_qualify), "(int) error");
    }

    #[test]
    fn func_display_multiple_results() {
        let sig = FuncTy {
            params: vec![],
            variadic: false,
            results: vec![Ty::Basic("int"), Ty::Basic("error")],
        };
        assert_eq!(sig.display_with(&no_qualify), "() (int, error)");
    }

    #[test]
    fn variadic_parameter_display() {
        let sig = FuncTy {
            params: vec![Ty::Basic("string"), Ty::Slice(Box::new(Ty::Basic("byte")))],
            variadic: true,
            results: vec![],
        };
        assert_eq!(sig.display_with(&no_qualify), "(string, ...[]byte)");
    }

    #[test]
    fn named_identity_is_structural() {
        let a = Ty::Named(NamedRef::new("p", "T"));
        let b = Ty::Named(NamedRef::new("p", "T"));
        let c = Ty::Named(NamedRef::new("q", "T"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
