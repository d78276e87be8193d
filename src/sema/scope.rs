// src/sema/scope.rs
//! Package-level symbol scope.

use crate::frontend::Span;
use crate::sema::types::Ty;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Type,
    Func,
    Var,
    Const,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub kind: SymbolKind,
    /// For funcs the function type; for vars/consts the declared or
    /// inferred type; absent when unknown.
    pub ty: Option<Ty>,
    /// Index of the defining file within the package.
    pub file: usize,
    pub span: Span,
}

/// Top-level scope of one package. A scope with no entries marks the
/// package as non-analyzable.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    symbols: FxHashMap<String, Symbol>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// First declaration wins, matching the duplicate policy used for
    /// abstraction extraction.
    pub fn declare(&mut self, name: &str, symbol: Symbol) {
        self.symbols.entry(name.to_string()).or_insert(symbol);
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Symbol names in deterministic (sorted) order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.symbols.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(kind: SymbolKind) -> Symbol {
        Symbol {
            kind,
            ty: None,
            file: 0,
            span: Span::default(),
        }
    }

    #[test]
    fn first_declaration_wins() {
        let mut scope = Scope::new();
        scope.declare("T", symbol(SymbolKind::Type));
        scope.declare("T", symbol(SymbolKind::Var));
        assert_eq!(scope.lookup("T").unwrap().kind, SymbolKind::Type);
    }

    #[test]
    fn names_are_sorted() {
        let mut scope = Scope::new();
        scope.declare("zeta", symbol(SymbolKind::Func));
        scope.declare("alpha", symbol(SymbolKind::Type));
        assert_eq!(scope.names(), vec!["alpha", "zeta"]);
    }
}
