// src/sema/mod.rs
//! Type information for loaded packages: scopes, named types, method
//! sets, expression typing, and the satisfaction predicate.

pub mod check;
pub mod infer;
pub mod satisfy;
pub mod scope;
pub mod types;

pub use check::{check_package, IfaceMethod, InterfaceShape, NamedTypeDef, PackageInfo, Underlying};
pub use satisfy::{SatisfyCtx, Universe};
pub use scope::{Scope, Symbol, SymbolKind};
pub use types::{FuncTy, NamedRef, Ty};
