// src/frontend/ast.rs

use crate::frontend::Span;
use std::path::PathBuf;

/// Unique identifier for type-expression and expression nodes within one
/// file. The checker's type table is keyed by `(file index, NodeId)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeId(pub u32);

/// An identifier with its source span.
#[derive(Debug, Clone)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// One parsed source file.
#[derive(Debug, Clone)]
pub struct File {
    /// Absolute path, set by the loader.
    pub path: PathBuf,
    pub package: Ident,
    pub package_doc: String,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
}

/// A single import line: `alias "path"` or `"path"`.
#[derive(Debug, Clone)]
pub struct ImportSpec {
    pub alias: Option<Ident>,
    pub path: String,
    pub span: Span,
}

/// Top-level and statement-level declarations.
#[derive(Debug, Clone)]
pub enum Decl {
    Type(TypeDecl),
    Func(FuncDecl),
    Var(ValueDecl),
    Const(ValueDecl),
}

/// `type` declaration, single or grouped.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub specs: Vec<TypeSpec>,
    pub span: Span,
}

/// One `Name = T` or `Name T` inside a type declaration.
#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub doc: String,
    pub name: Ident,
    pub type_params: Vec<TypeParamDecl>,
    pub is_alias: bool,
    pub ty: TypeExpr,
    pub span: Span,
}

/// A type parameter group: `T, U constraint`.
#[derive(Debug, Clone)]
pub struct TypeParamDecl {
    pub names: Vec<Ident>,
    pub constraint: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub doc: String,
    pub recv: Option<Receiver>,
    pub name: Ident,
    pub type_params: Vec<TypeParamDecl>,
    pub sig: FuncSig,
    pub body: Option<Block>,
    pub span: Span,
}

/// Method receiver. Only the base type name matters for method-set
/// construction; type parameters on the receiver are ignored.
#[derive(Debug, Clone)]
pub struct Receiver {
    pub name: Option<Ident>,
    pub is_pointer: bool,
    pub base: Ident,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FuncSig {
    pub params: Vec<Field>,
    pub results: Vec<Field>,
    pub span: Span,
}

/// A field group, as in Go's ast.Field: parameters, results, struct
/// fields, and interface elements all share this shape. An interface
/// element with no names is an embedded interface; a struct field with no
/// names is an embedded field.
#[derive(Debug, Clone)]
pub struct Field {
    pub doc: String,
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
    pub span: Span,
}

/// `var` or `const` declaration, single or grouped.
#[derive(Debug, Clone)]
pub struct ValueDecl {
    pub doc: String,
    /// `go:` directive lines from the doc comment group (`go:embed ...`).
    pub directives: Vec<String>,
    pub specs: Vec<ValueSpec>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ValueSpec {
    pub doc: String,
    pub names: Vec<Ident>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<Expr>,
    pub span: Span,
}

/// Channel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub id: NodeId,
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TypeExprKind {
    /// `T`
    Name(Ident),
    /// `pkg.T`
    Qualified(Ident, Ident),
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `[]T`
    Slice(Box<TypeExpr>),
    /// `[N]T`
    Array(Box<Expr>, Box<TypeExpr>),
    /// `map[K]V`
    Map(Box<TypeExpr>, Box<TypeExpr>),
    /// `chan T`, `chan<- T`, `<-chan T`
    Chan(ChanDir, Box<TypeExpr>),
    /// `func(params) results`
    Func(Box<FuncSig>),
    /// `struct{...}`
    Struct(Vec<Field>),
    /// `interface{...}`
    Interface(Vec<Field>),
    /// `...T` (variadic parameter)
    Variadic(Box<TypeExpr>),
    /// `(T)`
    Paren(Box<TypeExpr>),
    /// `G[A, B]` (generic instantiation)
    Instantiated(Box<TypeExpr>, Vec<TypeExpr>),
    /// `~T` (constraint approximation element)
    Approx(Box<TypeExpr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,   // -
    Pos,   // +
    Not,   // !
    BitNot, // ^
    Addr,  // &
    Recv,  // <-
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    AndNot,
    Shl,
    Shr,
    LogicalAnd,
    LogicalOr,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Ident(Ident),
    IntLit(String),
    FloatLit(String),
    ImagLit(String),
    RuneLit(String),
    StringLit(String),
    /// `x.sel`
    Selector(Box<Expr>, Ident),
    Call(CallExpr),
    /// `x[i]` — also carries generic instantiations `f[T1, T2]`.
    Index(Box<Expr>, Vec<Expr>),
    /// `x[lo:hi]` / `x[lo:hi:max]`
    Slice(Box<Expr>, [Option<Box<Expr>>; 3]),
    /// `*x`
    Star(Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Paren(Box<Expr>),
    FuncLit(Box<FuncSig>, Box<Block>),
    /// `T{...}`; the type is absent for nested untyped literals.
    CompositeLit(Option<Box<TypeExpr>>, Vec<Expr>),
    /// `k: v` inside a composite literal
    KeyValue(Box<Expr>, Box<Expr>),
    /// `x.(T)`; the type is absent for `x.(type)` in type switches.
    TypeAssert(Box<Expr>, Option<Box<TypeExpr>>),
    /// A type in expression position (conversions such as `[]byte(s)`).
    TypeAsExpr(Box<TypeExpr>),
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub fun: Box<Expr>,
    pub args: Vec<Expr>,
    pub ellipsis: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Break,
    Continue,
    Goto,
    Fallthrough,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expr(Expr),
    /// `ch <- v`
    Send(Expr, Expr),
    /// `x++` / `x--` (the bool is true for increment)
    IncDec(Expr, bool),
    Assign(AssignStmt),
    Decl(Box<Decl>),
    Go(Expr),
    Defer(Expr),
    Return(Vec<Expr>, Span),
    Branch(BranchKind, Option<Ident>, Span),
    Block(Block),
    If(IfStmt),
    For(ForStmt),
    Range(RangeStmt),
    Switch(SwitchStmt),
    TypeSwitch(TypeSwitchStmt),
    Select(SelectStmt),
    Labeled(Ident, Box<Stmt>),
    Empty,
}

#[derive(Debug, Clone)]
pub struct AssignStmt {
    pub lhs: Vec<Expr>,
    pub rhs: Vec<Expr>,
    /// True for `:=`.
    pub define: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Expr,
    pub then: Block,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Option<Expr>,
    pub post: Option<Box<Stmt>>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct RangeStmt {
    pub key: Option<Expr>,
    pub value: Option<Expr>,
    pub define: bool,
    pub expr: Expr,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct SwitchStmt {
    pub init: Option<Box<Stmt>>,
    pub tag: Option<Expr>,
    pub cases: Vec<CaseClause>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct CaseClause {
    /// Empty for `default`.
    pub exprs: Vec<Expr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeSwitchStmt {
    pub init: Option<Box<Stmt>>,
    /// Binding name in `switch v := x.(type)`.
    pub binding: Option<Ident>,
    pub subject: Expr,
    pub cases: Vec<TypeCaseClause>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeCaseClause {
    /// Empty for `default`.
    pub types: Vec<TypeExpr>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct SelectStmt {
    pub cases: Vec<CommClause>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct CommClause {
    /// The send or receive statement; absent for `default`.
    pub comm: Option<Box<Stmt>>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl Expr {
    /// Strip parentheses.
    pub fn unparen(&self) -> &Expr {
        match &self.kind {
            ExprKind::Paren(inner) => inner.unparen(),
            _ => self,
        }
    }
}

impl TypeExpr {
    /// Strip parentheses.
    pub fn unparen(&self) -> &TypeExpr {
        match &self.kind {
            TypeExprKind::Paren(inner) => inner.unparen(),
            _ => self,
        }
    }

    /// Short node-kind tag used in `?<kind>` fallback rendering.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            TypeExprKind::Name(_) => "name",
            TypeExprKind::Qualified(..) => "qualified",
            TypeExprKind::Pointer(_) => "pointer",
            TypeExprKind::Slice(_) => "slice",
            TypeExprKind::Array(..) => "array",
            TypeExprKind::Map(..) => "map",
            TypeExprKind::Chan(..) => "chan",
            TypeExprKind::Func(_) => "func",
            TypeExprKind::Struct(_) => "struct",
            TypeExprKind::Interface(_) => "interface",
            TypeExprKind::Variadic(_) => "variadic",
            TypeExprKind::Paren(_) => "paren",
            TypeExprKind::Instantiated(..) => "instantiated",
            TypeExprKind::Approx(_) => "approx",
        }
    }
}
