// src/flow/mod.rs
//! Normalized control-flow form.
//!
//! Every reachable function body lowers to a list of basic blocks whose
//! call-shaped instructions carry a classified callee and a position in
//! the shared position table. The form is deliberately minimal: the call
//! extractor is its only consumer.

pub mod lower;
pub mod positions;

pub use lower::lower_packages;
pub use positions::{PosId, Position, PositionTable};

/// The whole lowered universe.
#[derive(Debug, Default)]
pub struct FlowProgram {
    /// Functions in deterministic lowering order.
    pub functions: Vec<FlowFunc>,
}

impl FlowProgram {
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// One lowered function, method, or function literal.
#[derive(Debug)]
pub struct FlowFunc {
    /// Canonical name: `path.Func`, `(path.T).Method`, `(*path.T).Method`,
    /// `path.Func$1` for literals, `path.Func[int]` for instantiations.
    pub name: String,
    /// Import path of the owning package.
    pub pkg_path: String,
    pub blocks: Vec<BasicBlock>,
}

impl FlowFunc {
    pub fn has_body(&self) -> bool {
        !self.blocks.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct BasicBlock {
    pub instrs: Vec<Instr>,
}

/// The three call-shaped instruction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    Go,
    Defer,
}

#[derive(Debug)]
pub struct Instr {
    pub kind: CallKind,
    pub callee: Callee,
    pub pos: Option<PosId>,
}

/// Classified callee of a call-shaped instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callee {
    /// A known static callee, by canonical name.
    Static { name: String },
    /// Dynamic dispatch through an interface method.
    Invoke { method: String, recv_ty: String },
    /// A call through a function value.
    Dynamic { operand: String, ty: String },
    /// Nothing is known about the callee.
    Unknown,
}
