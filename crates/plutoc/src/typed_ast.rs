//! The typed AST: the untyped AST (`ast::Module`) with every expression
//! resolved to a `Type` and every name occurrence resolved to a
//! `ScopeHandle`. This is inference's output and folding/code-gen's
//! shared input — neither later pass re-resolves a name or re-infers a type.
//!
//! Shares `ast`'s literal and operator enums verbatim (those carry no
//! resolution-dependent state); everything that names a variable, calls a
//! function, or projects a field gets its own node here because resolution
//! adds a field to it.

use std::rc::Rc;

use crate::{
    ast::{BinOp, CmpOp, UnOp},
    names::Name,
    scope::ScopeHandle,
    span::Span,
    types::{ConstValue, Type, record::RecordSchema},
};

pub struct Module {
    pub body: Vec<Stmt>,
}

pub struct Stmt {
    pub span: Span,
    pub kind: StmtKind,
}

pub enum StmtKind {
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Assign { target: Name, handle: ScopeHandle, value: Expr },
    AnnAssign { target: Name, handle: ScopeHandle, value: Option<Expr> },
    ExprStmt(Expr),
    If { test: Expr, body: Vec<Stmt>, orelse: Vec<Stmt> },
    For { target: Name, handle: ScopeHandle, iter: Expr, body: Vec<Stmt> },
    Return(Option<Expr>),
    Assert { test: Expr, msg: Option<Expr> },
    /// Resolved to the prelude bindings it refers to; carries no behavior of
    /// its own once resolution has checked every name exists.
    Import { names: Vec<(Name, ScopeHandle)> },
}

#[derive(Clone)]
pub struct Param {
    pub span: Span,
    pub name: Name,
    pub handle: ScopeHandle,
    pub ty: Type,
    pub default: Option<Expr>,
}

pub struct FunctionDef {
    pub span: Span,
    pub name: Name,
    /// The binding for the function's own name, in the *enclosing* scope.
    pub handle: ScopeHandle,
    pub params: Vec<Param>,
    pub ret: Type,
    pub body: Vec<Stmt>,
}

/// A resolved `class`-like definition — by the time inference produces one
/// of these, the "does this stand alone or join a `SumT`" decision has
/// already been made; `schema` is this class's own tagged shape either way.
pub struct ClassDef {
    pub span: Span,
    pub schema: Rc<RecordSchema>,
}

#[derive(Clone)]
pub struct Expr {
    pub span: Span,
    pub ty: Type,
    pub kind: ExprKind,
}

#[derive(Clone)]
pub struct Keyword {
    pub name: Name,
    pub value: Expr,
}

#[derive(Clone)]
pub enum ExprKind {
    /// A compile-time-known value: a literal as written in source, or a
    /// subtree the folding pass proved equivalent to one — both
    /// lower to the same IR `Constant` leaf, so code-gen only has one
    /// variant to handle instead of a literal/folded-constant split.
    Const(ConstValue),
    Name(Name, ScopeHandle),
    BinOp { op: BinOp, left: Box<Expr>, right: Box<Expr> },
    UnOp { op: UnOp, operand: Box<Expr> },
    Compare { left: Box<Expr>, op: CmpOp, right: Box<Expr> },
    BoolOp { and: bool, values: Vec<Expr> },
    Call { func: Box<Expr>, args: Vec<Expr>, keywords: Vec<Keyword> },
    /// `attr`'s projection resolved to its positional index in the record —
    /// field access lowers to a positional projection.
    Attribute { value: Box<Expr>, attr: Name, field_index: usize },
    Subscript { value: Box<Expr>, index: Box<Expr> },
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Dict { keys: Vec<Expr>, values: Vec<Expr> },
    IfExp { test: Box<Expr>, body: Box<Expr>, orelse: Box<Expr> },
    /// `class`'s matched variant resolved to its constructor tag, so
    /// code-gen compares against a constant instead of a name.
    IsInstance { value: Box<Expr>, class: Name, tag: i64 },
}
