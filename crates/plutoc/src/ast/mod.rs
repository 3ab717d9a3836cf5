//! The untyped AST: the input contract the core compiler consumes.
//!
//! This is the conventional shape for an indentation-structured language's
//! parser output — module, a closed set of statement kinds, and a closed
//! set of expression kinds — augmented with source spans. Producing it from
//! real source text is the front end's job (`front`), which is a thin,
//! out-of-scope-adjacent adapter, not part of the core; nothing downstream
//! of this module (inference, folding, code-gen) depends on the parser that
//! built it.

pub mod front;

use crate::{names::Name, span::Span};

#[derive(Debug, Clone)]
pub struct Module {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub span: Span,
    pub kind: StmtKind,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Assign { target: Name, value: Expr },
    AnnAssign { target: Name, annotation: TypeExpr, value: Option<Expr> },
    ExprStmt(Expr),
    If { test: Expr, body: Vec<Stmt>, orelse: Vec<Stmt> },
    For { target: Name, iter: Expr, body: Vec<Stmt> },
    Return(Option<Expr>),
    Assert { test: Expr, msg: Option<Expr> },
    Import { names: Vec<Name> },
}

/// A function parameter as written in the source: name, declared type, and
/// an optional default-value expression.
#[derive(Debug, Clone)]
pub struct Param {
    pub span: Span,
    pub name: Name,
    pub annotation: TypeExpr,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub span: Span,
    pub name: Name,
    pub params: Vec<Param>,
    pub returns: TypeExpr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: Name,
    pub annotation: TypeExpr,
}

/// A `class`-like definition: `RecordT` if it stands alone, the compiler
/// decides `SumT` grouping at inference time from how variants are
/// aggregated.
#[derive(Debug, Clone)]
pub struct ClassDef {
    pub span: Span,
    pub name: Name,
    /// Integer constructor tag, when explicitly declared (`CONSTR_ID = n`).
    pub constructor_tag: Option<i64>,
    pub fields: Vec<FieldDef>,
}

/// A type annotation as written in source — not yet resolved to a `Type`.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    Name(Name),
    /// `List[T]`
    Subscript { base: Name, args: Vec<TypeExpr> },
    /// `None` used as a type (the validator's ignored-argument convention).
    NoneType,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Debug, Clone)]
pub enum Literal {
    Int(num_bigint::BigInt),
    ByteString(Vec<u8>),
    Str(String),
    Bool(bool),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    FloorDiv,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    USub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
}

#[derive(Debug, Clone)]
pub struct Keyword {
    pub name: Name,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    Name(Name),
    BinOp { op: BinOp, left: Box<Expr>, right: Box<Expr> },
    UnOp { op: UnOp, operand: Box<Expr> },
    Compare { left: Box<Expr>, op: CmpOp, right: Box<Expr> },
    BoolOp { and: bool, values: Vec<Expr> },
    /// A call's positional arguments, followed by its keyword arguments in
    /// source order — inference validates "no positional after first
    /// keyword" from this ordering rather than from two separately-typed
    /// lists.
    Call { func: Box<Expr>, args: Vec<Expr>, keywords: Vec<Keyword> },
    Attribute { value: Box<Expr>, attr: Name },
    Subscript { value: Box<Expr>, index: Box<Expr> },
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Dict { keys: Vec<Expr>, values: Vec<Expr> },
    /// `a if test else b`
    IfExp { test: Box<Expr>, body: Box<Expr>, orelse: Box<Expr> },
    IsInstance { value: Box<Expr>, class: Name },
}
