//! Inference-pass error variants. Every variant is fatal; the
//! pass boundary (`infer::infer_module`) wraps exactly one of these into a
//! `Diagnostic` per failing visit, never more than once.

use crate::{
    builtins::len::LenError,
    diagnostics::{Diagnostic, Nestable},
    infer::signature::SignatureError,
    types::Type,
};

#[derive(Debug, Clone)]
pub enum InferError {
    /// An AST node shape this subset of the language does not support.
    UnsupportedNode(&'static str),
    UndefinedName(String),
    NotCallable(Type),
    TypeMismatch { expected: Type, actual: Type },
    UnknownAttribute { ty: Type, attr: String },
    UnknownClass(String),
    /// A `CONSTR_ID`-tagged class used where a plain record was expected,
    /// or vice versa, during sum-type aggregation.
    NotARecordOrSum(Type),
    /// The `validator` entry point declared a parameter with a default
    /// value — the entry point's signature is fixed by the host and may
    /// not carry default arguments.
    ValidatorHasDefault(crate::names::Name),
    Signature(SignatureError),
    Len(LenError),
    /// An error already wrapped into a `Diagnostic` by a recursive visit —
    /// re-raised unchanged rather than wrapped a second time.
    Nested(Box<Diagnostic>),
}

impl std::fmt::Display for InferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferError::UnsupportedNode(what) => write!(f, "unsupported construct: {what}"),
            InferError::UndefinedName(name) => write!(f, "name '{name}' is not defined"),
            InferError::NotCallable(ty) => write!(f, "value of type {ty} is not callable"),
            InferError::TypeMismatch { expected, actual } => write!(f, "expected {expected}, found {actual}"),
            InferError::UnknownAttribute { ty, attr } => write!(f, "{ty} has no field '{attr}'"),
            InferError::UnknownClass(name) => write!(f, "'{name}' is not a defined class"),
            InferError::NotARecordOrSum(ty) => write!(f, "{ty} is not a record or sum type"),
            InferError::ValidatorHasDefault(name) => write!(f, "validator parameter '{name}' may not declare a default value"),
            InferError::Signature(e) => write!(f, "{e}"),
            InferError::Len(e) => write!(f, "{e}"),
            InferError::Nested(d) => write!(f, "{d}"),
        }
    }
}

impl std::error::Error for InferError {}

impl Nestable for InferError {
    fn nested(self) -> Result<Diagnostic, Self> {
        match self {
            InferError::Nested(d) => Ok(*d),
            other => Err(other),
        }
    }
}

impl From<SignatureError> for InferError {
    fn from(e: SignatureError) -> Self {
        InferError::Signature(e)
    }
}

impl From<LenError> for InferError {
    fn from(e: LenError) -> Self {
        InferError::Len(e)
    }
}
