//! Code-generation error variants. Unlike inference and
//! folding, code-gen runs after both have already rejected anything the
//! type system can't place, so its own failures are narrow: a call whose
//! callee carries no parameter names recorded anywhere reachable from this
//! module (should not happen for a well-typed program, but code-gen does
//! not re-trust that without checking), or a bare reference to a class used
//! as if it were a runtime value.

use crate::{
    builtins::len::LenError,
    diagnostics::{Diagnostic, Nestable},
    infer::signature::SignatureError,
};

#[derive(Debug, Clone)]
pub enum CodegenError {
    /// `entry_point` names no top-level function definition.
    UnknownEntryPoint(String),
    /// A class reference (e.g. `ScriptContext`) used as a bare value rather
    /// than called to construct one — classes have no IR representation of
    /// their own (see DESIGN.md).
    ClassUsedAsValue(String),
    /// A builtin referenced indirectly (assigned to a name, then called
    /// through that name) rather than called by its own literal name —
    /// code-gen's builtin dispatch is purely syntactic (see DESIGN.md).
    IndirectBuiltinCall(String),
    Len(LenError),
    Signature(SignatureError),
    /// An error already wrapped into a `Diagnostic` by a recursive visit.
    Nested(Box<Diagnostic>),
}

impl std::fmt::Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodegenError::UnknownEntryPoint(name) => write!(f, "entry point '{name}' has no top-level function definition"),
            CodegenError::ClassUsedAsValue(name) => write!(f, "'{name}' is a class and has no value outside of a call"),
            CodegenError::IndirectBuiltinCall(name) => write!(f, "'{name}' cannot be called indirectly through a variable"),
            CodegenError::Len(e) => write!(f, "{e}"),
            CodegenError::Signature(e) => write!(f, "{e}"),
            CodegenError::Nested(d) => write!(f, "{d}"),
        }
    }
}

impl std::error::Error for CodegenError {}

impl Nestable for CodegenError {
    fn nested(self) -> Result<Diagnostic, Self> {
        match self {
            CodegenError::Nested(d) => Ok(*d),
            other => Err(other),
        }
    }
}

impl From<LenError> for CodegenError {
    fn from(e: LenError) -> Self {
        CodegenError::Len(e)
    }
}

impl From<SignatureError> for CodegenError {
    fn from(e: SignatureError) -> Self {
        CodegenError::Signature(e)
    }
}
