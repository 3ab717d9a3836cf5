//! `len`'s polymorphic specialization: one recipe for byte-strings,
//! one for lists, chosen from the single argument's resolved instance type.
//! Grounded on `eopsin/util.py`'s `Len(PolymorphicFunction)`.

use num_bigint::BigInt;

use crate::{
    ir::{Term, VmBuiltin},
    types::{ConstValue, FunctionType, Type},
};

/// Raised when `len` is called on an argument type it has no recipe for.
#[derive(Debug, Clone)]
pub struct LenError(pub Type);

impl std::fmt::Display for LenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'len' is not implemented for type {}", self.0)
    }
}

impl std::error::Error for LenError {}

/// Specializes `len` for one argument's instance type, returning the
/// resolved signature and the closed recipe to apply it with.
pub fn specialize(arg: &Type) -> Result<(FunctionType, Term), LenError> {
    match arg.as_class() {
        Type::ByteString => {
            let sig = FunctionType { params: vec![arg.clone()], ret: Type::instance(Type::Integer) };
            let recipe = Term::lambda("x", Term::apply(Term::builtin(VmBuiltin::LengthOfByteString), Term::var("x")));
            Ok((sig, recipe))
        }
        Type::List(_) => {
            let sig = FunctionType { params: vec![arg.clone()], ret: Type::instance(Type::Integer) };
            let recipe = Term::lambda(
                "x",
                Term::fold_list(
                    Term::var("x"),
                    |_head, acc| Term::apply_all(Term::builtin(VmBuiltin::AddInteger), [acc, Term::constant(ConstValue::Int(BigInt::from(1)))]),
                    Term::constant(ConstValue::Int(BigInt::from(0))),
                ),
            );
            Ok((sig, recipe))
        }
        _ => Err(LenError(arg.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_string_len_rejects_nothing_else() {
        assert!(specialize(&Type::instance(Type::ByteString)).is_ok());
        assert!(specialize(&Type::instance(Type::list_of(Type::Integer))).is_ok());
        assert!(specialize(&Type::instance(Type::Bool)).is_err());
    }
}
