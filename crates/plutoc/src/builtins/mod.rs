//! The catalogued prelude built-ins: each is a *recipe* — a
//! fixed signature plus a closed IR lambda built from the VM's own closed
//! primitive set (`ir::VmBuiltin`), not a primitive of the VM itself.
//! `len` is the one polymorphic entry and lives in its own [`len`] module;
//! every other built-in here has one signature and one recipe.
//!
//! Grounded on `eopsin/util.py`'s `PythonBuiltIn` enum.

pub mod len;

use num_bigint::BigInt;

use crate::{
    ir::{Term, VmBuiltin},
    names::Name,
    scope::{Binding, ScopeStack},
    types::{ConstValue, FunctionType, Type},
};

/// Every non-polymorphic entry paired with its prelude name, for installing
/// the initial scope. Kept as a fixed literal list
/// rather than a derived `strum::EnumIter` — the catalog is closed and this
/// is the one place that needs to enumerate it, mirroring `from_name`.
const ALL: [(&str, BuiltinFn); 7] = [
    ("all", BuiltinFn::All),
    ("any", BuiltinFn::Any),
    ("abs", BuiltinFn::Abs),
    ("breakpoint", BuiltinFn::Breakpoint),
    ("print", BuiltinFn::Print),
    ("range", BuiltinFn::Range),
    ("sum", BuiltinFn::Sum),
];

/// Binds every catalogued built-in — the fixed set here plus the
/// polymorphic `len` — into the initial scope, before a script's own
/// top-level statements or the domain prelude (`prelude::install`) are
/// visited.
pub fn install(scope: &mut ScopeStack) {
    for (name, builtin) in ALL {
        let sig = builtin.signature();
        scope.bind(Name::new(name), Binding::new(Type::function(sig.params, sig.ret)));
    }
    scope.bind(Name::new("len"), Binding::new(Type::Polymorphic(Name::new("len"))));
}

/// The non-polymorphic prelude built-ins, minus `len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum BuiltinFn {
    All,
    Any,
    Abs,
    Breakpoint,
    Print,
    Range,
    Sum,
}

impl BuiltinFn {
    /// Looks up a built-in by its prelude name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<BuiltinFn> {
        match name {
            "all" => Some(BuiltinFn::All),
            "any" => Some(BuiltinFn::Any),
            "abs" => Some(BuiltinFn::Abs),
            "breakpoint" => Some(BuiltinFn::Breakpoint),
            "print" => Some(BuiltinFn::Print),
            "range" => Some(BuiltinFn::Range),
            "sum" => Some(BuiltinFn::Sum),
            _ => None,
        }
    }

    #[must_use]
    pub fn signature(self) -> FunctionType {
        let bool_list = Type::instance(Type::list_of(Type::Bool));
        let int_list = Type::instance(Type::list_of(Type::Integer));
        match self {
            BuiltinFn::All | BuiltinFn::Any => FunctionType { params: vec![bool_list], ret: Type::instance(Type::Bool) },
            BuiltinFn::Abs => FunctionType { params: vec![Type::instance(Type::Integer)], ret: Type::instance(Type::Integer) },
            BuiltinFn::Breakpoint => FunctionType { params: vec![], ret: Type::instance(Type::Unit) },
            BuiltinFn::Print => FunctionType { params: vec![Type::instance(Type::String)], ret: Type::instance(Type::Unit) },
            BuiltinFn::Range => FunctionType { params: vec![Type::instance(Type::Integer)], ret: int_list },
            BuiltinFn::Sum => FunctionType { params: vec![int_list], ret: Type::instance(Type::Integer) },
        }
    }

    /// Builds the closed IR term this built-in lowers to. Built-ins
    /// with at least one parameter lower to a `Lambda`; `breakpoint`, which
    /// takes none, lowers directly to the value it always returns — a call
    /// site with zero arguments never wraps it in an `Apply` (folding
    /// `apply_all` over an empty argument list is the identity).
    #[must_use]
    pub fn recipe(self) -> Term {
        match self {
            BuiltinFn::All => Term::lambda(
                "xs",
                Term::fold_list(Term::var("xs"), |x, acc| and(x, acc), Term::constant(ConstValue::Bool(true))),
            ),
            BuiltinFn::Any => Term::lambda(
                "xs",
                Term::fold_list(Term::var("xs"), |x, acc| or(x, acc), Term::constant(ConstValue::Bool(false))),
            ),
            BuiltinFn::Abs => Term::lambda(
                "x",
                Term::ite(
                    Term::apply_all(Term::builtin(VmBuiltin::LessThanInteger), [Term::var("x"), Term::constant(ConstValue::Int(BigInt::from(0)))]),
                    Term::apply_all(Term::builtin(VmBuiltin::SubtractInteger), [Term::constant(ConstValue::Int(BigInt::from(0))), Term::var("x")]),
                    Term::var("x"),
                ),
            ),
            BuiltinFn::Breakpoint => Term::constant(ConstValue::Unit),
            BuiltinFn::Print => Term::lambda(
                "x",
                Term::force(Term::apply_all(Term::builtin(VmBuiltin::Trace), [Term::var("x"), Term::delay(Term::constant(ConstValue::Unit))])),
            ),
            BuiltinFn::Range => Term::lambda("limit", {
                let step = Term::fix(|recurse| {
                    Term::lambda(
                        "i",
                        Term::ite(
                            Term::apply_all(Term::builtin(VmBuiltin::LessThanInteger), [Term::var("i"), Term::var("limit")]),
                            Term::apply_all(
                                Term::builtin(VmBuiltin::MkCons),
                                [
                                    Term::var("i"),
                                    Term::apply(
                                        recurse,
                                        Term::apply_all(
                                            Term::builtin(VmBuiltin::AddInteger),
                                            [Term::var("i"), Term::constant(ConstValue::Int(BigInt::from(1)))],
                                        ),
                                    ),
                                ],
                            ),
                            Term::constant(ConstValue::List(vec![])),
                        ),
                    )
                });
                Term::apply(step, Term::constant(ConstValue::Int(BigInt::from(0))))
            }),
            BuiltinFn::Sum => Term::lambda(
                "xs",
                Term::fold_list(
                    Term::var("xs"),
                    |x, acc| Term::apply_all(Term::builtin(VmBuiltin::AddInteger), [x, acc]),
                    Term::constant(ConstValue::Int(BigInt::from(0))),
                ),
            ),
        }
    }
}

/// Short-circuit-shaped `and`, built from `IfThenElse` (no native `And`
/// primitive exists in the VM's closed set).
fn and(a: Term, b: Term) -> Term {
    Term::ite(a, b, Term::constant(ConstValue::Bool(false)))
}

/// Short-circuit-shaped `or`, built from `IfThenElse`.
fn or(a: Term, b: Term) -> Term {
    Term::ite(a, Term::constant(ConstValue::Bool(true)), b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoint_takes_no_parameters() {
        assert_eq!(BuiltinFn::Breakpoint.signature().params.len(), 0);
        assert!(matches!(BuiltinFn::Breakpoint.recipe(), Term::Constant(ConstValue::Unit)));
    }

    #[test]
    fn range_is_unary_over_integers() {
        let sig = BuiltinFn::Range.signature();
        assert_eq!(sig.params, vec![Type::instance(Type::Integer)]);
        assert_eq!(sig.ret, Type::instance(Type::list_of(Type::Integer)));
    }

    #[test]
    fn from_name_round_trips_every_variant() {
        for (name, variant) in [
            ("all", BuiltinFn::All),
            ("any", BuiltinFn::Any),
            ("abs", BuiltinFn::Abs),
            ("breakpoint", BuiltinFn::Breakpoint),
            ("print", BuiltinFn::Print),
            ("range", BuiltinFn::Range),
            ("sum", BuiltinFn::Sum),
        ] {
            assert_eq!(BuiltinFn::from_name(name), Some(variant));
        }
        assert_eq!(BuiltinFn::from_name("len"), None);
    }
}
