//! The VM's target IR: an untyped lambda calculus with `Delay`/`Force`
//! and a closed, first-class set of built-ins. All nodes are immutable once
//! built — the IR is constructed bottom-up in a single pass (code-gen) and
//! then handed to the (out-of-scope) binary serializer.

use std::rc::Rc;

use crate::{names::Name, types::ConstValue};

/// The VM primitives the catalogued built-ins and code-gen's lowering
/// rules expand into. This is the VM's actual closed primitive set,
/// not the source-level prelude — `len`/`sum`/`all`/`any`/`range` are
/// catalogued *combinations* of these, not primitives themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum VmBuiltin {
    AddInteger,
    SubtractInteger,
    MultiplyInteger,
    QuotientInteger,
    RemainderInteger,
    LessThanInteger,
    LessThanEqualsInteger,
    EqualsInteger,
    LengthOfByteString,
    EqualsByteString,
    IfThenElse,
    Trace,
    ChooseList,
    MkCons,
    HeadList,
    TailList,
    NullList,
    ConstrData,
    UnConstrData,
    EqualsData,
    /// Projects a pair's first component. `UnConstrData` yields `(tag,
    /// fields)` — pairs are one of the VM's primitive value kinds; field
    /// access and `isinstance` both need to project out of that pair.
    FstPair,
    SndPair,
    /// Byte-string concatenation (`bytes.__add__`, a binary operator).
    AppendByteString,
    /// Text concatenation. The VM's "string" kind is carried the same
    /// way a byte string is; code-gen reuses `EqualsByteString` for string
    /// equality rather than duplicating a parallel primitive (see
    /// DESIGN.md).
    AppendString,
    /// Bitwise operators over integers: `&`/`|`/`^`/`<<`/`>>` are legal
    /// integer operators, resolved via built-in codegen recipes keyed by
    /// (operator, operand types); the VM needs a primitive for each.
    AndInteger,
    OrInteger,
    XorInteger,
    ShiftLeftInteger,
    ShiftRightInteger,
}

/// The IR tree. `Var` carries the textual name the enclosing `Lambda`
/// bound it under — the scope handle in the typed AST resolves *which*
/// binding a name refers to, and code-gen renders that resolution as this
/// name, pairing a resolved scope index with a rendered identifier the way
/// a deBruijn-indexed representation pairs an index with a binder.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Var(Name),
    Lambda(Name, Rc<Term>),
    Apply(Rc<Term>, Rc<Term>),
    Delay(Rc<Term>),
    Force(Rc<Term>),
    Constant(ConstValue),
    BuiltIn(VmBuiltin),
    /// The VM's terminating computation. `assert` lowers a failed assertion
    /// to a traced `Error`, aborting the whole program rather than
    /// producing any value.
    Error,
}

impl Term {
    #[must_use]
    pub fn var(name: impl Into<Name>) -> Term {
        Term::Var(name.into())
    }

    #[must_use]
    pub fn lambda(name: impl Into<Name>, body: Term) -> Term {
        Term::Lambda(name.into(), Rc::new(body))
    }

    /// Builds nested single-parameter lambdas from a parameter list, in the
    /// manner of `eopsin/util.py`'s `plt.Lambda(["xs", "_"], ...)` sugar —
    /// the VM itself only has single-argument lambdas.
    #[must_use]
    pub fn multi_lambda(names: impl IntoIterator<Item = Name>, body: Term) -> Term {
        let mut names: Vec<_> = names.into_iter().collect();
        let mut term = body;
        while let Some(name) = names.pop() {
            term = Term::lambda(name, term);
        }
        term
    }

    #[must_use]
    pub fn apply(func: Term, arg: Term) -> Term {
        Term::Apply(Rc::new(func), Rc::new(arg))
    }

    /// Left-associative application of `args` to `func`, one parameter at a
    /// time.
    #[must_use]
    pub fn apply_all(func: Term, args: impl IntoIterator<Item = Term>) -> Term {
        args.into_iter().fold(func, Term::apply)
    }

    #[must_use]
    pub fn delay(term: Term) -> Term {
        Term::Delay(Rc::new(term))
    }

    #[must_use]
    pub fn force(term: Term) -> Term {
        Term::Force(Rc::new(term))
    }

    #[must_use]
    pub fn constant(value: ConstValue) -> Term {
        Term::Constant(value)
    }

    #[must_use]
    pub fn builtin(b: VmBuiltin) -> Term {
        Term::BuiltIn(b)
    }

    #[must_use]
    pub fn error() -> Term {
        Term::Error
    }

    /// Builds a closed list constant term from already-compiled elements, in
    /// the manner of `eopsin`'s list-literal lowering: `MkCons`-folded from
    /// the right, bottoming out at the empty list.
    #[must_use]
    pub fn list(items: Vec<Term>) -> Term {
        items
            .into_iter()
            .rev()
            .fold(Term::constant(ConstValue::List(vec![])), |acc, item| Term::apply_all(Term::builtin(VmBuiltin::MkCons), [item, acc]))
    }

    /// `Ite(cond, then, else)` built from the VM's `IfThenElse` primitive,
    /// forcing the chosen branch. Used by `if`/`elif`/`else` and `assert`.
    #[must_use]
    pub fn ite(cond: Term, then: Term, orelse: Term) -> Term {
        Term::force(Term::apply_all(
            Term::builtin(VmBuiltin::IfThenElse),
            [cond, Term::delay(then), Term::delay(orelse)],
        ))
    }

    /// A self-application fixpoint combinator, `Delay`/`Force`-guarded so
    /// the self-application is not unfolded until the recursive call is
    /// actually demanded. `build` receives a term that, applied to an
    /// argument, recurses.
    #[must_use]
    pub fn fix(build: impl FnOnce(Term) -> Term) -> Term {
        let self_apply = Term::force(Term::apply(Term::var("self"), Term::var("self")));
        let recurse = Term::lambda("v", Term::apply(self_apply, Term::var("v")));
        let step = Term::lambda("self", Term::delay(build(recurse)));
        Term::force(Term::apply(step.clone(), step))
    }

    /// The `arity`-ary generalization of [`Term::fix`] — a recursive call
    /// that takes several arguments at once, for code-gen's dynamic list
    /// indexing and map lookup, which recurse on more than one value
    /// (the remaining list *and* a count, or the remaining list *and* a
    /// target key).
    #[must_use]
    pub fn fix_n(arity: usize, build: impl FnOnce(Term) -> Term) -> Term {
        let self_apply = Term::force(Term::apply(Term::var("self"), Term::var("self")));
        let params: Vec<Name> = (0..arity).map(|i| Name::new(format!("_fix{i}"))).collect();
        let recurse_body = Term::apply_all(self_apply, params.iter().cloned().map(Term::var));
        let recurse = Term::multi_lambda(params, recurse_body);
        let step = Term::lambda("self", Term::delay(build(recurse)));
        Term::force(Term::apply(step.clone(), step))
    }

    /// Renders this term in the on-chain VM's textual UPLC syntax — the
    /// form a human reads at a terminal, not the binary encoding the (out
    /// of scope) serializer produces. Used only by the CLI.
    #[must_use]
    pub fn to_uplc_text(&self) -> String {
        self.to_string()
    }

    /// A right fold over a cons-list built from `ChooseList`/`HeadList`/`TailList`:
    /// `fold_list(xs, step, zero) = step(head(xs), fold_list(tail(xs), step, zero))`,
    /// or `zero` once `xs` is empty. The shape `for x in xs: body` and the
    /// `len`/`sum`/`all`/`any` recipes all reduce to this.
    #[must_use]
    pub fn fold_list(list: Term, step: impl FnOnce(Term, Term) -> Term, zero: Term) -> Term {
        let go = Term::fix(move |recurse| {
            Term::lambda(
                "xs",
                Term::force(Term::apply_all(
                    Term::builtin(VmBuiltin::ChooseList),
                    [
                        Term::var("xs"),
                        Term::delay(zero),
                        Term::delay(step(
                            Term::apply(Term::builtin(VmBuiltin::HeadList), Term::var("xs")),
                            Term::apply(recurse, Term::apply(Term::builtin(VmBuiltin::TailList), Term::var("xs"))),
                        )),
                    ],
                )),
            )
        });
        Term::apply(go, list)
    }
}

impl std::fmt::Display for Term {
    /// Renders the tree in the on-chain VM's textual UPLC syntax, the same
    /// S-expression-ish form the real tool prints for debugging (`(lam x
    /// body)`, `[f x]`, `(force t)`, `(delay t)`, `(builtin name)`, `(con
    /// ...)`, `(error)`). Builtin names follow the VM's own lowerCamelCase
    /// convention rather than `VmBuiltin`'s Rust-idiomatic variant names.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Var(name) => write!(f, "{name}"),
            Term::Lambda(name, body) => write!(f, "(lam {name} {body})"),
            Term::Apply(func, arg) => write!(f, "[{func} {arg}]"),
            Term::Delay(inner) => write!(f, "(delay {inner})"),
            Term::Force(inner) => write!(f, "(force {inner})"),
            Term::Constant(value) => write!(f, "{value}"),
            Term::BuiltIn(b) => write!(f, "(builtin {})", vm_builtin_uplc_name(*b)),
            Term::Error => write!(f, "(error)"),
        }
    }
}

/// The VM's own lowerCamelCase spelling for each primitive, distinct from
/// `VmBuiltin`'s `strum::Display` (used internally for debug output and
/// error messages, where the Rust-idiomatic spelling reads better).
fn vm_builtin_uplc_name(b: VmBuiltin) -> &'static str {
    match b {
        VmBuiltin::AddInteger => "addInteger",
        VmBuiltin::SubtractInteger => "subtractInteger",
        VmBuiltin::MultiplyInteger => "multiplyInteger",
        VmBuiltin::QuotientInteger => "quotientInteger",
        VmBuiltin::RemainderInteger => "remainderInteger",
        VmBuiltin::LessThanInteger => "lessThanInteger",
        VmBuiltin::LessThanEqualsInteger => "lessThanEqualsInteger",
        VmBuiltin::EqualsInteger => "equalsInteger",
        VmBuiltin::LengthOfByteString => "lengthOfByteString",
        VmBuiltin::EqualsByteString => "equalsByteString",
        VmBuiltin::IfThenElse => "ifThenElse",
        VmBuiltin::Trace => "trace",
        VmBuiltin::ChooseList => "chooseList",
        VmBuiltin::MkCons => "mkCons",
        VmBuiltin::HeadList => "headList",
        VmBuiltin::TailList => "tailList",
        VmBuiltin::NullList => "nullList",
        VmBuiltin::ConstrData => "constrData",
        VmBuiltin::UnConstrData => "unConstrData",
        VmBuiltin::EqualsData => "equalsData",
        VmBuiltin::FstPair => "fstPair",
        VmBuiltin::SndPair => "sndPair",
        VmBuiltin::AppendByteString => "appendByteString",
        VmBuiltin::AppendString => "appendString",
        VmBuiltin::AndInteger => "andInteger",
        VmBuiltin::OrInteger => "orInteger",
        VmBuiltin::XorInteger => "xorInteger",
        VmBuiltin::ShiftLeftInteger => "shiftLeftInteger",
        VmBuiltin::ShiftRightInteger => "shiftRightInteger",
    }
}

#[cfg(test)]
mod display_tests {
    use super::*;
    use num_bigint::BigInt;

    #[test]
    fn a_lambda_applied_to_a_constant_renders_as_uplc_text() {
        let term = Term::apply(Term::lambda("x", Term::var("x")), Term::constant(ConstValue::Int(BigInt::from(5))));
        assert_eq!(term.to_uplc_text(), "[(lam x x) (con integer 5)]");
    }

    #[test]
    fn a_builtin_renders_with_its_uplc_name() {
        let term = Term::builtin(VmBuiltin::AddInteger);
        assert_eq!(term.to_string(), "(builtin addInteger)");
    }

    #[test]
    fn error_renders_bare() {
        assert_eq!(Term::error().to_string(), "(error)");
    }
}
