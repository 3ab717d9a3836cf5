//! The constant-folding sandbox: a small tree-walking evaluator over the
//! literal-expression subset of the typed AST, plus a fixed, auditable
//! allowlist of pure built-in calls it may additionally evaluate, rather
//! than invoking a general host interpreter.
//!
//! Grounded on `opshin/optimize/optimize_const_folding.py`'s `SAFE_GLOBALS`
//! and its `exec(source, non_overwritten_globals(), constant_vars())` call,
//! reimplemented as a closed evaluator instead of a host `exec` — not
//! portable, and replaced here with this explicit evaluator.

use std::collections::{HashMap, HashSet};

use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::{
    ast::{BinOp, CmpOp, UnOp},
    names::Name,
    typed_ast::{Expr, ExprKind},
    types::ConstValue,
};

/// The sandbox's pure-call allowlist: a fixed, named set disjoint from
/// the full built-in catalog —
/// it excludes `print`/`breakpoint`, which are trace-emitting or otherwise
/// not pure, and `range`'s result is only evaluable here because its output
/// (a finite integer list) is itself an accepted foldable container.
pub const SAFE_GLOBALS: &[&str] = &["abs", "all", "any", "len", "sum", "range"];

/// The read-only environment a sandbox evaluation runs against: currently
/// known constants, shadowed by nothing the enclosing scopes have bound.
pub struct Env<'a> {
    pub constants: &'a HashMap<Name, ConstValue>,
    pub shadowed: &'a HashSet<Name>,
}

impl Env<'_> {
    fn lookup(&self, name: &Name) -> Option<&ConstValue> {
        if self.shadowed.contains(name) {
            return None;
        }
        self.constants.get(name)
    }
}

/// Attempts to evaluate `expr` to a constant value. Returns `None` — never
/// an error — on anything the sandbox cannot model; failure is always
/// silently tolerated by the caller.
#[must_use]
pub fn eval(expr: &Expr, env: &Env<'_>) -> Option<ConstValue> {
    match &expr.kind {
        ExprKind::Const(v) => Some(v.clone()),
        ExprKind::Name(name, _) => env.lookup(name).cloned(),
        ExprKind::UnOp { op, operand } => eval_unop(*op, eval(operand, env)?),
        ExprKind::BinOp { op, left, right } => eval_binop(*op, eval(left, env)?, eval(right, env)?),
        ExprKind::Compare { left, op, right } => eval_compare(*op, eval(left, env)?, eval(right, env)?),
        ExprKind::BoolOp { and, values } => eval_bool_op(*and, values, env),
        ExprKind::List(items) => items.iter().map(|e| eval(e, env)).collect::<Option<Vec<_>>>().map(ConstValue::List),
        ExprKind::Tuple(items) => items.iter().map(|e| eval(e, env)).collect::<Option<Vec<_>>>().map(ConstValue::List),
        ExprKind::Dict { keys, values } => {
            let keys: Vec<_> = keys.iter().map(|e| eval(e, env)).collect::<Option<_>>()?;
            let values: Vec<_> = values.iter().map(|e| eval(e, env)).collect::<Option<_>>()?;
            Some(ConstValue::Map(keys.into_iter().zip(values).collect()))
        }
        ExprKind::Subscript { value, index } => eval_subscript(eval(value, env)?, eval(index, env)?),
        ExprKind::IfExp { test, body, orelse } => {
            if is_truthy(&eval(test, env)?) {
                eval(body, env)
            } else {
                eval(orelse, env)
            }
        }
        ExprKind::Call { func, args, keywords } => {
            if !keywords.is_empty() {
                return None;
            }
            let ExprKind::Name(name, _) = &func.kind else { return None };
            if !SAFE_GLOBALS.contains(&name.as_str()) || env.shadowed.contains(name) {
                return None;
            }
            let args: Vec<_> = args.iter().map(|a| eval(a, env)).collect::<Option<_>>()?;
            eval_safe_call(name.as_str(), &args)
        }
        // Field access and isinstance on a folded record would require a
        // `ConstValue` variant carrying tag+fields; the prelude's record
        // types only ever describe live transaction data (never a
        // compile-time-known value in practice), so this is left unfolded
        // rather than modeled.
        ExprKind::Attribute { .. } | ExprKind::IsInstance { .. } => None,
    }
}

fn is_truthy(v: &ConstValue) -> bool {
    match v {
        ConstValue::Bool(b) => *b,
        ConstValue::Int(i) => !i.is_zero(),
        ConstValue::Str(s) => !s.is_empty(),
        ConstValue::ByteString(b) => !b.is_empty(),
        ConstValue::List(items) => !items.is_empty(),
        ConstValue::Map(items) => !items.is_empty(),
        ConstValue::Unit => false,
    }
}

fn eval_unop(op: UnOp, v: ConstValue) -> Option<ConstValue> {
    match (op, v) {
        (UnOp::Not, v) => Some(ConstValue::Bool(!is_truthy(&v))),
        (UnOp::USub, ConstValue::Int(i)) => Some(ConstValue::Int(-i)),
        _ => None,
    }
}

fn eval_binop(op: BinOp, left: ConstValue, right: ConstValue) -> Option<ConstValue> {
    use BinOp::{Add, BitAnd, BitOr, BitXor, FloorDiv, LShift, Mod, Mult, RShift, Sub};
    match (op, left, right) {
        (Add, ConstValue::Int(a), ConstValue::Int(b)) => Some(ConstValue::Int(a + b)),
        (Add, ConstValue::ByteString(mut a), ConstValue::ByteString(b)) => {
            a.extend(b);
            Some(ConstValue::ByteString(a))
        }
        (Add, ConstValue::Str(mut a), ConstValue::Str(b)) => {
            a.push_str(&b);
            Some(ConstValue::Str(a))
        }
        (Add, ConstValue::List(mut a), ConstValue::List(b)) => {
            a.extend(b);
            Some(ConstValue::List(a))
        }
        (Sub, ConstValue::Int(a), ConstValue::Int(b)) => Some(ConstValue::Int(a - b)),
        (Mult, ConstValue::Int(a), ConstValue::Int(b)) => Some(ConstValue::Int(a * b)),
        (FloorDiv, ConstValue::Int(a), ConstValue::Int(b)) if !b.is_zero() => Some(ConstValue::Int(a.div_floor(&b))),
        (Mod, ConstValue::Int(a), ConstValue::Int(b)) if !b.is_zero() => Some(ConstValue::Int(a.mod_floor(&b))),
        (BitAnd, ConstValue::Int(a), ConstValue::Int(b)) => Some(ConstValue::Int(a & b)),
        (BitOr, ConstValue::Int(a), ConstValue::Int(b)) => Some(ConstValue::Int(a | b)),
        (BitXor, ConstValue::Int(a), ConstValue::Int(b)) => Some(ConstValue::Int(a ^ b)),
        (LShift, ConstValue::Int(a), ConstValue::Int(b)) => Some(ConstValue::Int(a << b.to_u32()?)),
        (RShift, ConstValue::Int(a), ConstValue::Int(b)) => Some(ConstValue::Int(a >> b.to_u32()?)),
        _ => None,
    }
}

fn eval_compare(op: CmpOp, left: ConstValue, right: ConstValue) -> Option<ConstValue> {
    let ordering = match (&left, &right) {
        (ConstValue::Int(a), ConstValue::Int(b)) => a.partial_cmp(b)?,
        (ConstValue::ByteString(a), ConstValue::ByteString(b)) => a.cmp(b),
        (ConstValue::Str(a), ConstValue::Str(b)) => a.cmp(b),
        _ if matches!(op, CmpOp::Eq | CmpOp::NotEq) => {
            let eq = left == right;
            return Some(ConstValue::Bool(if matches!(op, CmpOp::Eq) { eq } else { !eq }));
        }
        _ => return None,
    };
    let result = match op {
        CmpOp::Eq => ordering.is_eq(),
        CmpOp::NotEq => !ordering.is_eq(),
        CmpOp::Lt => ordering.is_lt(),
        CmpOp::LtE => ordering.is_le(),
        CmpOp::Gt => ordering.is_gt(),
        CmpOp::GtE => ordering.is_ge(),
    };
    Some(ConstValue::Bool(result))
}

fn eval_bool_op(and: bool, values: &[Expr], env: &Env<'_>) -> Option<ConstValue> {
    let mut last = ConstValue::Bool(and);
    for value in values {
        last = eval(value, env)?;
        if is_truthy(&last) != and {
            return Some(last);
        }
    }
    Some(last)
}

fn eval_subscript(container: ConstValue, index: ConstValue) -> Option<ConstValue> {
    match (container, index) {
        (ConstValue::List(items), ConstValue::Int(i)) => {
            let i = i.to_i64()?;
            let idx = if i < 0 { items.len().checked_sub(i.unsigned_abs() as usize)? } else { i as usize };
            items.get(idx).cloned()
        }
        (ConstValue::Map(entries), key) => entries.into_iter().find(|(k, _)| *k == key).map(|(_, v)| v),
        _ => None,
    }
}

fn eval_safe_call(name: &str, args: &[ConstValue]) -> Option<ConstValue> {
    match (name, args) {
        ("abs", [ConstValue::Int(i)]) => Some(ConstValue::Int(i.abs())),
        ("len", [ConstValue::ByteString(b)]) => Some(ConstValue::Int(b.len().into())),
        ("len", [ConstValue::List(items)]) => Some(ConstValue::Int(items.len().into())),
        ("sum", [ConstValue::List(items)]) => {
            let mut total = num_bigint::BigInt::from(0);
            for item in items {
                let ConstValue::Int(i) = item else { return None };
                total += i;
            }
            Some(ConstValue::Int(total))
        }
        ("all", [ConstValue::List(items)]) => Some(ConstValue::Bool(items.iter().all(is_truthy))),
        ("any", [ConstValue::List(items)]) => Some(ConstValue::Bool(items.iter().any(is_truthy))),
        ("range", [ConstValue::Int(limit)]) => {
            let limit = limit.to_i64()?;
            Some(ConstValue::List((0..limit).map(|i| ConstValue::Int(i.into())).collect()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;
    use crate::types::Type;

    fn int(v: i64) -> Expr {
        Expr { span: Span::synthetic(), ty: Type::instance(Type::Integer), kind: ExprKind::Const(ConstValue::Int(v.into())) }
    }

    fn env() -> (HashMap<Name, ConstValue>, HashSet<Name>) {
        (HashMap::new(), HashSet::new())
    }

    #[test]
    fn folds_simple_arithmetic() {
        let (constants, shadowed) = env();
        let e = Expr {
            span: Span::synthetic(),
            ty: Type::instance(Type::Integer),
            kind: ExprKind::BinOp { op: BinOp::Add, left: Box::new(int(2)), right: Box::new(int(3)) },
        };
        assert_eq!(eval(&e, &Env { constants: &constants, shadowed: &shadowed }), Some(ConstValue::Int(5.into())));
    }

    #[test]
    fn refuses_to_fold_shadowed_safe_global() {
        let (constants, mut shadowed) = env();
        shadowed.insert(Name::new("len"));
        let call = Expr {
            span: Span::synthetic(),
            ty: Type::instance(Type::Integer),
            kind: ExprKind::Call {
                func: Box::new(Expr { span: Span::synthetic(), ty: Type::instance(Type::Unit), kind: ExprKind::Name(Name::new("len"), crate::scope::ScopeHandle { frame: 0, slot: 0 }) }),
                args: vec![],
                keywords: vec![],
            },
        };
        assert_eq!(eval(&call, &Env { constants: &constants, shadowed: &shadowed }), None);
    }
}
