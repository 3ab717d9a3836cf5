//! Expression lowering: every `ExprKind` variant to an `ir::Term`.

use num_bigint::BigInt;

use crate::{
    ast::{BinOp, CmpOp, UnOp},
    builtins::{len, BuiltinFn},
    codegen::{CodegenError, Defs, SiblingGroup},
    infer::signature::{self, ArgSource},
    ir::{Term, VmBuiltin},
    names::Name,
    scope::ScopeHandle,
    types::Type,
    typed_ast::{Expr, ExprKind},
};

/// Renders a resolved `(name, handle)` occurrence to the IR variable this
/// binding's `let`/`lambda` was introduced under — unique per handle, so
/// Python's own same-name rebinding (shadowing) never collides in the
/// flattened IR.
pub(crate) fn rendered_name(name: &Name, handle: ScopeHandle) -> Name {
    Name::new(format!("{}_{}_{}", name.as_str(), handle.frame, handle.slot))
}

pub(crate) fn compile_expr(expr: &Expr, groups: &[SiblingGroup], defs: &Defs) -> Result<Term, CodegenError> {
    match &expr.kind {
        ExprKind::Const(value) => Ok(Term::constant(value.clone())),
        ExprKind::Name(name, handle) => compile_name(name, *handle, groups),
        ExprKind::UnOp { op, operand } => {
            let v = compile_expr(operand, groups, defs)?;
            Ok(compile_unop(*op, v))
        }
        ExprKind::BinOp { op, left, right } => {
            let l = compile_expr(left, groups, defs)?;
            let r = compile_expr(right, groups, defs)?;
            Ok(compile_binop(*op, left.ty.as_class(), l, r))
        }
        ExprKind::Compare { left, op, right } => {
            let l = compile_expr(left, groups, defs)?;
            let r = compile_expr(right, groups, defs)?;
            Ok(compile_compare(*op, left.ty.as_class(), l, r))
        }
        ExprKind::BoolOp { and, values } => {
            let values = values.iter().map(|v| compile_expr(v, groups, defs)).collect::<Result<Vec<_>, _>>()?;
            Ok(compile_boolop(*and, values))
        }
        ExprKind::Call { func, args, keywords } => compile_call(func, args, keywords, groups, defs),
        ExprKind::Attribute { value, field_index, .. } => {
            let v = compile_expr(value, groups, defs)?;
            Ok(nth_static(fields_of(v), *field_index))
        }
        ExprKind::Subscript { value, index } => compile_subscript(value, index, groups, defs),
        ExprKind::List(items) | ExprKind::Tuple(items) => {
            let items = items.iter().map(|i| compile_expr(i, groups, defs)).collect::<Result<Vec<_>, _>>()?;
            Ok(Term::list(items))
        }
        ExprKind::Dict { keys, values } => {
            let pairs = keys
                .iter()
                .zip(values)
                .map(|(k, v)| Ok(Term::list(vec![compile_expr(k, groups, defs)?, compile_expr(v, groups, defs)?])))
                .collect::<Result<Vec<_>, CodegenError>>()?;
            Ok(Term::list(pairs))
        }
        ExprKind::IfExp { test, body, orelse } => {
            let test = compile_expr(test, groups, defs)?;
            let body = compile_expr(body, groups, defs)?;
            let orelse = compile_expr(orelse, groups, defs)?;
            Ok(Term::ite(test, body, orelse))
        }
        ExprKind::IsInstance { value, tag, .. } => {
            let v = compile_expr(value, groups, defs)?;
            Ok(compile_isinstance(v, *tag))
        }
    }
}

/// A frame-0 handle is never an ordinary local binding — it is either the
/// literal `len` (callable only directly, never through a variable),
/// another catalogued builtin (dispatched to its closed recipe), or a bare
/// prelude class reference, which has no value of its own outside a call
/// (see `CodegenError::ClassUsedAsValue`).
fn compile_name(name: &Name, handle: ScopeHandle, groups: &[SiblingGroup]) -> Result<Term, CodegenError> {
    for group in groups {
        if let Some(&position) = group.positions.get(&(handle.frame, handle.slot)) {
            return Ok(nth_static(group.tuple.clone(), position));
        }
    }
    if handle.frame == 0 {
        if name.as_str() == "len" {
            return Err(CodegenError::IndirectBuiltinCall(name.to_string()));
        }
        return match BuiltinFn::from_name(name.as_str()) {
            Some(b) => Ok(b.recipe()),
            None => Err(CodegenError::ClassUsedAsValue(name.to_string())),
        };
    }
    Ok(Term::var(rendered_name(name, handle)))
}

fn compile_unop(op: UnOp, v: Term) -> Term {
    match op {
        UnOp::Not => not(v),
        UnOp::USub => Term::apply_all(Term::builtin(VmBuiltin::SubtractInteger), [int_lit(0), v]),
    }
}

fn compile_binop(op: BinOp, operand_ty: &Type, a: Term, b: Term) -> Term {
    match (op, operand_ty) {
        (BinOp::Add, Type::Integer) => Term::apply_all(Term::builtin(VmBuiltin::AddInteger), [a, b]),
        (BinOp::Sub, Type::Integer) => Term::apply_all(Term::builtin(VmBuiltin::SubtractInteger), [a, b]),
        (BinOp::Mult, Type::Integer) => Term::apply_all(Term::builtin(VmBuiltin::MultiplyInteger), [a, b]),
        (BinOp::FloorDiv, Type::Integer) => floor_divmod(a, b, false),
        (BinOp::Mod, Type::Integer) => floor_divmod(a, b, true),
        (BinOp::BitAnd, Type::Integer) => Term::apply_all(Term::builtin(VmBuiltin::AndInteger), [a, b]),
        (BinOp::BitOr, Type::Integer) => Term::apply_all(Term::builtin(VmBuiltin::OrInteger), [a, b]),
        (BinOp::BitXor, Type::Integer) => Term::apply_all(Term::builtin(VmBuiltin::XorInteger), [a, b]),
        (BinOp::LShift, Type::Integer) => Term::apply_all(Term::builtin(VmBuiltin::ShiftLeftInteger), [a, b]),
        (BinOp::RShift, Type::Integer) => Term::apply_all(Term::builtin(VmBuiltin::ShiftRightInteger), [a, b]),
        (BinOp::Add, Type::ByteString) => Term::apply_all(Term::builtin(VmBuiltin::AppendByteString), [a, b]),
        (BinOp::Add, Type::String) => Term::apply_all(Term::builtin(VmBuiltin::AppendString), [a, b]),
        (BinOp::Add, Type::List(elem)) => {
            let _ = elem;
            Term::fold_list(a, move |head, acc| Term::apply_all(Term::builtin(VmBuiltin::MkCons), [head, acc]), b)
        }
        (op, ty) => unreachable!("inference only types {op:?} over operands code-gen has a recipe for, got {ty}"),
    }
}

/// Python's `//`/`%` floor toward negative infinity; the VM's
/// `QuotientInteger`/`RemainderInteger` truncate toward zero like C. The two
/// agree whenever the remainder is zero or the operands share a sign;
/// otherwise the truncating result is off by one and gets corrected (see
/// DESIGN.md).
fn floor_divmod(a: Term, b: Term, want_mod: bool) -> Term {
    let_("__a", a, |a| {
        let_("__b", b, move |b| {
            let_(
                "__q",
                Term::apply_all(Term::builtin(VmBuiltin::QuotientInteger), [a.clone(), b.clone()]),
                move |q| {
                    let_(
                        "__r",
                        Term::apply_all(Term::builtin(VmBuiltin::RemainderInteger), [a, b.clone()]),
                        move |r| {
                            let needs_adjust = and2(not(eq_int(r.clone(), int_lit(0))), xor2(lt(r.clone(), int_lit(0)), lt(b.clone(), int_lit(0))));
                            if want_mod {
                                Term::ite(needs_adjust, Term::apply_all(Term::builtin(VmBuiltin::AddInteger), [r.clone(), b]), r)
                            } else {
                                Term::ite(needs_adjust, Term::apply_all(Term::builtin(VmBuiltin::SubtractInteger), [q.clone(), int_lit(1)]), q)
                            }
                        },
                    )
                },
            )
        })
    })
}

fn let_(name: &str, value: Term, body: impl FnOnce(Term) -> Term) -> Term {
    Term::apply(Term::lambda(name, body(Term::var(name))), value)
}

fn int_lit(n: i64) -> Term {
    Term::constant(crate::types::ConstValue::Int(BigInt::from(n)))
}

fn lt(a: Term, b: Term) -> Term {
    Term::apply_all(Term::builtin(VmBuiltin::LessThanInteger), [a, b])
}

fn eq_int(a: Term, b: Term) -> Term {
    Term::apply_all(Term::builtin(VmBuiltin::EqualsInteger), [a, b])
}

fn not(t: Term) -> Term {
    Term::ite(t, Term::constant(crate::types::ConstValue::Bool(false)), Term::constant(crate::types::ConstValue::Bool(true)))
}

fn and2(a: Term, b: Term) -> Term {
    Term::ite(a, b, Term::constant(crate::types::ConstValue::Bool(false)))
}

fn xor2(a: Term, b: Term) -> Term {
    Term::ite(a, not(b), b)
}

fn compile_compare(op: CmpOp, ty: &Type, a: Term, b: Term) -> Term {
    match op {
        CmpOp::Lt => lt(a, b),
        CmpOp::LtE => Term::apply_all(Term::builtin(VmBuiltin::LessThanEqualsInteger), [a, b]),
        CmpOp::Gt => not(Term::apply_all(Term::builtin(VmBuiltin::LessThanEqualsInteger), [a, b])),
        CmpOp::GtE => not(lt(a, b)),
        CmpOp::Eq => compile_equals(ty, a, b),
        CmpOp::NotEq => not(compile_equals(ty, a, b)),
    }
}

/// Structural equality dispatched by static type. Integers and
/// byte-strings use their own VM primitives; text reuses byte-string
/// equality (see DESIGN.md); unit always compares equal but still sequences
/// both operands to preserve any side effect buried in an `IfExp`-folded
/// branch; containers and records/sums recurse.
fn compile_equals(ty: &Type, a: Term, b: Term) -> Term {
    match ty {
        Type::Integer => Term::apply_all(Term::builtin(VmBuiltin::EqualsInteger), [a, b]),
        Type::ByteString | Type::String => Term::apply_all(Term::builtin(VmBuiltin::EqualsByteString), [a, b]),
        Type::Bool => let_("__a", a, |av| let_("__b", b, |bv| Term::ite(av, bv.clone(), not(bv)))),
        Type::Unit => let_("_", a, |_| let_("_", b, |_| Term::constant(crate::types::ConstValue::Bool(true)))),
        Type::List(elem) => list_equals(elem, a, b),
        Type::Map(key, value) => map_entries_equal(key, value, a, b),
        Type::Record(_) | Type::Sum(_) => Term::apply_all(Term::builtin(VmBuiltin::EqualsData), [a, b]),
        other => unreachable!("'==' is never type-checked over a bare {other}"),
    }
}

fn list_equals(elem_ty: &Type, a: Term, b: Term) -> Term {
    let elem_ty = elem_ty.clone();
    list_equals_with(a, b, move |x, y| compile_equals(&elem_ty, x, y))
}

/// A map's runtime representation is a cons-list of two-element
/// `[key, value]` lists (see DESIGN.md — the closed VM primitive set has no
/// way to *construct* a native pair, only to project one out of
/// `UnConstrData`'s result, so an association list is the only buildable
/// encoding). Entry equality is key-equality and-ed with value-equality.
fn map_entries_equal(key_ty: &Type, value_ty: &Type, a: Term, b: Term) -> Term {
    let key_ty = key_ty.clone();
    let value_ty = value_ty.clone();
    list_equals_with(a, b, move |x, y| {
        let kx = Term::apply(Term::builtin(VmBuiltin::HeadList), x.clone());
        let ky = Term::apply(Term::builtin(VmBuiltin::HeadList), y.clone());
        let vx = Term::apply(Term::builtin(VmBuiltin::HeadList), Term::apply(Term::builtin(VmBuiltin::TailList), x));
        let vy = Term::apply(Term::builtin(VmBuiltin::HeadList), Term::apply(Term::builtin(VmBuiltin::TailList), y));
        and2(compile_equals(&key_ty, kx, ky), compile_equals(&value_ty, vx, vy))
    })
}

/// Recurses two cons-lists in lockstep, comparing element-by-element via
/// `elem_eq` and requiring equal length.
fn list_equals_with(a: Term, b: Term, elem_eq: impl Fn(Term, Term) -> Term + 'static) -> Term {
    Term::apply_all(
        Term::fix_n(2, move |recurse| {
            Term::multi_lambda([Name::new("_xs"), Name::new("_ys")], {
                let xs = Term::var("_xs");
                let ys = Term::var("_ys");
                Term::ite(
                    Term::apply(Term::builtin(VmBuiltin::NullList), xs.clone()),
                    Term::apply(Term::builtin(VmBuiltin::NullList), ys.clone()),
                    Term::ite(
                        Term::apply(Term::builtin(VmBuiltin::NullList), ys.clone()),
                        Term::constant(crate::types::ConstValue::Bool(false)),
                        and2(
                            elem_eq(
                                Term::apply(Term::builtin(VmBuiltin::HeadList), xs.clone()),
                                Term::apply(Term::builtin(VmBuiltin::HeadList), ys.clone()),
                            ),
                            Term::apply_all(
                                recurse,
                                [
                                    Term::apply(Term::builtin(VmBuiltin::TailList), xs),
                                    Term::apply(Term::builtin(VmBuiltin::TailList), ys),
                                ],
                            ),
                        ),
                    ),
                )
            })
        }),
        [a, b],
    )
}

fn compile_boolop(and: bool, values: Vec<Term>) -> Term {
    let mut values = values.into_iter();
    let first = values.next().expect("a BoolOp always carries at least one value");
    values.fold(first, |acc, v| if and { and2(acc, v) } else { Term::ite(acc, Term::constant(crate::types::ConstValue::Bool(true)), v) })
}

fn unconstr(v: Term) -> Term {
    Term::apply(Term::builtin(VmBuiltin::UnConstrData), v)
}

fn tag_of(v: Term) -> Term {
    Term::apply(Term::builtin(VmBuiltin::FstPair), unconstr(v))
}

fn fields_of(v: Term) -> Term {
    Term::apply(Term::builtin(VmBuiltin::SndPair), unconstr(v))
}

fn compile_isinstance(v: Term, tag: i64) -> Term {
    Term::apply_all(Term::builtin(VmBuiltin::EqualsInteger), [tag_of(v), int_lit(tag)])
}

/// Projects a record's `index`-th field. The field count is small and fixed
/// per schema, so this unrolls to a static chain of `TailList` rather than
/// building a recursive term.
fn nth_static(list: Term, index: usize) -> Term {
    let mut t = list;
    for _ in 0..index {
        t = Term::apply(Term::builtin(VmBuiltin::TailList), t);
    }
    Term::apply(Term::builtin(VmBuiltin::HeadList), t)
}

/// `xs[i]` for a runtime-valued `i`: walks `i` cons-cells in, via a
/// `fix_n`-guarded recursive scan. Only non-negative indices terminate
/// correctly — a negative dynamic index runs off the end of the list, same
/// as a constant one would under the folder's own sandbox evaluator (see
/// DESIGN.md).
fn nth_dynamic(list: Term, index: Term) -> Term {
    Term::apply_all(
        Term::fix_n(2, |recurse| {
            Term::multi_lambda([Name::new("_xs"), Name::new("_i")], {
                let xs = Term::var("_xs");
                let i = Term::var("_i");
                Term::ite(
                    eq_int(i.clone(), int_lit(0)),
                    Term::apply(Term::builtin(VmBuiltin::HeadList), xs.clone()),
                    Term::apply_all(
                        recurse,
                        [
                            Term::apply(Term::builtin(VmBuiltin::TailList), xs),
                            Term::apply_all(Term::builtin(VmBuiltin::SubtractInteger), [i, int_lit(1)]),
                        ],
                    ),
                )
            })
        }),
        [list, index],
    )
}

/// Dict key lookup: a linear scan over the association list that aborts
/// with `Term::Error` on exhaustion, modeling Python's `KeyError` as an
/// unrecoverable program abort rather than a value the type system would
/// have to account for — this subset has no exceptions.
fn map_lookup(key_ty: &Type, assoc: Term, key: Term) -> Term {
    let key_ty = key_ty.clone();
    let_("__key", key, move |key| {
        Term::apply(
            Term::fix_n(1, move |recurse| {
                Term::lambda("_xs", {
                    let xs = Term::var("_xs");
                    Term::ite(
                        Term::apply(Term::builtin(VmBuiltin::NullList), xs.clone()),
                        Term::error(),
                        {
                            let entry = Term::apply(Term::builtin(VmBuiltin::HeadList), xs.clone());
                            let k = Term::apply(Term::builtin(VmBuiltin::HeadList), entry.clone());
                            let v = Term::apply(Term::builtin(VmBuiltin::HeadList), Term::apply(Term::builtin(VmBuiltin::TailList), entry));
                            Term::ite(
                                compile_equals(&key_ty, k, key.clone()),
                                v,
                                Term::apply(recurse, Term::apply(Term::builtin(VmBuiltin::TailList), xs)),
                            )
                        },
                    )
                })
            }),
            assoc,
        )
    })
}

fn compile_subscript(value: &Expr, index: &Expr, groups: &[SiblingGroup], defs: &Defs) -> Result<Term, CodegenError> {
    let v = compile_expr(value, groups, defs)?;
    let i = compile_expr(index, groups, defs)?;
    match value.ty.as_class() {
        Type::List(_) => Ok(nth_dynamic(v, i)),
        Type::Map(key, _) => Ok(map_lookup(key, v, i)),
        other => unreachable!("a subscript's base is always a list or map, got {other}"),
    }
}

fn as_name(expr: &Expr) -> Option<(&Name, ScopeHandle)> {
    match &expr.kind {
        ExprKind::Name(n, h) => Some((n, *h)),
        _ => None,
    }
}

fn compile_call(func: &Expr, args: &[Expr], keywords: &[crate::typed_ast::Keyword], groups: &[SiblingGroup], defs: &Defs) -> Result<Term, CodegenError> {
    match func.ty.as_class() {
        Type::Polymorphic(name) if name.as_str() == "len" => {
            let (_, recipe) = len::specialize(&args[0].ty)?;
            let arg = compile_expr(&args[0], groups, defs)?;
            Ok(Term::apply(recipe, arg))
        }
        Type::Record(schema) => {
            let params: Vec<crate::types::ParamSig> =
                schema.fields.iter().map(|f| crate::types::ParamSig { name: f.name.clone(), has_default: false }).collect();
            let keyword_names: Vec<Name> = keywords.iter().map(|k| k.name.clone()).collect();
            let sources = signature::bind_call(&params, args.len(), &keyword_names)?;
            let ordered = sources
                .iter()
                .map(|s| match s {
                    ArgSource::Positional(i) => compile_expr(&args[*i], groups, defs),
                    ArgSource::Keyword(i) => compile_expr(&keywords[*i].value, groups, defs),
                    ArgSource::Default => unreachable!("a record constructor's fields never carry a default"),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Term::apply_all(
                Term::builtin(VmBuiltin::ConstrData),
                [Term::constant(crate::types::ConstValue::Int(BigInt::from(schema.tag))), Term::list(ordered)],
            ))
        }
        Type::Function(_) => {
            let keyword_names: Vec<Name> = keywords.iter().map(|k| k.name.clone()).collect();
            let ordered = match as_name(func).and_then(|(_, handle)| defs.functions.get(&(handle.frame, handle.slot))) {
                Some(info) => {
                    let sources = signature::bind_call(&info.params, args.len(), &keyword_names)?;
                    sources
                        .iter()
                        .enumerate()
                        .map(|(i, s)| match s {
                            ArgSource::Positional(j) => compile_expr(&args[*j], groups, defs),
                            ArgSource::Keyword(j) => compile_expr(&keywords[*j].value, groups, defs),
                            ArgSource::Default => {
                                compile_expr(info.defaults[i].as_ref().expect("`bind_call` only emits `Default` for a parameter that has one"), groups, defs)
                            }
                        })
                        .collect::<Result<Vec<_>, _>>()?
                }
                // A builtin, or a first-class function value with no
                // registered parameter list — neither accepts keywords
                // (already enforced by inference's own call-checking).
                None => args.iter().map(|a| compile_expr(a, groups, defs)).collect::<Result<Vec<_>, _>>()?,
            };
            let func_term = compile_expr(func, groups, defs)?;
            Ok(Term::apply_all(func_term, ordered))
        }
        other => unreachable!("a call's callee is always `len`, a record class, or a function, got {other}"),
    }
}
