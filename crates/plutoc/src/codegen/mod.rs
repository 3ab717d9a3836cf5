//! Code generation: lowers a typed, folded module to the VM's IR
//! (`ir::Term`). Runs after inference and (optionally) constant folding —
//! neither of those passes' own errors can surface here; this pass's own
//! failures (see [`error::CodegenError`]) are narrow, since a well-typed
//! program has already ruled out almost everything that could go wrong.
//!
//! A statement list compiles by right-folding a "what happens next" term:
//! each ordinary statement binds (or evaluates, for an expression statement
//! or `assert`) and threads into the continuation built from the
//! statements after it, in the manner of a direct-style `let`-chain. Sibling
//! `def`s in the same statement list are the one exception — Python allows
//! them to call each other regardless of textual order (inference's
//! two-sweep pre-pass is what licenses this at the type level), which a
//! plain `let`-chain cannot express (each `let`'s bound value is built
//! *before* its own binder exists, so it can't reach a later sibling, and
//! reordering doesn't help — the problem is symmetric). They're compiled
//! together as a single self-referential tuple instead, grounded on the
//! classical Y-combinator-over-a-tuple encoding of mutual recursion; see
//! `compile_sibling_group` and DESIGN.md.

mod expr;
pub mod error;

use std::{collections::HashMap, rc::Rc};

use crate::{
    diagnostics::{wrap, Diagnostic, Pass},
    ir::{Term, VmBuiltin},
    names::Name,
    scope::ScopeHandle,
    span::Span,
    types::{ConstValue, ParamSig},
    typed_ast::{Expr, FunctionDef, Module, Stmt, StmtKind},
};

pub use error::CodegenError;
use expr::{compile_expr, rendered_name};

/// A function definition's parameter list and per-parameter default
/// expressions, keyed by the `def`'s own `(frame, slot)` handle — enough to
/// re-run keyword-argument resolution at each of its call sites without
/// needing the live `ScopeStack` inference built.
struct FuncInfo {
    params: Vec<ParamSig>,
    defaults: Vec<Option<Expr>>,
}

/// Every function definition's call information, collected once up front by
/// walking the whole module.
struct Defs {
    functions: HashMap<(u32, u32), Rc<FuncInfo>>,
}

/// One level of the mutual-recursion tuple encoding currently in scope:
/// which `(frame, slot)` handles are members of this group, at which
/// position, and the term that stands for "the whole group's tuple of
/// functions" from code compiled in this group's lexical reach.
#[derive(Clone)]
struct SiblingGroup {
    positions: HashMap<(u32, u32), usize>,
    tuple: Term,
}

/// Compiles a whole module to a single closed term, applicable to
/// `entry_point`'s own parameters plus one synthetic trailing argument
/// carrying host context.
pub fn compile_module(module: &Module, entry_point: &str) -> Result<Term, Diagnostic> {
    go(module, entry_point).map_err(|e| wrap(Pass::CodeGeneration, Span::synthetic(), "a module", e))
}

fn go(module: &Module, entry_point: &str) -> Result<Term, CodegenError> {
    let entry_handle =
        find_entry_handle(&module.body, entry_point).ok_or_else(|| CodegenError::UnknownEntryPoint(entry_point.to_string()))?;
    let mut functions = HashMap::new();
    collect_defs(&module.body, &mut functions);
    let defs = Defs { functions };
    let tail = Term::var(rendered_name(&Name::new(entry_point), entry_handle));
    compile_body(&module.body, tail, &[], Some(entry_handle), &defs)
}

fn find_entry_handle(body: &[Stmt], entry_point: &str) -> Option<ScopeHandle> {
    body.iter().find_map(|stmt| match &stmt.kind {
        StmtKind::FunctionDef(f) if f.name.as_str() == entry_point => Some(f.handle),
        _ => None,
    })
}

fn collect_defs(body: &[Stmt], map: &mut HashMap<(u32, u32), Rc<FuncInfo>>) {
    for stmt in body {
        match &stmt.kind {
            StmtKind::FunctionDef(f) => {
                let params = f.params.iter().map(|p| ParamSig { name: p.name.clone(), has_default: p.default.is_some() }).collect();
                let defaults = f.params.iter().map(|p| p.default.clone()).collect();
                map.insert((f.handle.frame, f.handle.slot), Rc::new(FuncInfo { params, defaults }));
                collect_defs(&f.body, map);
            }
            StmtKind::If { body, orelse, .. } => {
                collect_defs(body, map);
                collect_defs(orelse, map);
            }
            StmtKind::For { body, .. } => collect_defs(body, map),
            StmtKind::ClassDef(_)
            | StmtKind::Assign { .. }
            | StmtKind::AnnAssign { .. }
            | StmtKind::ExprStmt(_)
            | StmtKind::Return(_)
            | StmtKind::Assert { .. }
            | StmtKind::Import { .. } => {}
        }
    }
}

/// Compiles one scope's statement list into the term that runs it followed
/// by `tail`. Every sibling `def` directly in `stmts` is bound once,
/// as a group, ahead of the ordinary (non-`def`) statements — see the
/// module docs.
fn compile_body(
    stmts: &[Stmt],
    tail: Term,
    groups: &[SiblingGroup],
    entry_handle: Option<ScopeHandle>,
    defs: &Defs,
) -> Result<Term, CodegenError> {
    let siblings: Vec<&FunctionDef> = stmts
        .iter()
        .filter_map(|s| if let StmtKind::FunctionDef(f) = &s.kind { Some(f) } else { None })
        .collect();

    if siblings.is_empty() {
        return stmts.iter().rev().try_fold(tail, |acc, stmt| compile_ordinary_stmt(stmt, acc, groups, entry_handle, defs));
    }

    let group_name = rendered_name(&Name::new("fns"), siblings[0].handle);
    let positions: HashMap<(u32, u32), usize> = siblings.iter().enumerate().map(|(i, f)| ((f.handle.frame, f.handle.slot), i)).collect();

    let group_value = compile_sibling_group(&siblings, positions.clone(), groups, entry_handle, defs)?;

    let mut outer_groups = groups.to_vec();
    outer_groups.push(SiblingGroup { positions, tuple: Term::var(group_name.clone()) });
    let rest = stmts.iter().rev().try_fold(tail, |acc, stmt| compile_ordinary_stmt(stmt, acc, &outer_groups, entry_handle, defs))?;

    Ok(Term::apply(Term::lambda(group_name, rest), group_value))
}

/// Builds the closed tuple-of-functions value a mutually-recursive `def`
/// group lowers to: `fix(\self -> [f0(self), f1(self), ...])`, the classical
/// self-application encoding of `letrec` (no native `let` exists in the
/// target IR). Every member's own body resolves a reference to *any*
/// sibling (including itself) by projecting this same `self` positionally —
/// see [`expr::compile_expr`]'s `Name` case.
fn compile_sibling_group(
    siblings: &[&FunctionDef],
    positions: HashMap<(u32, u32), usize>,
    groups: &[SiblingGroup],
    entry_handle: Option<ScopeHandle>,
    defs: &Defs,
) -> Result<Term, CodegenError> {
    let mut internal_groups = groups.to_vec();
    internal_groups.push(SiblingGroup { positions, tuple: Term::var("self") });

    let members = siblings
        .iter()
        .map(|f| compile_function_def(f, Some(f.handle) == entry_handle, &internal_groups, entry_handle, defs))
        .collect::<Result<Vec<_>, _>>()?;

    let step = Term::lambda("self", Term::delay(Term::list(members)));
    Ok(Term::force(Term::apply(step.clone(), step)))
}

/// Lowers one function definition to a nested lambda over its parameters,
/// appending the validator's synthetic trailing parameter when `is_entry`.
fn compile_function_def(
    f: &FunctionDef,
    is_entry: bool,
    groups: &[SiblingGroup],
    entry_handle: Option<ScopeHandle>,
    defs: &Defs,
) -> Result<Term, CodegenError> {
    let mut param_names: Vec<Name> = f.params.iter().map(|p| rendered_name(&p.name, p.handle)).collect();
    let body = compile_body(&f.body, Term::constant(ConstValue::Unit), groups, entry_handle, defs)?;
    if is_entry {
        param_names.push(Name::new("_"));
    }
    Ok(Term::multi_lambda(param_names, body))
}

/// Compiles every statement kind except `def`/`class` (handled by the
/// group wrapper in [`compile_body`], which never calls this for them).
fn compile_ordinary_stmt(
    stmt: &Stmt,
    rest: Term,
    groups: &[SiblingGroup],
    entry_handle: Option<ScopeHandle>,
    defs: &Defs,
) -> Result<Term, CodegenError> {
    match &stmt.kind {
        StmtKind::FunctionDef(_) | StmtKind::ClassDef(_) => Ok(rest),
        StmtKind::Assign { target, handle, value } => {
            let value = compile_expr(value, groups, defs)?;
            Ok(Term::apply(Term::lambda(rendered_name(target, *handle), rest), value))
        }
        StmtKind::AnnAssign { target, handle, value } => match value {
            Some(value) => {
                let value = compile_expr(value, groups, defs)?;
                Ok(Term::apply(Term::lambda(rendered_name(target, *handle), rest), value))
            }
            // A bare `x: T` declares a type with no runtime value;
            // nothing to bind.
            None => Ok(rest),
        },
        StmtKind::ExprStmt(e) => {
            let value = compile_expr(e, groups, defs)?;
            Ok(Term::apply(Term::lambda("_", rest), value))
        }
        StmtKind::If { test, body, orelse } => {
            let test = compile_expr(test, groups, defs)?;
            let then_branch = compile_body(body, rest.clone(), groups, entry_handle, defs)?;
            let else_branch = compile_body(orelse, rest, groups, entry_handle, defs)?;
            Ok(Term::ite(test, then_branch, else_branch))
        }
        StmtKind::For { target, handle, iter, body } => {
            let iter = compile_expr(iter, groups, defs)?;
            compile_for(target, *handle, iter, body, rest, groups, entry_handle, defs)
        }
        StmtKind::Return(value) => match value {
            Some(value) => compile_expr(value, groups, defs),
            None => Ok(Term::constant(ConstValue::Unit)),
        },
        StmtKind::Assert { test, msg } => {
            let test = compile_expr(test, groups, defs)?;
            let abort = match msg {
                Some(msg) => {
                    let msg = compile_expr(msg, groups, defs)?;
                    Term::force(Term::apply_all(Term::builtin(VmBuiltin::Trace), [msg, Term::delay(Term::error())]))
                }
                None => Term::error(),
            };
            Ok(Term::ite(test, rest, abort))
        }
        // Resolution has already checked every imported name exists;
        // an import carries no behavior of its own once it has.
        StmtKind::Import { .. } => Ok(rest),
    }
}

/// `for x in xs: body` lowers to a right fold over the cons-list `xs`,
/// producing the unit accumulator `Term::fold_list` itself would,
/// reimplemented directly rather than through that helper because the loop
/// body's own compilation is fallible and `fold_list`'s `step` callback
/// isn't (`ir.rs`'s helper exists for the closed built-in recipes, which
/// never fail).
#[allow(clippy::too_many_arguments)]
fn compile_for(
    target: &Name,
    handle: ScopeHandle,
    iter: Term,
    body: &[Stmt],
    rest: Term,
    groups: &[SiblingGroup],
    entry_handle: Option<ScopeHandle>,
    defs: &Defs,
) -> Result<Term, CodegenError> {
    let self_apply = Term::force(Term::apply(Term::var("self"), Term::var("self")));
    let recurse = Term::lambda("v", Term::apply(self_apply, Term::var("v")));
    let xs = Term::var("xs");
    let head = Term::apply(Term::builtin(VmBuiltin::HeadList), xs.clone());
    let next_iteration = Term::apply(recurse, Term::apply(Term::builtin(VmBuiltin::TailList), xs.clone()));
    let bound_body = compile_body(body, next_iteration, groups, entry_handle, defs)?;
    let iteration = Term::apply(Term::lambda(rendered_name(target, handle), bound_body), head);
    let go_body = Term::force(Term::apply_all(
        Term::builtin(VmBuiltin::ChooseList),
        [xs, Term::delay(Term::constant(ConstValue::Unit)), Term::delay(iteration)],
    ));
    let go = Term::lambda("xs", go_body);
    let step = Term::lambda("self", Term::delay(go));
    let fix_term = Term::force(Term::apply(step.clone(), step));
    let fold_result = Term::apply(fix_term, iter);
    Ok(Term::apply(Term::lambda("_", rest), fold_result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ast, infer};

    fn compile_source(source: &str, entry_point: &str) -> Term {
        let module = ast::front::lower_module(source).expect("front end accepts this fixture");
        let (typed, _) = infer::infer_module(&module, entry_point).expect("fixture type-checks");
        compile_module(&typed, entry_point).expect("fixture code-generates")
    }

    #[test]
    fn a_trivial_validator_compiles_to_a_two_parameter_lambda_plus_the_synthetic_trailing_one() {
        let term = compile_source("def validator(x: int) -> int:\n    return x\n", "validator");
        // Outermost node is the sibling-group's own binder,
        // `Apply(Lambda(group_name, rest), group_value)`; `rest` is the
        // validator's own nested lambda over its one parameter plus the
        // synthetic trailing `_`.
        let Term::Apply(func, _) = &term else { panic!("expected the group-binding application") };
        let Term::Lambda(_, rest) = &**func else { panic!("expected the group binder's lambda") };
        let mut depth = 0;
        let mut inner = &**rest;
        while let Term::Lambda(_, body) = inner {
            depth += 1;
            inner = &**body;
        }
        assert_eq!(depth, 2, "validator's one parameter plus the synthetic trailing `_`");
    }

    #[test]
    fn mutually_recursive_top_level_helpers_compile_without_error() {
        let term = compile_source(
            "def is_even(n: int) -> bool:\n    if n == 0:\n        return True\n    return is_odd(n - 1)\ndef is_odd(n: int) -> bool:\n    if n == 0:\n        return False\n    return is_even(n - 1)\ndef validator(n: int) -> bool:\n    return is_even(n)\n",
            "validator",
        );
        assert!(matches!(term, Term::Apply(_, _)));
    }

    #[test]
    fn a_record_construction_lowers_to_constr_data() {
        let term = compile_source(
            "class Pair:\n    CONSTR_ID = 0\n    a: int\n    b: int\ndef validator(x: int) -> int:\n    p = Pair(x, x)\n    return p.a\n",
            "validator",
        );
        assert!(matches!(term, Term::Apply(_, _)));
    }
}
