//! Two shallow, single-scope visitors the folder runs once per scope it
//! enters (module, then each function body), grounded on `opshin`'s
//! `ShallowNameDefCollector`/`DefinedTimesVisitor`.

use std::collections::{HashMap, HashSet};

use crate::{
    names::Name,
    typed_ast::{Stmt, StmtKind},
};

/// Every name this scope's own statements bind, including names bound
/// inside nested `if`/`for` bodies (those still shadow a safe built-in for
/// the sandbox) but *not* names bound inside a nested function or
/// class body — `opshin`'s collector records only the nested def's own
/// name there, "ignoring the recursive stuff".
#[must_use]
pub fn shallow_def_names(body: &[Stmt]) -> HashSet<Name> {
    let mut names = HashSet::new();
    for stmt in body {
        collect_stmt(stmt, &mut names);
    }
    names
}

fn collect_stmt(stmt: &Stmt, names: &mut HashSet<Name>) {
    match &stmt.kind {
        StmtKind::FunctionDef(f) => {
            names.insert(f.name.clone());
        }
        StmtKind::ClassDef(c) => {
            names.insert(c.schema.name.clone());
        }
        StmtKind::Assign { target, .. } | StmtKind::AnnAssign { target, .. } => {
            names.insert(target.clone());
        }
        StmtKind::For { target, body, .. } => {
            names.insert(target.clone());
            for s in body {
                collect_stmt(s, names);
            }
        }
        StmtKind::If { body, orelse, .. } => {
            for s in body.iter().chain(orelse) {
                collect_stmt(s, names);
            }
        }
        StmtKind::ExprStmt(_) | StmtKind::Return(_) | StmtKind::Assert { .. } | StmtKind::Import { .. } => {}
    }
}

/// The names written exactly once at this scope's *own* top level.
/// Assignments nested inside `if`/`for` bodies are deliberately excluded
/// from this count, matching the stubbed
/// `visit_For`/`visit_If` in `opshin`'s `DefinedTimesVisitor` rather than
/// its module-wide (cross-scope) counting — counting is scoped here to
/// match spec.md's stated "per scope" algorithm (see DESIGN.md).
#[must_use]
pub fn single_assignment_set(body: &[Stmt]) -> HashSet<Name> {
    let mut counts: HashMap<Name, u32> = HashMap::new();
    let mut conditional = HashSet::new();
    for stmt in body {
        count_top_level(stmt, &mut counts, &mut conditional);
    }
    counts.into_iter().filter(|(name, n)| *n == 1 && !conditional.contains(name)).map(|(name, _)| name).collect()
}

/// A name assigned anywhere inside a nested `if`/`for` body is excluded from
/// the single-assignment set outright, regardless of how many times (zero
/// or more) it is also assigned at this scope's own top level — a name
/// reassigned conditionally is not provably constant even if the top level
/// only ever binds it once.
fn count_top_level(stmt: &Stmt, counts: &mut HashMap<Name, u32>, conditional: &mut HashSet<Name>) {
    match &stmt.kind {
        StmtKind::FunctionDef(f) => {
            *counts.entry(f.name.clone()).or_default() += 1;
        }
        StmtKind::ClassDef(c) => {
            *counts.entry(c.schema.name.clone()).or_default() += 1;
        }
        StmtKind::Assign { target, .. } | StmtKind::AnnAssign { target, .. } => {
            *counts.entry(target.clone()).or_default() += 1;
        }
        StmtKind::For { target, body, .. } => {
            conditional.insert(target.clone());
            mark_conditional(body, conditional);
        }
        StmtKind::If { body, orelse, .. } => {
            mark_conditional(body, conditional);
            mark_conditional(orelse, conditional);
        }
        StmtKind::ExprStmt(_) | StmtKind::Return(_) | StmtKind::Assert { .. } | StmtKind::Import { .. } => {}
    }
}

/// Collects every name a nested `if`/`for` body assigns, without crossing
/// into a further-nested function or class body (those get their own
/// single-assignment set).
fn mark_conditional(body: &[Stmt], conditional: &mut HashSet<Name>) {
    for stmt in body {
        match &stmt.kind {
            StmtKind::FunctionDef(_) | StmtKind::ClassDef(_) => {}
            StmtKind::Assign { target, .. } | StmtKind::AnnAssign { target, .. } => {
                conditional.insert(target.clone());
            }
            StmtKind::For { target, body, .. } => {
                conditional.insert(target.clone());
                mark_conditional(body, conditional);
            }
            StmtKind::If { body, orelse, .. } => {
                mark_conditional(body, conditional);
                mark_conditional(orelse, conditional);
            }
            StmtKind::ExprStmt(_) | StmtKind::Return(_) | StmtKind::Assert { .. } | StmtKind::Import { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{span::Span, typed_ast::Expr, types::{ConstValue, Type}};

    fn int_expr(v: i64) -> Expr {
        Expr { span: Span::synthetic(), ty: Type::instance(Type::Integer), kind: crate::typed_ast::ExprKind::Const(ConstValue::Int(v.into())) }
    }

    fn assign(name: &str, value: Expr) -> Stmt {
        Stmt {
            span: Span::synthetic(),
            kind: StmtKind::Assign { target: Name::new(name), handle: crate::scope::ScopeHandle { frame: 0, slot: 0 }, value },
        }
    }

    #[test]
    fn single_assignment_excludes_if_body() {
        let body = vec![
            assign("x", int_expr(1)),
            Stmt {
                span: Span::synthetic(),
                kind: StmtKind::If { test: int_expr(1), body: vec![assign("x", int_expr(2))], orelse: vec![] },
            },
        ];
        let single = single_assignment_set(&body);
        assert!(!single.contains(&Name::new("x")), "x is written at the top level and inside an if; must not be single-assignment");
    }

    #[test]
    fn single_assignment_excludes_for_body() {
        let body = vec![Stmt {
            span: Span::synthetic(),
            kind: StmtKind::For {
                target: Name::new("i"),
                handle: crate::scope::ScopeHandle { frame: 0, slot: 0 },
                iter: int_expr(1),
                body: vec![assign("acc", int_expr(1))],
            },
        }];
        let single = single_assignment_set(&body);
        assert!(!single.contains(&Name::new("acc")));
    }

    #[test]
    fn plain_single_top_level_assign_is_counted() {
        let body = vec![assign("x", int_expr(1))];
        let single = single_assignment_set(&body);
        assert!(single.contains(&Name::new("x")));
    }
}
