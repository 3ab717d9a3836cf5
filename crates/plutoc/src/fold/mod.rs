//! The constant-folding pass: walks a typed AST once, folding every
//! expression subtree the sandbox can prove equivalent to a literal value
//! into `ExprKind::Const`, without changing observable behavior (including
//! trace output, preserved by refusing to fold any `print(...)` call).
//!
//! Grounded on `opshin/optimize/optimize_const_folding.py`'s
//! `OptimizeConstantFolding`, reshaped around an explicit sandbox evaluator
//! instead of a host `exec`.

mod collect;
mod sandbox;

use std::collections::{HashMap, HashSet};

use crate::{
    fold::sandbox::Env,
    names::Name,
    typed_ast::{ClassDef, Expr, ExprKind, FunctionDef, Module, Param, Stmt, StmtKind},
    types::ConstValue,
};

/// Per-scope folding state: which names this and enclosing scopes have
/// bound (shadowing the sandbox's safe-globals allowlist), and which of
/// those names currently denote a known constant value.
struct Scope {
    visible: HashSet<Name>,
    constants: HashMap<Name, ConstValue>,
}

pub struct ConstantFolder {
    scopes: Vec<Scope>,
    /// Whether a subtree left unfolded gets a `tracing::debug!` event —
    /// off by default since every unfoldable node would otherwise emit
    /// one, even in an ordinary compile.
    log_skips: bool,
}

impl ConstantFolder {
    #[must_use]
    pub fn new() -> Self {
        Self { scopes: vec![], log_skips: false }
    }

    /// Enables debug-level logging of folds the sandbox declined to
    /// perform.
    #[must_use]
    pub fn with_skip_logging(mut self, log_skips: bool) -> Self {
        self.log_skips = log_skips;
        self
    }

    fn enter_scope(&mut self) {
        self.scopes.push(Scope { visible: HashSet::new(), constants: HashMap::new() });
    }

    fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    fn shadowed(&self) -> HashSet<Name> {
        self.scopes.iter().flat_map(|s| s.visible.iter().cloned()).collect()
    }

    fn constants(&self) -> HashMap<Name, ConstValue> {
        let mut merged = HashMap::new();
        for scope in &self.scopes {
            merged.extend(scope.constants.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }

    fn env(&self) -> (HashMap<Name, ConstValue>, HashSet<Name>) {
        (self.constants(), self.shadowed())
    }

    fn bind_constant(&mut self, name: Name, value: ConstValue) {
        self.scopes.last_mut().expect("a scope is always active while folding").constants.insert(name, value);
    }

    /// Folds a whole module: the top-level scope's own pass.
    #[must_use]
    pub fn fold_module(mut self, module: Module) -> Module {
        self.enter_scope();
        let body = self.fold_scope_body(module.body);
        self.exit_scope();
        Module { body }
    }

    /// Folds one scope's statement list: collects this scope's own
    /// def-names and single-assignment set, then visits each statement.
    fn fold_scope_body(&mut self, body: Vec<Stmt>) -> Vec<Stmt> {
        let def_names = collect::shallow_def_names(&body);
        let single_assigned = collect::single_assignment_set(&body);
        self.scopes.last_mut().expect("scope pushed by caller").visible.extend(def_names);

        body.into_iter().map(|stmt| self.fold_stmt(stmt, &single_assigned)).collect()
    }

    fn fold_stmt(&mut self, stmt: Stmt, single_assigned: &HashSet<Name>) -> Stmt {
        let span = stmt.span;
        let kind = match stmt.kind {
            StmtKind::FunctionDef(f) => StmtKind::FunctionDef(self.fold_function(f)),
            StmtKind::ClassDef(c) => StmtKind::ClassDef(self.fold_class(c)),
            StmtKind::Assign { target, handle, value } => {
                let value = self.fold_expr(value);
                if single_assigned.contains(&target) {
                    let (constants, shadowed) = self.env();
                    match sandbox::eval(&value, &Env { constants: &constants, shadowed: &shadowed }) {
                        Some(v) => self.bind_constant(target.clone(), v),
                        None => self.log_skip(&target, "assignment"),
                    }
                }
                StmtKind::Assign { target, handle, value }
            }
            StmtKind::AnnAssign { target, handle, value } => {
                let value = value.map(|v| self.fold_expr(v));
                if single_assigned.contains(&target) {
                    if let Some(value) = &value {
                        let (constants, shadowed) = self.env();
                        match sandbox::eval(value, &Env { constants: &constants, shadowed: &shadowed }) {
                            Some(v) => self.bind_constant(target.clone(), v),
                            None => self.log_skip(&target, "annotated assignment"),
                        }
                    }
                }
                StmtKind::AnnAssign { target, handle, value }
            }
            StmtKind::ExprStmt(e) => StmtKind::ExprStmt(self.fold_expr(e)),
            StmtKind::If { test, body, orelse } => {
                StmtKind::If { test: self.fold_expr(test), body: self.fold_branch(body), orelse: self.fold_branch(orelse) }
            }
            StmtKind::For { target, handle, iter, body } => {
                StmtKind::For { target, handle, iter: self.fold_expr(iter), body: self.fold_branch(body) }
            }
            StmtKind::Return(e) => StmtKind::Return(e.map(|e| self.fold_expr(e))),
            StmtKind::Assert { test, msg } => StmtKind::Assert { test: self.fold_expr(test), msg: msg.map(|m| self.fold_expr(m)) },
            // Imports only bring prelude classes into scope; there is no
            // `ConstValue` representation for a class itself, so nothing
            // further folds here (see DESIGN.md).
            StmtKind::Import { names } => {
                if self.log_skips {
                    tracing::debug!(names = ?names.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(), "import brings no constant value, left as-is");
                }
                StmtKind::Import { names }
            }
        };
        Stmt { span, kind }
    }

    /// Folds an `if`/`for` body in its *own* nested scope: a name assigned
    /// only once inside a branch is not thereby singly-assigned at the
    /// enclosing scope, so branch bodies get their own fresh
    /// single-assignment set rather than contributing to the parent's.
    fn fold_branch(&mut self, body: Vec<Stmt>) -> Vec<Stmt> {
        self.enter_scope();
        let folded = self.fold_scope_body(body);
        self.exit_scope();
        folded
    }

    fn fold_function(&mut self, f: FunctionDef) -> FunctionDef {
        self.enter_scope();
        {
            let scope = self.scopes.last_mut().expect("just pushed");
            scope.visible.extend(f.params.iter().map(|p| p.name.clone()));
        }
        let params: Vec<Param> = f.params.into_iter().map(|p| Param { default: p.default.map(|d| self.fold_expr(d)), ..p }).collect();
        let body = self.fold_scope_body(f.body);
        self.exit_scope();
        FunctionDef { params, body, ..f }
    }

    /// Class definitions carry no foldable body of their own — their
    /// fields are type annotations, not expressions.
    fn fold_class(&mut self, c: ClassDef) -> ClassDef {
        c
    }

    /// Folds an expression bottom-up, then attempts to fold the whole node.
    /// A call to `print` anywhere in the subtree blocks
    /// folding at every level above it, preserving trace output — the
    /// structural analogue of the original's textual `"print(" in source`
    /// scan.
    fn fold_expr(&mut self, expr: Expr) -> Expr {
        let span = expr.span;
        let ty = expr.ty.clone();
        let kind = match expr.kind {
            ExprKind::Const(v) => ExprKind::Const(v),
            ExprKind::Name(n, h) => ExprKind::Name(n, h),
            ExprKind::BinOp { op, left, right } => {
                ExprKind::BinOp { op, left: Box::new(self.fold_expr(*left)), right: Box::new(self.fold_expr(*right)) }
            }
            ExprKind::UnOp { op, operand } => ExprKind::UnOp { op, operand: Box::new(self.fold_expr(*operand)) },
            ExprKind::Compare { left, op, right } => {
                ExprKind::Compare { left: Box::new(self.fold_expr(*left)), op, right: Box::new(self.fold_expr(*right)) }
            }
            ExprKind::BoolOp { and, values } => ExprKind::BoolOp { and, values: values.into_iter().map(|v| self.fold_expr(v)).collect() },
            ExprKind::Call { func, args, keywords } => ExprKind::Call {
                func: Box::new(self.fold_expr(*func)),
                args: args.into_iter().map(|a| self.fold_expr(a)).collect(),
                keywords: keywords
                    .into_iter()
                    .map(|k| crate::typed_ast::Keyword { name: k.name, value: self.fold_expr(k.value) })
                    .collect(),
            },
            ExprKind::Attribute { value, attr, field_index } => {
                ExprKind::Attribute { value: Box::new(self.fold_expr(*value)), attr, field_index }
            }
            ExprKind::Subscript { value, index } => {
                ExprKind::Subscript { value: Box::new(self.fold_expr(*value)), index: Box::new(self.fold_expr(*index)) }
            }
            ExprKind::List(items) => ExprKind::List(items.into_iter().map(|e| self.fold_expr(e)).collect()),
            ExprKind::Tuple(items) => ExprKind::Tuple(items.into_iter().map(|e| self.fold_expr(e)).collect()),
            ExprKind::Dict { keys, values } => ExprKind::Dict {
                keys: keys.into_iter().map(|e| self.fold_expr(e)).collect(),
                values: values.into_iter().map(|e| self.fold_expr(e)).collect(),
            },
            ExprKind::IfExp { test, body, orelse } => ExprKind::IfExp {
                test: Box::new(self.fold_expr(*test)),
                body: Box::new(self.fold_expr(*body)),
                orelse: Box::new(self.fold_expr(*orelse)),
            },
            ExprKind::IsInstance { value, class, tag } => ExprKind::IsInstance { value: Box::new(self.fold_expr(*value)), class, tag },
        };
        let folded = Expr { span, ty, kind };
        if matches!(folded.kind, ExprKind::Const(_)) || contains_print_call(&folded) {
            return folded;
        }
        let (constants, shadowed) = self.env();
        match sandbox::eval(&folded, &Env { constants: &constants, shadowed: &shadowed }) {
            Some(value) => Expr { span: folded.span, ty: folded.ty, kind: ExprKind::Const(value) },
            None => {
                if self.log_skips {
                    tracing::debug!(span = ?folded.span, "sandbox could not evaluate subtree, left unfolded");
                }
                folded
            }
        }
    }

    /// Emits the debug-level "assignment didn't fold" event when skip
    /// logging is enabled.
    fn log_skip(&self, name: &Name, what: &str) {
        if self.log_skips {
            tracing::debug!(name = name.as_str(), kind = what, "single-assigned name did not fold to a constant");
        }
    }
}

impl Default for ConstantFolder {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_print_call(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Call { func, args, keywords } => {
            let is_print = matches!(&func.kind, ExprKind::Name(n, _) if n.as_str() == "print");
            is_print || contains_print_call(func) || args.iter().any(contains_print_call) || keywords.iter().any(|k| contains_print_call(&k.value))
        }
        ExprKind::BinOp { left, right, .. } | ExprKind::Compare { left, right, .. } => contains_print_call(left) || contains_print_call(right),
        ExprKind::UnOp { operand, .. } => contains_print_call(operand),
        ExprKind::BoolOp { values, .. } | ExprKind::List(values) | ExprKind::Tuple(values) => values.iter().any(contains_print_call),
        ExprKind::Dict { keys, values } => keys.iter().any(contains_print_call) || values.iter().any(contains_print_call),
        ExprKind::Subscript { value, index } => contains_print_call(value) || contains_print_call(index),
        ExprKind::Attribute { value, .. } => contains_print_call(value),
        ExprKind::IfExp { test, body, orelse } => contains_print_call(test) || contains_print_call(body) || contains_print_call(orelse),
        ExprKind::IsInstance { value, .. } => contains_print_call(value),
        ExprKind::Const(_) | ExprKind::Name(..) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{scope::ScopeHandle, span::Span, types::Type};

    fn int(v: i64) -> Expr {
        Expr { span: Span::synthetic(), ty: Type::instance(Type::Integer), kind: ExprKind::Const(ConstValue::Int(v.into())) }
    }

    #[test]
    fn folds_addition_into_a_constant() {
        let expr = Expr {
            span: Span::synthetic(),
            ty: Type::instance(Type::Integer),
            kind: ExprKind::BinOp { op: crate::ast::BinOp::Add, left: Box::new(int(2)), right: Box::new(int(3)) },
        };
        let module = Module { body: vec![Stmt { span: Span::synthetic(), kind: StmtKind::ExprStmt(expr) }] };
        let folded = ConstantFolder::new().fold_module(module);
        let StmtKind::ExprStmt(folded_expr) = &folded.body[0].kind else { panic!("expected an expr stmt") };
        assert!(matches!(folded_expr.kind, ExprKind::Const(ConstValue::Int(ref n)) if *n == num_bigint::BigInt::from(5)));
    }

    #[test]
    fn print_call_blocks_folding_of_its_argument_and_itself() {
        let print_call = Expr {
            span: Span::synthetic(),
            ty: Type::instance(Type::Unit),
            kind: ExprKind::Call {
                func: Box::new(Expr { span: Span::synthetic(), ty: Type::instance(Type::Unit), kind: ExprKind::Name(Name::new("print"), ScopeHandle { frame: 0, slot: 0 }) }),
                args: vec![Expr {
                    span: Span::synthetic(),
                    ty: Type::instance(Type::Integer),
                    kind: ExprKind::BinOp { op: crate::ast::BinOp::Add, left: Box::new(int(2)), right: Box::new(int(3)) },
                }],
                keywords: vec![],
            },
        };
        let module = Module { body: vec![Stmt { span: Span::synthetic(), kind: StmtKind::ExprStmt(print_call) }] };
        let folded = ConstantFolder::new().fold_module(module);
        let StmtKind::ExprStmt(folded_expr) = &folded.body[0].kind else { panic!("expected an expr stmt") };
        assert!(!matches!(folded_expr.kind, ExprKind::Const(_)), "print(...) itself must never fold to a constant");
    }
}
