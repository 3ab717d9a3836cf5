//! Statement and function/class-definition inference: the two-sweep
//! per-scope algorithm (pre-pass, then main pass), return-type validation,
//! and the validator entry point's no-defaults rule.
//!
//! Module scope and each function body get their own `ScopeStack` frame
//! (module scope, then nested per function); `if`/`for` bodies do not
//! — Python itself scopes by function, not by block, so a name a branch
//! assigns is visible to sibling statements afterward in the same frame.

use std::rc::Rc;

use crate::{
    ast::{self, TypeExpr},
    diagnostics::{wrap, Diagnostic, Pass},
    infer::{error::InferError, expr::infer_expr},
    names::Name,
    scope::{Binding, ScopeStack},
    span::Span,
    types::{compatible, record::{FieldSchema, RecordSchema}, FunctionType, ParamSig, Type},
    typed_ast::{self, ClassDef, FunctionDef, Param, Stmt, StmtKind},
};

/// Resolves a source type annotation (the untyped AST's `TypeExpr`) to a
/// `Type`. `int`/`bytes`/`str`/`bool`/`None` are the atomic primitives;
/// `List[T]`/`Dict[K, V]` build container types; `Union[A, B, ...]` is how a
/// script aggregates already-declared record classes into a `SumT` — our
/// subset has no class-inheritance syntax to aggregate them, so this
/// annotation form is where the aggregation happens explicitly (see
/// DESIGN.md).
pub fn resolve_type_expr(te: &TypeExpr, scope: &ScopeStack) -> Result<Type, InferError> {
    match te {
        TypeExpr::NoneType => Ok(Type::instance(Type::Unit)),
        TypeExpr::Name(name) => match name.as_str() {
            "int" => Ok(Type::instance(Type::Integer)),
            "bytes" => Ok(Type::instance(Type::ByteString)),
            "str" => Ok(Type::instance(Type::String)),
            "bool" => Ok(Type::instance(Type::Bool)),
            "None" => Ok(Type::instance(Type::Unit)),
            _ => {
                let (_, binding) = scope.lookup(name.as_str()).ok_or_else(|| InferError::UnknownClass(name.to_string()))?;
                match &binding.ty {
                    Type::Record(_) | Type::Sum(_) => Ok(Type::instance(binding.ty.clone())),
                    other => Err(InferError::NotARecordOrSum(other.clone())),
                }
            }
        },
        TypeExpr::Subscript { base, args } => match base.as_str() {
            "List" => {
                let elem = resolve_type_expr(args.first().ok_or(InferError::UnsupportedNode("List[] with no element type"))?, scope)?;
                Ok(Type::instance(Type::list_of(elem.as_class().clone())))
            }
            "Dict" => {
                if args.len() != 2 {
                    return Err(InferError::UnsupportedNode("Dict[] requires exactly two type arguments"));
                }
                let key = resolve_type_expr(&args[0], scope)?;
                let value = resolve_type_expr(&args[1], scope)?;
                Ok(Type::instance(Type::map_of(key.as_class().clone(), value.as_class().clone())))
            }
            "Union" => {
                let mut schemas = Vec::with_capacity(args.len());
                for arg in args {
                    let ty = resolve_type_expr(arg, scope)?;
                    let Type::Record(schema) = ty.as_class() else {
                        return Err(InferError::NotARecordOrSum(ty));
                    };
                    schemas.push(schema.clone());
                }
                Ok(Type::instance(Type::Sum(Rc::new(schemas))))
            }
            other => Err(InferError::UnknownClass(other.to_string())),
        },
    }
}

/// Infers a whole statement list under the two-sweep algorithm:
/// pre-pass registers this list's own `def`/`class` names so siblings can
/// mutually reference each other, then the main pass visits in source
/// order. `expected_ret` is `Some` inside a function body, naming the type
/// every `return` must match; `None` at module scope, where `return` is
/// not legal.
pub fn infer_body(
    body: &[ast::Stmt],
    scope: &mut ScopeStack,
    entry_point: &str,
    expected_ret: Option<&Type>,
) -> Result<Vec<Stmt>, Diagnostic> {
    pre_pass(body, scope, entry_point).map_err(|(span, kind_desc, e)| wrap(Pass::NodeVisiting, span, kind_desc, e))?;
    body.iter().map(|stmt| infer_stmt(stmt, scope, entry_point, expected_ret)).collect()
}

type PrePassError = (Span, &'static str, InferError);

fn pre_pass(body: &[ast::Stmt], scope: &mut ScopeStack, entry_point: &str) -> Result<(), PrePassError> {
    let mut next_tag = 0i64;
    for stmt in body {
        match &stmt.kind {
            ast::StmtKind::FunctionDef(f) => {
                let (sig, params) =
                    infer_function_signature(f, scope, entry_point).map_err(|e| (stmt.span, node_desc(&stmt.kind), e))?;
                scope.bind(f.name.clone(), Binding::new(Type::function(sig.params, sig.ret)).with_span(stmt.span).with_call_params(params));
            }
            ast::StmtKind::ClassDef(c) => {
                let schema = build_record_schema(c, scope, next_tag).map_err(|e| (stmt.span, node_desc(&stmt.kind), e))?;
                if c.constructor_tag.is_none() {
                    next_tag += 1;
                }
                scope.bind(c.name.clone(), Binding::new(Type::Record(schema)).with_span(stmt.span));
            }
            _ => {}
        }
    }
    Ok(())
}

fn build_record_schema(c: &ast::ClassDef, scope: &ScopeStack, default_tag: i64) -> Result<Rc<RecordSchema>, InferError> {
    let fields = c
        .fields
        .iter()
        .map(|f| Ok(FieldSchema { name: f.name.clone(), ty: resolve_type_expr(&f.annotation, scope)? }))
        .collect::<Result<Vec<_>, InferError>>()?;
    Ok(Rc::new(RecordSchema { name: c.name.clone(), tag: c.constructor_tag.unwrap_or(default_tag), fields }))
}

/// Builds a function's signature without visiting its body: parameter and
/// return types from annotations, and each default's own type-check against
/// its parameter — an incompatible default is a fatal error at definition
/// time, independent of whether the body is ever inferred.
fn infer_function_signature(f: &ast::FunctionDef, scope: &mut ScopeStack, entry_point: &str) -> Result<(FunctionType, Vec<ParamSig>), InferError> {
    let ret = resolve_type_expr(&f.returns, scope)?;
    let mut params = Vec::with_capacity(f.params.len());
    let mut param_sigs = Vec::with_capacity(f.params.len());
    for param in &f.params {
        let declared = resolve_type_expr(&param.annotation, scope)?;
        if param.default.is_some() && f.name.as_str() == entry_point {
            return Err(InferError::ValidatorHasDefault(param.name.clone()));
        }
        if let Some(default) = &param.default {
            let default_expr = infer_expr(default, scope).map_err(|d| InferError::Nested(Box::new(d)))?;
            if !compatible(&declared, &default_expr.ty) {
                return Err(InferError::TypeMismatch { expected: declared, actual: default_expr.ty });
            }
        }
        params.push(declared.clone());
        param_sigs.push(ParamSig { name: param.name.clone(), has_default: param.default.is_some() });
    }
    Ok((FunctionType { params, ret }, param_sigs))
}

fn infer_stmt(stmt: &ast::Stmt, scope: &mut ScopeStack, entry_point: &str, expected_ret: Option<&Type>) -> Result<Stmt, Diagnostic> {
    go_stmt(stmt, scope, entry_point, expected_ret).map_err(|e| wrap(Pass::NodeVisiting, stmt.span, node_desc(&stmt.kind), e))
}

fn go_stmt(stmt: &ast::Stmt, scope: &mut ScopeStack, entry_point: &str, expected_ret: Option<&Type>) -> Result<Stmt, InferError> {
    let span = stmt.span;
    let kind = match &stmt.kind {
        ast::StmtKind::FunctionDef(f) => StmtKind::FunctionDef(infer_function_body(f, scope, entry_point)?),
        ast::StmtKind::ClassDef(c) => {
            let (_, binding) = scope.lookup(c.name.as_str()).expect("class was bound in this scope's pre-pass");
            let Type::Record(schema) = binding.ty.clone() else { unreachable!("pre-pass only binds ClassDef as Record") };
            StmtKind::ClassDef(ClassDef { span, schema })
        }
        ast::StmtKind::Assign { target, value } => {
            let value = infer_sub_expr(value, scope)?;
            let handle = scope.bind(target.clone(), Binding::new(value.ty.clone()).with_span(span));
            StmtKind::Assign { target: target.clone(), handle, value }
        }
        ast::StmtKind::AnnAssign { target, annotation, value } => {
            let declared = resolve_type_expr(annotation, scope)?;
            let value = value.as_ref().map(|v| infer_sub_expr(v, scope)).transpose()?;
            if let Some(v) = &value {
                if !compatible(&declared, &v.ty) {
                    return Err(InferError::TypeMismatch { expected: declared, actual: v.ty.clone() });
                }
            }
            let handle = scope.bind(target.clone(), Binding::new(declared).with_span(span));
            StmtKind::AnnAssign { target: target.clone(), handle, value }
        }
        ast::StmtKind::ExprStmt(e) => StmtKind::ExprStmt(infer_sub_expr(e, scope)?),
        ast::StmtKind::If { test, body, orelse } => {
            let test = infer_sub_expr(test, scope)?;
            if test.ty.as_class() != &Type::Bool {
                return Err(InferError::TypeMismatch { expected: Type::instance(Type::Bool), actual: test.ty });
            }
            let body = infer_body(body, scope, entry_point, expected_ret).map_err(|d| InferError::Nested(Box::new(d)))?;
            let orelse = infer_body(orelse, scope, entry_point, expected_ret).map_err(|d| InferError::Nested(Box::new(d)))?;
            StmtKind::If { test, body, orelse }
        }
        ast::StmtKind::For { target, iter, body } => {
            let iter = infer_sub_expr(iter, scope)?;
            let Type::List(elem) = iter.ty.as_class() else {
                return Err(InferError::TypeMismatch { expected: Type::instance(Type::list_of(Type::Unit)), actual: iter.ty });
            };
            let elem_ty = Type::instance((**elem).clone());
            let handle = scope.bind(target.clone(), Binding::new(elem_ty));
            let body = infer_body(body, scope, entry_point, expected_ret).map_err(|d| InferError::Nested(Box::new(d)))?;
            StmtKind::For { target: target.clone(), handle, iter, body }
        }
        ast::StmtKind::Return(value) => {
            let ret_ty = expected_ret.ok_or(InferError::UnsupportedNode("return outside of a function body"))?;
            let value = value.as_ref().map(|v| infer_sub_expr(v, scope)).transpose()?;
            let actual = value.as_ref().map_or(Type::instance(Type::Unit), |v| v.ty.clone());
            if !compatible(ret_ty, &actual) {
                return Err(InferError::TypeMismatch { expected: ret_ty.clone(), actual });
            }
            StmtKind::Return(value)
        }
        ast::StmtKind::Assert { test, msg } => {
            let test = infer_sub_expr(test, scope)?;
            if test.ty.as_class() != &Type::Bool {
                return Err(InferError::TypeMismatch { expected: Type::instance(Type::Bool), actual: test.ty });
            }
            let msg = msg.as_ref().map(|m| infer_sub_expr(m, scope)).transpose()?;
            if let Some(m) = &msg {
                if m.ty.as_class() != &Type::String {
                    return Err(InferError::TypeMismatch { expected: Type::instance(Type::String), actual: m.ty.clone() });
                }
            }
            StmtKind::Assert { test, msg }
        }
        ast::StmtKind::Import { names } => {
            let resolved = names
                .iter()
                .map(|name| {
                    scope
                        .lookup(name.as_str())
                        .map(|(handle, _)| (name.clone(), handle))
                        .ok_or_else(|| InferError::UndefinedName(name.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            StmtKind::Import { names: resolved }
        }
    };
    Ok(Stmt { span, kind })
}

fn infer_sub_expr(expr: &ast::Expr, scope: &mut ScopeStack) -> Result<typed_ast::Expr, InferError> {
    infer_expr(expr, scope).map_err(|d| InferError::Nested(Box::new(d)))
}

fn infer_function_body(f: &ast::FunctionDef, scope: &mut ScopeStack, entry_point: &str) -> Result<FunctionDef, InferError> {
    let (handle, binding) = scope.lookup(f.name.as_str()).expect("function was bound in this scope's pre-pass");
    let Type::Function(sig) = binding.ty.clone() else { unreachable!("pre-pass only binds FunctionDef as Function") };

    scope.push_frame();
    let mut params = Vec::with_capacity(f.params.len());
    for (param, declared) in f.params.iter().zip(&sig.params) {
        let default = param
            .default
            .as_ref()
            .map(|d| infer_expr(d, scope).map_err(|diag| InferError::Nested(Box::new(diag))))
            .transpose()?;
        let param_handle = scope.bind(param.name.clone(), Binding::new(declared.clone()).with_span(param.span));
        params.push(Param { span: param.span, name: param.name.clone(), handle: param_handle, ty: declared.clone(), default });
    }
    let body_result = infer_body(&f.body, scope, entry_point, Some(&sig.ret));
    scope.pop_frame();
    let body = body_result.map_err(|d| InferError::Nested(Box::new(d)))?;

    Ok(FunctionDef { span: f.span, name: f.name.clone(), handle, params, ret: sig.ret, body })
}

fn node_desc(kind: &ast::StmtKind) -> &'static str {
    match kind {
        ast::StmtKind::FunctionDef(_) => "a function definition",
        ast::StmtKind::ClassDef(_) => "a class definition",
        ast::StmtKind::Assign { .. } => "an assignment",
        ast::StmtKind::AnnAssign { .. } => "an annotated assignment",
        ast::StmtKind::ExprStmt(_) => "an expression statement",
        ast::StmtKind::If { .. } => "an if statement",
        ast::StmtKind::For { .. } => "a for loop",
        ast::StmtKind::Return(_) => "a return statement",
        ast::StmtKind::Assert { .. } => "an assert statement",
        ast::StmtKind::Import { .. } => "an import statement",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    fn synthetic_span() -> Span {
        Span::synthetic()
    }

    #[test]
    fn validator_entry_point_rejects_a_default() {
        let mut scope = ScopeStack::new();
        let f = ast::FunctionDef {
            span: synthetic_span(),
            name: Name::new("validator"),
            params: vec![ast::Param {
                span: synthetic_span(),
                name: Name::new("x"),
                annotation: TypeExpr::Name(Name::new("int")),
                default: Some(ast::Expr { span: synthetic_span(), kind: ast::ExprKind::Literal(ast::Literal::Int(0.into())) }),
            }],
            returns: TypeExpr::Name(Name::new("int")),
            body: vec![],
        };
        let err = infer_function_signature(&f, &mut scope, "validator").unwrap_err();
        assert!(matches!(err, InferError::ValidatorHasDefault(_)));
    }

    #[test]
    fn non_entry_point_function_may_declare_a_default() {
        let mut scope = ScopeStack::new();
        let f = ast::FunctionDef {
            span: synthetic_span(),
            name: Name::new("helper"),
            params: vec![ast::Param {
                span: synthetic_span(),
                name: Name::new("x"),
                annotation: TypeExpr::Name(Name::new("int")),
                default: Some(ast::Expr { span: synthetic_span(), kind: ast::ExprKind::Literal(ast::Literal::Int(7.into())) }),
            }],
            returns: TypeExpr::Name(Name::new("int")),
            body: vec![],
        };
        let (sig, params) = infer_function_signature(&f, &mut scope, "validator").unwrap();
        assert_eq!(sig.params, vec![Type::instance(Type::Integer)]);
        assert!(params[0].has_default);
    }

    #[test]
    fn mismatched_default_type_is_rejected_at_definition_time() {
        let mut scope = ScopeStack::new();
        let f = ast::FunctionDef {
            span: synthetic_span(),
            name: Name::new("f"),
            params: vec![ast::Param {
                span: synthetic_span(),
                name: Name::new("z"),
                annotation: TypeExpr::Name(Name::new("int")),
                default: Some(ast::Expr { span: synthetic_span(), kind: ast::ExprKind::Literal(ast::Literal::Str("hello".into())) }),
            }],
            returns: TypeExpr::Name(Name::new("int")),
            body: vec![],
        };
        let err = infer_function_signature(&f, &mut scope, "validator").unwrap_err();
        assert!(matches!(err, InferError::TypeMismatch { .. }));
    }
}
