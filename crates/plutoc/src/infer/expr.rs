//! Expression type inference: literal, name, call, binary/unary/compare/bool
//! operations, attribute access, subscript, list/tuple/dict literals,
//! conditional expression, and `isinstance`.

use crate::{
    ast::{self, BinOp, CmpOp, UnOp},
    builtins::len,
    diagnostics::{wrap, Diagnostic, Pass},
    infer::{error::InferError, signature},
    names::Name,
    scope::ScopeStack,
    span::Span,
    types::{type_of_literal, ConstValue, FunctionType, ParamSig, Type},
    typed_ast::{Expr, ExprKind, Keyword},
};

pub fn infer_expr(expr: &ast::Expr, scope: &mut ScopeStack) -> Result<Expr, Diagnostic> {
    go(expr, scope).map_err(|e| wrap(Pass::NodeVisiting, expr.span, node_desc(&expr.kind), e))
}

fn node_desc(kind: &ast::ExprKind) -> &'static str {
    match kind {
        ast::ExprKind::Literal(_) => "a literal",
        ast::ExprKind::Name(_) => "a name reference",
        ast::ExprKind::BinOp { .. } => "a binary operation",
        ast::ExprKind::UnOp { .. } => "a unary operation",
        ast::ExprKind::Compare { .. } => "a comparison",
        ast::ExprKind::BoolOp { .. } => "a boolean operation",
        ast::ExprKind::Call { .. } => "a call",
        ast::ExprKind::Attribute { .. } => "an attribute access",
        ast::ExprKind::Subscript { .. } => "a subscript",
        ast::ExprKind::List(_) => "a list literal",
        ast::ExprKind::Tuple(_) => "a tuple literal",
        ast::ExprKind::Dict { .. } => "a dict literal",
        ast::ExprKind::IfExp { .. } => "a conditional expression",
        ast::ExprKind::IsInstance { .. } => "an isinstance check",
    }
}

fn go(expr: &ast::Expr, scope: &mut ScopeStack) -> Result<Expr, InferError> {
    let span = expr.span;
    match &expr.kind {
        ast::ExprKind::Literal(lit) => {
            let value = literal_value(lit);
            let ty = type_of_literal(&value);
            Ok(Expr { span, ty, kind: ExprKind::Const(value) })
        }
        ast::ExprKind::Name(name) => {
            let (handle, binding) = scope.lookup(name.as_str()).ok_or_else(|| InferError::UndefinedName(name.to_string()))?;
            Ok(Expr { span, ty: binding.ty.clone(), kind: ExprKind::Name(name.clone(), handle) })
        }
        ast::ExprKind::UnOp { op, operand } => {
            let operand = infer_sub(operand, scope)?;
            let ty = unop_result_type(*op, operand.ty.as_class()).ok_or_else(|| InferError::TypeMismatch {
                expected: unop_expected(*op),
                actual: operand.ty.clone(),
            })?;
            Ok(Expr { span, ty, kind: ExprKind::UnOp { op: *op, operand: Box::new(operand) } })
        }
        ast::ExprKind::BinOp { op, left, right } => {
            let left = infer_sub(left, scope)?;
            let right = infer_sub(right, scope)?;
            let ty = binop_result_type(*op, left.ty.as_class(), right.ty.as_class())
                .ok_or_else(|| InferError::TypeMismatch { expected: left.ty.clone(), actual: right.ty.clone() })?;
            Ok(Expr { span, ty, kind: ExprKind::BinOp { op: *op, left: Box::new(left), right: Box::new(right) } })
        }
        ast::ExprKind::Compare { left, op, right } => {
            let left = infer_sub(left, scope)?;
            let right = infer_sub(right, scope)?;
            if !compare_is_legal(*op, left.ty.as_class(), right.ty.as_class()) {
                return Err(InferError::TypeMismatch { expected: left.ty.clone(), actual: right.ty.clone() });
            }
            Ok(Expr { span, ty: Type::instance(Type::Bool), kind: ExprKind::Compare { left: Box::new(left), op: *op, right: Box::new(right) } })
        }
        ast::ExprKind::BoolOp { and, values } => {
            let values = values.iter().map(|v| infer_sub(v, scope)).collect::<Result<Vec<_>, _>>()?;
            for v in &values {
                if v.ty.as_class() != &Type::Bool {
                    return Err(InferError::TypeMismatch { expected: Type::instance(Type::Bool), actual: v.ty.clone() });
                }
            }
            Ok(Expr { span, ty: Type::instance(Type::Bool), kind: ExprKind::BoolOp { and: *and, values } })
        }
        ast::ExprKind::Call { func, args, keywords } => infer_call(span, func, args, keywords, scope),
        ast::ExprKind::Attribute { value, attr } => {
            let value = infer_sub(value, scope)?;
            let Type::Record(schema) = value.ty.as_class() else {
                return Err(InferError::UnknownAttribute { ty: value.ty.clone(), attr: attr.to_string() });
            };
            let field_index = schema.field_index(attr.as_str()).ok_or_else(|| InferError::UnknownAttribute {
                ty: value.ty.clone(),
                attr: attr.to_string(),
            })?;
            let ty = schema.fields[field_index].ty.clone();
            Ok(Expr { span, ty, kind: ExprKind::Attribute { value: Box::new(value), attr: attr.clone(), field_index } })
        }
        ast::ExprKind::Subscript { value, index } => {
            let value = infer_sub(value, scope)?;
            let index = infer_sub(index, scope)?;
            let ty = match value.ty.as_class() {
                Type::List(elem) if index.ty.as_class() == &Type::Integer => Type::instance((**elem).clone()),
                Type::Map(key, val) if index.ty.as_class() == &**key => Type::instance((**val).clone()),
                _ => return Err(InferError::TypeMismatch { expected: value.ty.clone(), actual: index.ty.clone() }),
            };
            Ok(Expr { span, ty, kind: ExprKind::Subscript { value: Box::new(value), index: Box::new(index) } })
        }
        ast::ExprKind::List(items) => {
            let items = items.iter().map(|i| infer_sub(i, scope)).collect::<Result<Vec<_>, _>>()?;
            let elem = unify_elements(&items)?;
            Ok(Expr { span, ty: Type::instance(Type::list_of(elem)), kind: ExprKind::List(items) })
        }
        ast::ExprKind::Tuple(items) => {
            // No distinct tuple type exists in this subset's type system;
            // a tuple literal behaves exactly as a list literal from here
            // on, matching the folder's own
            // `ExprKind::Tuple` → `ConstValue::List` treatment.
            let items = items.iter().map(|i| infer_sub(i, scope)).collect::<Result<Vec<_>, _>>()?;
            let elem = unify_elements(&items)?;
            Ok(Expr { span, ty: Type::instance(Type::list_of(elem)), kind: ExprKind::Tuple(items) })
        }
        ast::ExprKind::Dict { keys, values } => {
            let keys = keys.iter().map(|k| infer_sub(k, scope)).collect::<Result<Vec<_>, _>>()?;
            let values = values.iter().map(|v| infer_sub(v, scope)).collect::<Result<Vec<_>, _>>()?;
            let key_ty = unify_elements(&keys)?;
            let val_ty = unify_elements(&values)?;
            Ok(Expr { span, ty: Type::instance(Type::map_of(key_ty, val_ty)), kind: ExprKind::Dict { keys, values } })
        }
        ast::ExprKind::IfExp { test, body, orelse } => {
            let test = infer_sub(test, scope)?;
            if test.ty.as_class() != &Type::Bool {
                return Err(InferError::TypeMismatch { expected: Type::instance(Type::Bool), actual: test.ty.clone() });
            }
            let body = infer_sub(body, scope)?;
            let orelse = infer_sub(orelse, scope)?;
            if body.ty != orelse.ty {
                return Err(InferError::TypeMismatch { expected: body.ty.clone(), actual: orelse.ty.clone() });
            }
            let ty = body.ty.clone();
            Ok(Expr { span, ty, kind: ExprKind::IfExp { test: Box::new(test), body: Box::new(body), orelse: Box::new(orelse) } })
        }
        ast::ExprKind::IsInstance { value, class } => {
            let value = infer_sub(value, scope)?;
            let (_, binding) = scope.lookup(class.as_str()).ok_or_else(|| InferError::UnknownClass(class.to_string()))?;
            let Type::Record(schema) = &binding.ty else {
                return Err(InferError::NotARecordOrSum(binding.ty.clone()));
            };
            match value.ty.as_class() {
                Type::Sum(variants) if variants.iter().any(|v| v.tag == schema.tag && v.name == schema.name) => {}
                Type::Record(r) if r.name == schema.name => {}
                _ => return Err(InferError::TypeMismatch { expected: Type::instance(Type::Record(schema.clone())), actual: value.ty.clone() }),
            }
            Ok(Expr {
                span,
                ty: Type::instance(Type::Bool),
                kind: ExprKind::IsInstance { value: Box::new(value), class: class.clone(), tag: schema.tag },
            })
        }
    }
}

fn infer_sub(expr: &ast::Expr, scope: &mut ScopeStack) -> Result<Expr, InferError> {
    go(expr, scope).map_err(|e| InferError::Nested(Box::new(wrap(Pass::NodeVisiting, expr.span, node_desc(&expr.kind), e))))
}

fn literal_value(lit: &ast::Literal) -> ConstValue {
    match lit {
        ast::Literal::Int(i) => ConstValue::Int(i.clone()),
        ast::Literal::ByteString(b) => ConstValue::ByteString(b.clone()),
        ast::Literal::Str(s) => ConstValue::Str(s.clone()),
        ast::Literal::Bool(b) => ConstValue::Bool(*b),
        ast::Literal::None => ConstValue::Unit,
    }
}

fn unop_expected(op: UnOp) -> Type {
    match op {
        UnOp::Not => Type::instance(Type::Bool),
        UnOp::USub => Type::instance(Type::Integer),
    }
}

fn unop_result_type(op: UnOp, operand: &Type) -> Option<Type> {
    match (op, operand) {
        (UnOp::Not, Type::Bool) => Some(Type::instance(Type::Bool)),
        (UnOp::USub, Type::Integer) => Some(Type::instance(Type::Integer)),
        _ => None,
    }
}

/// Result type of a binary operator over two already-unwrapped class types,
/// or `None` if the operator has no recipe for that pair: resolved via
/// built-in codegen recipes keyed by (operator, operand types).
#[must_use]
pub fn binop_result_type(op: BinOp, left: &Type, right: &Type) -> Option<Type> {
    use BinOp::{Add, BitAnd, BitOr, BitXor, FloorDiv, LShift, Mod, Mult, RShift, Sub};
    match (op, left, right) {
        (Add, Type::Integer, Type::Integer)
        | (Sub, Type::Integer, Type::Integer)
        | (Mult, Type::Integer, Type::Integer)
        | (FloorDiv, Type::Integer, Type::Integer)
        | (Mod, Type::Integer, Type::Integer)
        | (BitAnd, Type::Integer, Type::Integer)
        | (BitOr, Type::Integer, Type::Integer)
        | (BitXor, Type::Integer, Type::Integer)
        | (LShift, Type::Integer, Type::Integer)
        | (RShift, Type::Integer, Type::Integer) => Some(Type::instance(Type::Integer)),
        (Add, Type::ByteString, Type::ByteString) => Some(Type::instance(Type::ByteString)),
        (Add, Type::String, Type::String) => Some(Type::instance(Type::String)),
        (Add, Type::List(a), Type::List(b)) if a == b => Some(Type::instance(Type::List(a.clone()))),
        _ => None,
    }
}

/// True iff `op` has a VM-representable comparison for this operand pair.
/// The VM's closed primitive set only compares integers, byte strings,
/// and `Data`, via `LessThanInteger`/`EqualsInteger`/`EqualsByteString`/
/// `EqualsData`; there is no `LessThan` over byte strings or records.
#[must_use]
pub fn compare_is_legal(op: CmpOp, left: &Type, right: &Type) -> bool {
    match op {
        CmpOp::Eq | CmpOp::NotEq => left == right,
        CmpOp::Lt | CmpOp::LtE | CmpOp::Gt | CmpOp::GtE => left == &Type::Integer && right == &Type::Integer,
    }
}

fn unify_elements(items: &[Expr]) -> Result<Type, InferError> {
    let Some(first) = items.first() else { return Ok(Type::Unit) };
    for item in &items[1..] {
        if item.ty != first.ty {
            return Err(InferError::TypeMismatch { expected: first.ty.clone(), actual: item.ty.clone() });
        }
    }
    Ok(first.ty.as_class().clone())
}

fn infer_call(span: Span, func: &ast::Expr, args: &[ast::Expr], keywords: &[ast::Keyword], scope: &mut ScopeStack) -> Result<Expr, InferError> {
    // Resolved up front, alongside (but independently of) `func_expr`: only
    // a *named* binding (a `def`) carries the parameter names keyword
    // arguments resolve against — a `Type::Function` value alone,
    // as held by e.g. a list element or a parameter, has none.
    let call_params = match &func.kind {
        ast::ExprKind::Name(name) => scope.lookup(name.as_str()).and_then(|(_, b)| b.call_params.clone()),
        _ => None,
    };
    let func_expr = infer_sub(func, scope)?;
    let args = args.iter().map(|a| infer_sub(a, scope)).collect::<Result<Vec<_>, _>>()?;
    let keywords = keywords
        .iter()
        .map(|k| Ok(Keyword { name: k.name.clone(), value: infer_sub(&k.value, scope)? }))
        .collect::<Result<Vec<_>, InferError>>()?;
    let keyword_names: Vec<Name> = keywords.iter().map(|k| k.name.clone()).collect();

    match func_expr.ty.as_class() {
        Type::Polymorphic(name) if name.as_str() == "len" => {
            if !keywords.is_empty() || args.len() != 1 {
                return Err(InferError::Signature(signature::SignatureError::TooManyPositional { expected: 1, got: args.len() }));
            }
            let (sig, _recipe) = len::specialize(&args[0].ty)?;
            Ok(Expr { span, ty: sig.ret.clone(), kind: ExprKind::Call { func: Box::new(func_expr), args, keywords } })
        }
        Type::Function(sig) => {
            check_signature(&sig, call_params.as_deref(), &args, &keywords)?;
            Ok(Expr { span, ty: sig.ret.clone(), kind: ExprKind::Call { func: Box::new(func_expr), args, keywords } })
        }
        Type::Record(schema) => {
            // A class reference used as a call is construction: the
            // constructor's signature is its field list, positionally.
            let params: Vec<ParamSig> = schema.fields.iter().map(|f| ParamSig { name: f.name.clone(), has_default: false }).collect();
            let sources = signature::bind_call(&params, args.len(), &keyword_names)?;
            let ordered = reorder_by_source(&sources, &args, &keywords);
            for (field, arg) in schema.fields.iter().zip(&ordered) {
                if field.ty != arg.ty {
                    return Err(InferError::TypeMismatch { expected: field.ty.clone(), actual: arg.ty.clone() });
                }
            }
            Ok(Expr { span, ty: Type::instance(Type::Record(schema.clone())), kind: ExprKind::Call { func: Box::new(func_expr), args, keywords } })
        }
        other => Err(InferError::NotCallable(other.clone())),
    }
}

/// Resolves each parameter's `ArgSource` to the actual supplied expression,
/// for type-checking a constructor call positionally after keyword
/// resolution. Parameters left at `Default` have none here (record
/// constructors declare no defaults); those positions are skipped.
fn reorder_by_source<'a>(sources: &[signature::ArgSource], args: &'a [Expr], keywords: &'a [Keyword]) -> Vec<&'a Expr> {
    sources
        .iter()
        .filter_map(|s| match s {
            signature::ArgSource::Positional(i) => Some(&args[*i]),
            signature::ArgSource::Keyword(i) => Some(&keywords[*i].value),
            signature::ArgSource::Default => None,
        })
        .collect()
}

fn check_signature(sig: &FunctionType, named: Option<&[ParamSig]>, args: &[Expr], keywords: &[Keyword]) -> Result<(), InferError> {
    let keyword_names: Vec<Name> = keywords.iter().map(|k| k.name.clone()).collect();
    match named {
        Some(named) => {
            let sources = signature::bind_call(named, args.len(), &keyword_names)?;
            for (source, param_ty) in sources.iter().zip(&sig.params) {
                let arg = match source {
                    signature::ArgSource::Positional(i) => &args[*i],
                    signature::ArgSource::Keyword(i) => &keywords[*i].value,
                    // Parameters with defaults are type-checked once, at
                    // the function's own definition site; a call that
                    // omits one has nothing further to check here.
                    signature::ArgSource::Default => continue,
                };
                if !crate::types::compatible(param_ty, &arg.ty) {
                    return Err(InferError::TypeMismatch { expected: param_ty.clone(), actual: arg.ty.clone() });
                }
            }
            Ok(())
        }
        None => {
            // No named parameter list available (a first-class function
            // value, not a direct call to a `def`): keyword arguments
            // cannot be resolved against it at all.
            if let Some(first) = keyword_names.first() {
                return Err(InferError::Signature(signature::SignatureError::UnknownKeyword(first.clone())));
            }
            if args.len() != sig.params.len() {
                return Err(InferError::Signature(signature::SignatureError::TooManyPositional { expected: sig.params.len(), got: args.len() }));
            }
            for (param_ty, arg) in sig.params.iter().zip(args) {
                if !crate::types::compatible(param_ty, &arg.ty) {
                    return Err(InferError::TypeMismatch { expected: param_ty.clone(), actual: arg.ty.clone() });
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_addition_infers_to_integer() {
        assert_eq!(binop_result_type(BinOp::Add, &Type::Integer, &Type::Integer), Some(Type::instance(Type::Integer)));
    }

    #[test]
    fn ordering_compare_rejects_byte_strings() {
        assert!(!compare_is_legal(CmpOp::Lt, &Type::ByteString, &Type::ByteString));
        assert!(compare_is_legal(CmpOp::Lt, &Type::Integer, &Type::Integer));
    }

    #[test]
    fn equality_compare_accepts_any_matching_pair() {
        assert!(compare_is_legal(CmpOp::Eq, &Type::ByteString, &Type::ByteString));
    }
}
