//! The type system: type kinds, the class/instance distinction,
//! compatibility rules, and the constant value representation the folder
//! and code-gen share.

pub mod record;

use std::rc::Rc;

use num_bigint::BigInt;

use crate::{names::Name, types::record::RecordSchema};

/// A function signature: fixed-arity, no variadics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub ret: Type,
}

/// One parameter's name and whether it has a default, as seen from a call
/// site resolving keyword arguments. Carried alongside a
/// `FunctionType` binding rather than folded into it, since a bare
/// `FunctionT` value (e.g. one passed as an argument) has no names of its
/// own — only a function *definition*'s own scope binding does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSig {
    pub name: Name,
    pub has_default: bool,
}

/// One of the value categories, or the meta-wrapper distinguishing a
/// *class* reference (a type constructor / record schema, used bare) from an
/// *instance* of that type (`InstanceOf`, used by almost every expression).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Integer,
    ByteString,
    String,
    Bool,
    Unit,
    List(Rc<Type>),
    Map(Rc<Type>, Rc<Type>),
    Record(Rc<RecordSchema>),
    /// An ordered set of `Record` variants, discriminated by constructor tag.
    Sum(Rc<Vec<Rc<RecordSchema>>>),
    Function(Rc<FunctionType>),
    /// A named built-in that behaves as a `Function` only after the
    /// inference pass specializes it from the call's argument types (`len`).
    Polymorphic(Name),
    /// "a value of `T`" — wraps any of the above. Every expression node's
    /// type is `Instance(_)` unless the expression is itself a bare
    /// reference to a class.
    Instance(Rc<Type>),
}

impl Type {
    #[must_use]
    pub fn instance(inner: Type) -> Type {
        Type::Instance(Rc::new(inner))
    }

    #[must_use]
    pub fn list_of(elem: Type) -> Type {
        Type::List(Rc::new(elem))
    }

    #[must_use]
    pub fn map_of(key: Type, value: Type) -> Type {
        Type::Map(Rc::new(key), Rc::new(value))
    }

    #[must_use]
    pub fn function(params: Vec<Type>, ret: Type) -> Type {
        Type::Function(Rc::new(FunctionType { params, ret }))
    }

    /// Unwraps one layer of `Instance`, if present — used where callers
    /// already know they want the underlying class-level shape.
    #[must_use]
    pub fn as_class(&self) -> &Type {
        match self {
            Type::Instance(inner) => inner,
            other => other,
        }
    }

    #[must_use]
    pub fn is_instance(&self) -> bool {
        matches!(self, Type::Instance(_))
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Integer => write!(f, "int"),
            Type::ByteString => write!(f, "bytes"),
            Type::String => write!(f, "str"),
            Type::Bool => write!(f, "bool"),
            Type::Unit => write!(f, "None"),
            Type::List(elem) => write!(f, "List[{elem}]"),
            Type::Map(k, v) => write!(f, "Dict[{k}, {v}]"),
            Type::Record(schema) => write!(f, "{}", schema.name),
            Type::Sum(variants) => {
                let names: Vec<_> = variants.iter().map(|v| v.name.to_string()).collect();
                write!(f, "Union[{}]", names.join(", "))
            }
            Type::Function(sig) => {
                let params: Vec<_> = sig.params.iter().map(ToString::to_string).collect();
                write!(f, "({}) -> {}", params.join(", "), sig.ret)
            }
            Type::Polymorphic(name) => write!(f, "<{name}>"),
            Type::Instance(inner) => write!(f, "{inner}"),
        }
    }
}

/// Returns the instance type for an atomic constant value.
#[must_use]
pub fn type_of_literal(value: &ConstValue) -> Type {
    Type::instance(type_of_literal_class(value))
}

fn type_of_literal_class(value: &ConstValue) -> Type {
    match value {
        ConstValue::Int(_) => Type::Integer,
        ConstValue::ByteString(_) => Type::ByteString,
        ConstValue::Str(_) => Type::String,
        ConstValue::Bool(_) => Type::Bool,
        ConstValue::Unit => Type::Unit,
        ConstValue::List(items) => {
            // An empty folded list cannot recover its element type from its
            // values alone; callers that need one fall back to the
            // statically inferred annotation instead of this helper.
            let elem = items.first().map_or(Type::Unit, type_of_literal_class);
            Type::list_of(elem)
        }
        ConstValue::Map(items) => {
            let (k, v) = items
                .first()
                .map(|(k, v)| (type_of_literal_class(k), type_of_literal_class(v)))
                .unwrap_or((Type::Unit, Type::Unit));
            Type::map_of(k, v)
        }
    }
}

/// Returns true iff a value of `actual` may be used where `declared` is
/// required: structural equality, except `SumT` accepts any of its
/// variants, unit only accepts unit, and `ListT` requires element equality
/// (already implied by structural equality, called out for clarity).
#[must_use]
pub fn compatible(declared: &Type, actual: &Type) -> bool {
    match (declared, actual) {
        (Type::Instance(d), Type::Instance(a)) => compatible_class(d, a),
        (d, a) => d == a,
    }
}

fn compatible_class(declared: &Type, actual: &Type) -> bool {
    match (declared, actual) {
        (Type::Sum(variants), Type::Record(_)) => variants.iter().any(|v| Type::Record(v.clone()) == *actual),
        (Type::Sum(_), Type::Sum(_)) => declared == actual,
        (Type::Unit, Type::Unit) => true,
        (Type::Unit, _) | (_, Type::Unit) => false,
        (Type::List(d_elem), Type::List(a_elem)) => compatible_class(d_elem, a_elem),
        (Type::Map(dk, dv), Type::Map(ak, av)) => compatible_class(dk, ak) && compatible_class(dv, av),
        _ => declared == actual,
    }
}

/// An atomic or finite-container literal value, as produced by the source
/// parser for a literal expression or recovered by the constant folder's
/// sandbox evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Int(BigInt),
    ByteString(Vec<u8>),
    Str(String),
    Bool(bool),
    Unit,
    List(Vec<ConstValue>),
    Map(Vec<(ConstValue, ConstValue)>),
}

impl std::fmt::Display for ConstValue {
    /// Renders a constant the way the on-chain VM's textual UPLC syntax
    /// does for `con <type> <value>` literals — used only by the CLI's
    /// human-readable IR dump, never by anything the core passes
    /// themselves consume.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstValue::Int(i) => write!(f, "(con integer {i})"),
            ConstValue::ByteString(bytes) => {
                write!(f, "(con bytestring #")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                write!(f, ")")
            }
            ConstValue::Str(s) => write!(f, "(con string {s:?})"),
            ConstValue::Bool(b) => write!(f, "(con bool {b})"),
            ConstValue::Unit => write!(f, "(con unit ())"),
            ConstValue::List(items) => {
                write!(f, "(con list [")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "])")
            }
            ConstValue::Map(items) => {
                write!(f, "(con map [")?;
                for (i, (k, v)) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "({k}, {v})")?;
                }
                write!(f, "])")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record::RecordSchema;

    #[test]
    fn unit_only_accepts_unit() {
        assert!(compatible(&Type::instance(Type::Unit), &Type::instance(Type::Unit)));
        assert!(!compatible(&Type::instance(Type::Unit), &Type::instance(Type::Integer)));
    }

    #[test]
    fn sum_accepts_any_variant() {
        let a = Rc::new(RecordSchema { name: Name::new("A"), tag: 0, fields: vec![] });
        let b = Rc::new(RecordSchema { name: Name::new("B"), tag: 1, fields: vec![] });
        let sum = Type::instance(Type::Sum(Rc::new(vec![a.clone(), b.clone()])));
        assert!(compatible(&sum, &Type::instance(Type::Record(a))));
        assert!(compatible(&sum, &Type::instance(Type::Record(b))));
    }

    #[test]
    fn list_requires_matching_element_type() {
        let ints = Type::instance(Type::list_of(Type::Integer));
        let bytes = Type::instance(Type::list_of(Type::ByteString));
        assert!(compatible(&ints, &ints.clone()));
        assert!(!compatible(&ints, &bytes));
    }

    #[test]
    fn type_of_int_literal_is_instance_of_integer() {
        assert_eq!(type_of_literal(&ConstValue::Int(BigInt::from(1))), Type::instance(Type::Integer));
    }
}
