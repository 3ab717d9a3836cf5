//! Record (tagged-constructor) schemas: the backbone of `RecordT`/`SumT`
//! and of the domain prelude types (`ScriptContext`, `TxOut`, ...).

use crate::{names::Name, types::Type};

/// One field of a record, in declaration order — fields are projected
/// positionally into the IR's data constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: Name,
    pub ty: Type,
}

/// A named, tagged constructor schema: `RecordT(tag, fields)`.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    pub name: Name,
    pub tag: i64,
    pub fields: Vec<FieldSchema>,
}

impl RecordSchema {
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name.as_str() == name)
    }
}

/// Equality is by constructor tag and field-*type* sequence, not by schema
/// name or field name — two independently declared classes with the same
/// shape are the same `RecordT` (see DESIGN.md). `isinstance` checks
/// (`infer/expr.rs`) additionally compare `name` where that narrower,
/// nominal sense is what's wanted.
impl PartialEq for RecordSchema {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.fields.len() == other.fields.len() && self.fields.iter().zip(&other.fields).all(|(a, b)| a.ty == b.ty)
    }
}

impl Eq for RecordSchema {}
