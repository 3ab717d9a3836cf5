//! The domain-specific transaction-context types pre-loaded into the
//! initial scope: `ScriptContext` and the record and sum types it is
//! built from.
//!
//! These are ordinary `RecordT`/`SumT` class bindings — nothing here is
//! special-cased by the inference, folding, or code-gen passes beyond being
//! present in scope before a script's own top-level statements run.
//!
//! Grounded on `original_source/examples/smart_contracts/wrapped_token.py`,
//! the one example script in the corpus that imports `eopsin.prelude`. That
//! script only exercises a subset of the real Cardano ledger API's fields —
//! `TxInfo` here carries `inputs`/`outputs`/`mint` and nothing else (no fee,
//! validity range, certificates, or signatories), since nothing in the
//! corpus names or uses them and inventing the rest would not be grounded in
//! anything (see DESIGN.md).

use std::rc::Rc;

use crate::{
    names::Name,
    scope::{Binding, ScopeStack},
    types::{Type, record::{FieldSchema, RecordSchema}},
};

fn record(name: &str, tag: i64, fields: &[(&str, Type)]) -> Rc<RecordSchema> {
    Rc::new(RecordSchema {
        name: Name::new(name),
        tag,
        fields: fields.iter().map(|(n, ty)| FieldSchema { name: Name::new(*n), ty: ty.clone() }).collect(),
    })
}

/// Binds a record or sum class under its own name, as a bare class
/// reference rather than `InstanceOf` — scripts construct and
/// `isinstance`-match these by name, they never hold a "class of T" value.
fn bind_class(scope: &mut ScopeStack, name: &str, ty: Type) {
    scope.bind(Name::new(name), Binding::new(ty));
}

/// Populates the initial scope with the prelude's transaction-context types.
/// Called once, before a script's own top-level statements are visited.
pub fn install(scope: &mut ScopeStack) {
    let policy_id = Type::ByteString;
    bind_class(scope, "PolicyId", policy_id.clone());

    let tx_out_ref = record("TxOutRef", 0, &[("tx_id", Type::ByteString), ("tx_index", Type::Integer)]);
    bind_class(scope, "TxOutRef", Type::Record(tx_out_ref.clone()));

    let token = record("Token", 0, &[("policy_id", policy_id.clone()), ("token_name", Type::ByteString)]);
    bind_class(scope, "Token", Type::Record(token));

    let pub_key_credential = record("PubKeyCredential", 0, &[("pub_key_hash", Type::ByteString)]);
    let script_credential = record("ScriptCredential", 1, &[("validator_hash", policy_id.clone())]);
    let credential = Type::Sum(Rc::new(vec![pub_key_credential.clone(), script_credential.clone()]));
    bind_class(scope, "PubKeyCredential", Type::Record(pub_key_credential));
    bind_class(scope, "ScriptCredential", Type::Record(script_credential));
    bind_class(scope, "Credential", credential.clone());

    let some_staking_credential = record("SomeStakingCredential", 0, &[("credential", credential.clone())]);
    let no_staking_credential = record("NoStakingCredential", 1, &[]);
    let staking_credential = Type::Sum(Rc::new(vec![some_staking_credential.clone(), no_staking_credential.clone()]));
    bind_class(scope, "SomeStakingCredential", Type::Record(some_staking_credential));
    bind_class(scope, "NoStakingCredential", Type::Record(no_staking_credential));
    bind_class(scope, "StakingCredential", staking_credential.clone());

    let address = record("Address", 0, &[("credential", credential), ("staking_credential", staking_credential)]);
    bind_class(scope, "Address", Type::Record(address.clone()));

    let value = Type::map_of(policy_id.clone(), Type::map_of(Type::ByteString, Type::Integer));

    let no_output_datum = record("NoOutputDatum", 0, &[]);
    let some_output_datum_hash = record("SomeOutputDatumHash", 1, &[("datum_hash", Type::ByteString)]);
    let some_output_datum = record("SomeOutputDatum", 2, &[("datum", Type::ByteString)]);
    let output_datum = Type::Sum(Rc::new(vec![
        no_output_datum.clone(),
        some_output_datum_hash.clone(),
        some_output_datum.clone(),
    ]));
    bind_class(scope, "NoOutputDatum", Type::Record(no_output_datum));
    bind_class(scope, "SomeOutputDatumHash", Type::Record(some_output_datum_hash));
    bind_class(scope, "SomeOutputDatum", Type::Record(some_output_datum));
    bind_class(scope, "OutputDatum", output_datum.clone());

    let tx_out = record(
        "TxOut",
        0,
        &[("address", Type::Record(address.clone())), ("value", value.clone()), ("datum", output_datum)],
    );
    bind_class(scope, "TxOut", Type::Record(tx_out.clone()));

    let tx_in_info = record(
        "TxInInfo",
        0,
        &[("out_ref", Type::Record(tx_out_ref.clone())), ("resolved", Type::Record(tx_out.clone()))],
    );
    bind_class(scope, "TxInInfo", Type::Record(tx_in_info.clone()));

    let tx_info = record(
        "TxInfo",
        0,
        &[
            ("inputs", Type::list_of(Type::Record(tx_in_info))),
            ("outputs", Type::list_of(Type::Record(tx_out))),
            ("mint", value),
        ],
    );
    bind_class(scope, "TxInfo", Type::Record(tx_info.clone()));

    let minting = record("Minting", 0, &[("policy_id", policy_id)]);
    let spending = record("Spending", 1, &[("tx_out_ref", Type::Record(tx_out_ref))]);
    let script_purpose = Type::Sum(Rc::new(vec![minting.clone(), spending.clone()]));
    bind_class(scope, "Minting", Type::Record(minting));
    bind_class(scope, "Spending", Type::Record(spending));
    bind_class(scope, "ScriptPurpose", script_purpose.clone());

    let script_context = record("ScriptContext", 0, &[("tx_info", Type::Record(tx_info)), ("purpose", script_purpose)]);
    bind_class(scope, "ScriptContext", Type::Record(script_context));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_context_resolves_in_initial_scope() {
        let mut scope = ScopeStack::new();
        install(&mut scope);
        let (_, binding) = scope.lookup("ScriptContext").expect("ScriptContext is pre-loaded");
        assert!(matches!(binding.ty, Type::Record(_)));
    }

    #[test]
    fn script_purpose_has_minting_and_spending_variants() {
        let mut scope = ScopeStack::new();
        install(&mut scope);
        let (_, binding) = scope.lookup("ScriptPurpose").expect("ScriptPurpose is pre-loaded");
        let Type::Sum(variants) = &binding.ty else { panic!("expected a sum type") };
        let names: Vec<_> = variants.iter().map(|v| v.name.to_string()).collect();
        assert_eq!(names, vec!["Minting", "Spending"]);
    }
}
