//! The inference pass entry point: wires the initial scope (built-in
//! catalog + domain prelude), then walks the module body under the
//! two-sweep algorithm in [`stmt`].

pub mod error;
pub mod expr;
pub mod signature;
pub mod stmt;

use crate::{ast, builtins, diagnostics::Diagnostic, prelude, scope::ScopeStack, typed_ast::Module};

/// Infers `module` under `entry_point`'s rules (the validator's no-defaults
/// constraint applies only to the function of this name). Returns the typed
/// module plus the populated top-level scope, which code-gen does not need
/// but which is handy for re-running inference and comparing scopes
/// for idempotence.
pub fn infer_module(module: &ast::Module, entry_point: &str) -> Result<(Module, ScopeStack), Diagnostic> {
    infer_module_with_prelude_stub(None, module, entry_point)
}

/// Same as [`infer_module`], but first runs `stub`'s own top-level
/// statements through the *same* module-scope frame before `module`'s own
/// body is visited — the classes and functions `stub` declares land in
/// scope for `module` to reference, exactly as a plain top-level import
/// would. `stub`'s own typed statements are discarded; only its effect on
/// the scope (new class/function bindings) survives. Used by
/// `plutoc_type_checking`'s type-stub support, which checks a source file
/// against a separate `.pyi`-style stub file the same way.
pub fn infer_module_with_prelude_stub(
    stub: Option<&ast::Module>,
    module: &ast::Module,
    entry_point: &str,
) -> Result<(Module, ScopeStack), Diagnostic> {
    let mut scope = ScopeStack::new();
    builtins::install(&mut scope);
    prelude::install(&mut scope);
    // Module scope is its own frame, nested under the initial (built-in +
    // prelude) one: module scope, then nested per function.
    scope.push_frame();
    if let Some(stub) = stub {
        stmt::infer_body(&stub.body, &mut scope, entry_point, None)?;
    }
    let body = stmt::infer_body(&module.body, &mut scope, entry_point, None)?;
    Ok((Module { body }, scope))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn an_empty_module_infers_to_an_empty_body() {
        let module = ast::Module { body: vec![] };
        let (typed, scope) = infer_module(&module, "validator").unwrap();
        assert!(typed.body.is_empty());
        assert!(scope.lookup("len").is_some());
        assert!(scope.lookup("ScriptContext").is_some());
    }

    #[test]
    fn a_stub_modules_classes_are_visible_to_the_main_module() {
        use crate::ast::front::lower_module;

        let stub = lower_module("class Pair:\n    a: int\n    b: int\n").unwrap();
        let module = lower_module("def validator(p: Pair) -> int:\n    return p.a\n").unwrap();
        let (typed, scope) = infer_module_with_prelude_stub(Some(&stub), &module, "validator").unwrap();
        assert_eq!(typed.body.len(), 1);
        assert!(scope.lookup("Pair").is_some());
    }
}
