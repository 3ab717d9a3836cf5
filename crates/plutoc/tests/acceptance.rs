//! End-to-end scenarios exercising the whole pipeline (front end through
//! code generation) against a small call-by-value reducer for the
//! generated IR. See `tests/common/mod.rs` for the reducer itself and its
//! scope.

mod common;

use num_bigint::BigInt;
use plutoc::{compile, ir::VmBuiltin, CompileOptions, Term};

fn compile_ok(source: &str, entry_point: &str) -> Term {
    compile(source, &CompileOptions::new(entry_point)).expect("fixture compiles")
}

fn int(n: i64) -> Term {
    Term::constant(plutoc::types::ConstValue::Int(BigInt::from(n)))
}

#[test]
fn plain_positional_arithmetic() {
    let source = "def validator(x: int, y: int, z: int) -> int:\n    return (x - y) * z\n";
    let term = compile_ok(source, "validator");
    let result = common::run_validator_to_int(&term, [int(3), int(1), int(4)]);
    assert_eq!(result, BigInt::from(8));
}

#[test]
fn keyword_call_into_a_function_shadowed_by_an_inner_definition_of_the_same_name() {
    // Grounded on `opshin/tests/test_keywords.py::test_correct_scope`: an
    // outer function redefines a name matching an already-bound one, and
    // calls it by keyword; resolution must use the inner definition's own
    // parameter names, not the outer scope's bindings of the same name.
    let source = "\
def f(x: int, y: int, z: int) -> int:
    def f(new_x: int, new_z: int) -> int:
        return (new_x - new_z) * y
    return f(new_x=x, new_z=z)
";
    let term = compile_ok(source, "f");
    let result = common::run_validator_to_int(&term, [int(2), int(5), int(1)]);
    assert_eq!(result, BigInt::from(5));
}

#[test]
fn a_keyword_argument_before_a_positional_one_is_rejected_at_the_front_end() {
    // Python's own grammar (and therefore this compiler's front end, which
    // lowers from the same parser) never produces a positional argument
    // following a keyword one — the rule is a syntax error, not something
    // the call-binding logic ever sees.
    let source = "def validator(x: int, y: int) -> int:\n    return validator(x=1, 2)\n";
    let err = compile(source, &CompileOptions::new("validator")).unwrap_err();
    assert!(matches!(err, plutoc::CompileError::FrontEnd(_)));
}

#[test]
fn an_omitted_trailing_parameter_falls_back_to_its_default() {
    let source = "\
def simple_example(x: int, y: int, z: int = 7) -> int:
    return (x - z) * y

def validator(a: int, b: int) -> int:
    return simple_example(a, b)
";
    let term = compile_ok(source, "validator");
    let result = common::run_validator_to_int(&term, [int(10), int(3)]);
    assert_eq!(result, BigInt::from(9));
}

#[test]
fn a_default_value_of_the_wrong_declared_type_is_rejected_at_inference() {
    let source = "def helper(x: int, z: int = \"hello\") -> int:\n    return x - z\n\ndef validator(a: int) -> int:\n    return helper(a)\n";
    let err = compile(source, &CompileOptions::new("validator")).unwrap_err();
    assert!(matches!(err, plutoc::CompileError::Diagnostic(_)));
}

#[test]
fn the_entry_point_itself_may_not_declare_a_default() {
    let source = "def validator(x: int, z: int = 1) -> int:\n    return x - z\n";
    let err = compile(source, &CompileOptions::new("validator")).unwrap_err();
    assert!(matches!(err, plutoc::CompileError::Diagnostic(_)));
}

#[test]
fn folding_a_closed_arithmetic_expression_leaves_no_add_integer_application() {
    let source = "def validator(_: None, __: None, ___: None) -> int:\n    return 2 + 3\n";
    let term = compile_ok(source, "validator");
    assert!(contains_constant_int(&term, &BigInt::from(5)), "expected the folded constant 5 somewhere in the term");
    assert!(!contains_builtin(&term, VmBuiltin::AddInteger), "folding should have removed the addInteger application");
}

#[test]
fn disabling_folding_keeps_the_add_integer_application() {
    let source = "def validator(_: None, __: None, ___: None) -> int:\n    return 2 + 3\n";
    let options = CompileOptions { fold_constants: false, ..CompileOptions::new("validator") };
    let term = compile(source, &options).unwrap();
    assert!(contains_builtin(&term, VmBuiltin::AddInteger));
}

fn contains_constant_int(term: &Term, want: &BigInt) -> bool {
    match term {
        Term::Constant(plutoc::types::ConstValue::Int(i)) => i == want,
        Term::Lambda(_, body) | Term::Delay(body) | Term::Force(body) => contains_constant_int(body, want),
        Term::Apply(f, a) => contains_constant_int(f, want) || contains_constant_int(a, want),
        _ => false,
    }
}

fn contains_builtin(term: &Term, want: VmBuiltin) -> bool {
    match term {
        Term::BuiltIn(b) => *b == want,
        Term::Lambda(_, body) | Term::Delay(body) | Term::Force(body) => contains_builtin(body, want),
        Term::Apply(f, a) => contains_builtin(f, want) || contains_builtin(a, want),
        _ => false,
    }
}
