//! Keyword- and default-argument resolution, end to end. Each test mirrors
//! one case from `opshin/tests/test_keywords.py`, with a fixed concrete
//! instantiation standing in for that file's hypothesis-generated inputs.

mod common;

use num_bigint::BigInt;
use plutoc::{compile, CompileOptions};

fn int(n: i64) -> plutoc::Term {
    plutoc::Term::constant(plutoc::types::ConstValue::Int(BigInt::from(n)))
}

fn compiles(source: &str) -> plutoc::Term {
    compile(source, &CompileOptions::new("validator")).expect("fixture compiles")
}

fn rejected(source: &str) -> plutoc::CompileError {
    compile(source, &CompileOptions::new("validator")).expect_err("fixture should not compile")
}

#[test]
fn all_arguments_passed_by_keyword() {
    let source = "\
def simple_example(x: int, y: int, z: int) -> int:
    return (x - y) * z

def validator(a: int, b: int, c: int) -> int:
    return simple_example(x=a, y=b, z=c)
";
    let term = compiles(source);
    let result = common::run_validator_to_int(&term, [int(5), int(2), int(3)]);
    assert_eq!(result, BigInt::from((5 - 2) * 3));
}

#[test]
fn a_mixture_of_positional_and_keyword_arguments() {
    let source = "\
def simple_example(x: int, y: int, z: int) -> int:
    return (x - y) * z

def validator(a: int, b: int, c: int) -> int:
    return simple_example(a, b, z=c)
";
    let term = compiles(source);
    let result = common::run_validator_to_int(&term, [int(5), int(2), int(3)]);
    assert_eq!(result, BigInt::from((5 - 2) * 3));
}

#[test]
fn keyword_arguments_bind_by_name_regardless_of_call_site_order() {
    let source = "\
def simple_example(x: int, y: int, z: int) -> int:
    return (x - y) * z

def validator(a: int, b: int, c: int) -> int:
    return simple_example(z=c, x=a, y=b)
";
    let term = compiles(source);
    let result = common::run_validator_to_int(&term, [int(5), int(2), int(3)]);
    assert_eq!(result, BigInt::from((5 - 2) * 3));
}

#[test]
fn a_positional_argument_after_a_keyword_argument_is_rejected() {
    let source = "\
def simple_example(x: int, y: int, z: int) -> int:
    return (x - y) * z

def validator(a: int, b: int, c: int) -> int:
    return simple_example(x=a, y=b, c)
";
    let err = rejected(source);
    assert!(matches!(err, plutoc::CompileError::FrontEnd(_)));
}

#[test]
fn more_keywords_than_the_callee_has_parameters_is_rejected() {
    let source = "\
def simple_example(x: int, y: int) -> int:
    return x - y

def validator(a: int, b: int, c: int) -> int:
    return simple_example(x=a, y=b, z=c)
";
    let err = rejected(source);
    assert!(matches!(err, plutoc::CompileError::Diagnostic(_)));
}

#[test]
fn a_keyword_naming_a_parameter_the_callee_does_not_have_is_rejected() {
    let source = "\
def simple_example(x: int, y: int, z: int) -> int:
    return (x - y) * z

def validator(a: int, b: int, c: int) -> int:
    return simple_example(x=a, y=b, k=c)
";
    let err = rejected(source);
    assert!(matches!(err, plutoc::CompileError::Diagnostic(_)));
}

#[test]
fn a_keyword_used_twice_for_the_same_parameter_is_rejected() {
    let source = "\
def simple_example(x: int, y: int) -> int:
    return x - y

def validator(a: int, b: int) -> int:
    return simple_example(a, x=b)
";
    let err = rejected(source);
    assert!(matches!(err, plutoc::CompileError::Diagnostic(_)));
}

#[test]
fn an_inner_definition_shadows_the_outer_one_for_name_resolution_but_not_for_the_keywords_it_accepts() {
    let source = "\
def simple_example(x: int, y: int, z: int) -> int:
    def simple_example(new_x: int, new_z: int) -> int:
        return new_x - new_z
    return simple_example(new_x=x, new_z=z) * y

def validator(a: int, b: int, c: int) -> int:
    return simple_example(x=a, y=b, z=c)
";
    let term = compiles(source);
    let result = common::run_validator_to_int(&term, [int(5), int(2), int(3)]);
    assert_eq!(result, BigInt::from((5 - 3) * 2));
}

#[test]
fn an_omitted_argument_falls_back_to_its_parameter_default() {
    let source = "\
def simple_example(x: int, y: int, z: int = 7) -> int:
    return (x - z) * y

def validator(a: int, b: int) -> int:
    return simple_example(a, b)
";
    let term = compiles(source);
    let result = common::run_validator_to_int(&term, [int(5), int(2)]);
    assert_eq!(result, BigInt::from((5 - 7) * 2));
}

#[test]
fn a_default_value_that_does_not_match_the_declared_type_is_rejected() {
    let source = "\
def simple_example(x: int, y: int, z: int = \"hello\") -> int:
    return (x - z) * y

def validator(a: int, b: int) -> int:
    return simple_example(a, b)
";
    let err = rejected(source);
    assert!(matches!(err, plutoc::CompileError::Diagnostic(_)));
}

#[test]
fn the_validator_entry_point_itself_may_not_declare_a_default() {
    let source = "def validator(a: int, b: int, c: int = 1) -> int:\n    return a * b * c\n";
    let err = rejected(source);
    assert!(matches!(err, plutoc::CompileError::Diagnostic(_)));
}
