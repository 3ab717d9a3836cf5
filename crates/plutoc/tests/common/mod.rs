//! A tiny, test-only reducer for the VM's IR (`plutoc::Term`).
//!
//! The on-chain VM itself is out of scope for this compiler — the binary
//! serializer for the VM IR and the VM's own execution are peripheral
//! collaborators, and there is no production evaluator in this workspace to
//! call. But the acceptance scenarios are phrased as "compiled, evaluated
//! on the VM, returns X", and the only way to make those properties into
//! real tests is to reduce the IR ourselves.
//!
//! This is a small call-by-value interpreter over the closed subset of
//! `VmBuiltin` the compiler's own lowering rules actually emit for
//! the language subset under test: integer arithmetic and comparisons,
//! `IfThenElse`, and the cons-list primitives code-gen uses both for
//! `for`/`len`/`sum`/`all`/`any` and for its mutual-recursion tuple
//! encoding. It is deliberately not a general PlutusData/UPLC machine —
//! anything beyond that subset (bitwise integer ops, byte-string/string
//! builtins, `ConstrData`/`UnConstrData`/`EqualsData` records) raises a
//! plain `Err` rather than being faithfully modeled, since no test here
//! exercises them end-to-end.

use std::rc::Rc;

use num_bigint::BigInt;
use plutoc::{ir::VmBuiltin, names::Name, types::ConstValue, Term};

#[derive(Debug, Clone)]
pub enum Value {
    Int(BigInt),
    Bool(bool),
    Unit,
    Nil,
    Cons(Rc<Value>, Rc<Value>),
    Closure(Name, Rc<Term>, Rc<Env>),
    Suspension(Rc<Term>, Rc<Env>),
    /// A builtin with `args` already-evaluated arguments accumulated so far.
    Partial(VmBuiltin, Vec<Rc<Value>>),
}

#[derive(Debug)]
pub enum Env {
    Empty,
    Frame(Name, Rc<Value>, Rc<Env>),
}

impl Env {
    fn lookup(self: &Rc<Self>, name: &str) -> Option<Rc<Value>> {
        let mut cur = self.clone();
        loop {
            match &*cur {
                Env::Empty => return None,
                Env::Frame(n, v, rest) => {
                    if n.as_str() == name {
                        return Some(v.clone());
                    }
                    cur = rest.clone();
                }
            }
        }
    }
}

pub type EvalResult = Result<Rc<Value>, String>;

/// Evaluates a closed term to a value. Returns `Err` both for the VM's own
/// `(error)` term and for anything this reducer declines to model.
pub fn eval_closed(term: &Term) -> EvalResult {
    eval(term, &Rc::new(Env::Empty))
}

fn eval(term: &Term, env: &Rc<Env>) -> EvalResult {
    match term {
        Term::Var(name) => env.lookup(name.as_str()).ok_or_else(|| format!("unbound variable `{name}`")),
        Term::Lambda(name, body) => Ok(Rc::new(Value::Closure(name.clone(), body.clone(), env.clone()))),
        Term::Apply(f, a) => {
            let fv = eval(f, env)?;
            let av = eval(a, env)?;
            apply(&fv, av)
        }
        Term::Delay(inner) => Ok(Rc::new(Value::Suspension(inner.clone(), env.clone()))),
        Term::Force(inner) => {
            let v = eval(inner, env)?;
            force_value(&v)
        }
        Term::Constant(c) => Ok(Rc::new(from_const(c))),
        Term::BuiltIn(b) => Ok(Rc::new(Value::Partial(*b, vec![]))),
        Term::Error => Err("(error) reached".to_owned()),
    }
}

fn force_value(v: &Rc<Value>) -> EvalResult {
    match &**v {
        Value::Suspension(term, env) => eval(term, env),
        _ => Ok(v.clone()),
    }
}

fn apply(f: &Rc<Value>, arg: Rc<Value>) -> EvalResult {
    match &**f {
        Value::Closure(name, body, closure_env) => {
            let new_env = Rc::new(Env::Frame(name.clone(), arg, closure_env.clone()));
            eval(body, &new_env)
        }
        Value::Partial(b, args) => {
            let mut args = args.clone();
            args.push(arg);
            if args.len() == arity(*b) {
                apply_builtin(*b, args)
            } else {
                Ok(Rc::new(Value::Partial(*b, args)))
            }
        }
        _ => Err("applied a non-function value".to_owned()),
    }
}

fn from_const(c: &ConstValue) -> Value {
    match c {
        ConstValue::Int(i) => Value::Int(i.clone()),
        ConstValue::Bool(b) => Value::Bool(*b),
        ConstValue::Unit => Value::Unit,
        ConstValue::List(items) => items.iter().rev().fold(Value::Nil, |tail, item| Value::Cons(Rc::new(from_const(item)), Rc::new(tail))),
        ConstValue::ByteString(_) | ConstValue::Str(_) | ConstValue::Map(_) => {
            // Not exercised by any test using this reducer; see module docs.
            Value::Unit
        }
    }
}

fn arity(b: VmBuiltin) -> usize {
    match b {
        VmBuiltin::LengthOfByteString
        | VmBuiltin::HeadList
        | VmBuiltin::TailList
        | VmBuiltin::NullList
        | VmBuiltin::UnConstrData
        | VmBuiltin::FstPair
        | VmBuiltin::SndPair => 1,
        VmBuiltin::AddInteger
        | VmBuiltin::SubtractInteger
        | VmBuiltin::MultiplyInteger
        | VmBuiltin::QuotientInteger
        | VmBuiltin::RemainderInteger
        | VmBuiltin::LessThanInteger
        | VmBuiltin::LessThanEqualsInteger
        | VmBuiltin::EqualsInteger
        | VmBuiltin::EqualsByteString
        | VmBuiltin::MkCons
        | VmBuiltin::ConstrData
        | VmBuiltin::EqualsData
        | VmBuiltin::AppendByteString
        | VmBuiltin::AppendString
        | VmBuiltin::Trace
        | VmBuiltin::AndInteger
        | VmBuiltin::OrInteger
        | VmBuiltin::XorInteger
        | VmBuiltin::ShiftLeftInteger
        | VmBuiltin::ShiftRightInteger => 2,
        VmBuiltin::IfThenElse | VmBuiltin::ChooseList => 3,
    }
}

fn apply_builtin(b: VmBuiltin, args: Vec<Rc<Value>>) -> EvalResult {
    match b {
        VmBuiltin::AddInteger => int2(&args, |a, b| a + b),
        VmBuiltin::SubtractInteger => int2(&args, |a, b| a - b),
        VmBuiltin::MultiplyInteger => int2(&args, |a, b| a * b),
        VmBuiltin::QuotientInteger => int2(&args, |a, b| a / b),
        VmBuiltin::RemainderInteger => int2(&args, |a, b| a % b),
        VmBuiltin::LessThanInteger => bool2(&args, |a, b| a < b),
        VmBuiltin::LessThanEqualsInteger => bool2(&args, |a, b| a <= b),
        VmBuiltin::EqualsInteger => bool2(&args, |a, b| a == b),
        VmBuiltin::IfThenElse => {
            let cond = as_bool(&args[0])?;
            Ok(if cond { args[1].clone() } else { args[2].clone() })
        }
        VmBuiltin::Trace => Ok(args[1].clone()),
        VmBuiltin::ChooseList => match &*args[0] {
            Value::Nil => Ok(args[1].clone()),
            Value::Cons(..) => Ok(args[2].clone()),
            _ => Err("chooseList applied to a non-list value".to_owned()),
        },
        VmBuiltin::MkCons => Ok(Rc::new(Value::Cons(args[0].clone(), args[1].clone()))),
        VmBuiltin::HeadList => match &*args[0] {
            Value::Cons(h, _) => Ok(h.clone()),
            _ => Err("headList applied to an empty or non-list value".to_owned()),
        },
        VmBuiltin::TailList => match &*args[0] {
            Value::Cons(_, t) => Ok(t.clone()),
            _ => Err("tailList applied to an empty or non-list value".to_owned()),
        },
        VmBuiltin::NullList => match &*args[0] {
            Value::Nil => Ok(Rc::new(Value::Bool(true))),
            Value::Cons(..) => Ok(Rc::new(Value::Bool(false))),
            _ => Err("nullList applied to a non-list value".to_owned()),
        },
        VmBuiltin::LengthOfByteString
        | VmBuiltin::EqualsByteString
        | VmBuiltin::AppendByteString
        | VmBuiltin::AppendString
        | VmBuiltin::ConstrData
        | VmBuiltin::UnConstrData
        | VmBuiltin::EqualsData
        | VmBuiltin::FstPair
        | VmBuiltin::SndPair
        | VmBuiltin::AndInteger
        | VmBuiltin::OrInteger
        | VmBuiltin::XorInteger
        | VmBuiltin::ShiftLeftInteger
        | VmBuiltin::ShiftRightInteger => Err(format!("{b} is not modeled by this test-only reducer")),
    }
}

fn as_int(v: &Rc<Value>) -> Result<&BigInt, String> {
    match &**v {
        Value::Int(i) => Ok(i),
        _ => Err("expected an integer value".to_owned()),
    }
}

fn as_bool(v: &Rc<Value>) -> Result<bool, String> {
    match &**v {
        Value::Bool(b) => Ok(*b),
        _ => Err("expected a boolean value".to_owned()),
    }
}

fn int2(args: &[Rc<Value>], f: impl FnOnce(&BigInt, &BigInt) -> BigInt) -> EvalResult {
    let a = as_int(&args[0])?;
    let b = as_int(&args[1])?;
    Ok(Rc::new(Value::Int(f(a, b))))
}

fn bool2(args: &[Rc<Value>], f: impl FnOnce(&BigInt, &BigInt) -> bool) -> EvalResult {
    let a = as_int(&args[0])?;
    let b = as_int(&args[1])?;
    Ok(Rc::new(Value::Bool(f(a, b))))
}

/// Builds the closed term `compile`'s output becomes once applied to its
/// validator's own positional arguments plus the synthetic trailing unit
/// argument the entry point receives.
pub fn apply_validator(term: &Term, args: impl IntoIterator<Item = Term>) -> Term {
    let mut applied = Term::apply_all(term.clone(), args);
    applied = Term::apply(applied, Term::constant(ConstValue::Unit));
    applied
}

/// Evaluates `term` applied to `args` plus the synthetic trailing
/// argument, and unwraps the result as a plain integer — the shape every
/// acceptance scenario asserts.
pub fn run_validator_to_int(term: &Term, args: impl IntoIterator<Item = Term>) -> BigInt {
    let applied = apply_validator(term, args);
    let value = eval_closed(&applied).expect("validator evaluation should not error");
    as_int(&value).expect("validator should return an integer").clone()
}
