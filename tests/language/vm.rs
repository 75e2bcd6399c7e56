//! Integration tests for the VM

use lusp_foundation::{CapacityLimit, ErrorKind};
use lusp_language::{Environment, Value, Vm, VmConfig, eval, eval_in};

fn int(n: i64) -> Value {
    Value::Integer(n)
}

// =============================================================================
// Arithmetic
// =============================================================================

#[test]
fn integer_arithmetic_wraps() {
    let source = format!("{} + 1", i64::MAX);
    assert_eq!(eval(&source).unwrap(), int(i64::MIN));
}

#[test]
fn mixed_arithmetic_promotes_to_real() {
    assert_eq!(eval("3 * 0.5").unwrap(), Value::Real(1.5));
    assert_eq!(eval("1.0 / 0").unwrap(), Value::Real(f64::INFINITY));
}

#[test]
fn integer_division_by_zero_is_an_error() {
    for source in ["5 / 0", "5 % 0"] {
        let err = eval(source).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DivisionByZero), "{source}");
    }
}

#[test]
fn equality_across_types() {
    assert_eq!(eval("2 == 2.0").unwrap(), Value::Boolean(true));
    assert_eq!(eval(r#""a" == "a""#).unwrap(), Value::Boolean(true));
    assert_eq!(eval(r#""a" == 1"#).unwrap(), Value::Boolean(false));
    assert_eq!(eval("#t != #f").unwrap(), Value::Boolean(true));
}

#[test]
fn ordering_non_numbers_is_fatal() {
    assert!(eval("#t < 1").unwrap_err().is_fatal());
}

// =============================================================================
// Control flow
// =============================================================================

#[test]
fn while_loop_accumulates() {
    let source = "let n = 1 let i = 0 while i < 10 { n = n * 2 i = i + 1 } n";
    assert_eq!(eval(source).unwrap(), int(1024));
}

#[test]
fn else_if_chain() {
    let classify = |n: i64| {
        let source = format!(
            "let n = {n} if n < 0 {{ \"neg\" }} else if n == 0 {{ \"zero\" }} else {{ \"pos\" }}"
        );
        eval(&source).unwrap()
    };
    assert_eq!(classify(-4), Value::string("neg"));
    assert_eq!(classify(0), Value::string("zero"));
    assert_eq!(classify(9), Value::string("pos"));
}

// =============================================================================
// Globals and the host
// =============================================================================

#[test]
fn globals_persist_across_units() {
    let mut env = Environment::new();
    let mut vm = Vm::new();
    eval_in(&mut env, &mut vm, "count = 0").unwrap();
    eval_in(&mut env, &mut vm, "count = count + 5").unwrap();
    assert_eq!(eval_in(&mut env, &mut vm, "count").unwrap(), int(5));
    assert_eq!(env.get("count"), int(5));
}

#[test]
fn host_sets_globals() {
    let mut env = Environment::new();
    env.set("limit", int(3));
    let mut vm = Vm::new();
    assert_eq!(eval_in(&mut env, &mut vm, "limit * 2").unwrap(), int(6));
}

#[test]
fn recursion_runs_into_the_call_limit() {
    let mut env = Environment::new();
    let mut vm = Vm::new().with_config(VmConfig { max_call_depth: 20 });
    eval_in(&mut env, &mut vm, "down = |n| if n == 0 { 0 } else { down(n - 1) }").unwrap();
    assert_eq!(eval_in(&mut env, &mut vm, "down(15)").unwrap(), int(0));
    let err = eval_in(&mut env, &mut vm, "down(40)").unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::LimitExceeded {
            limit: CapacityLimit::CallDepth(20),
            line: 0
        }
    ));
    assert_eq!(eval_in(&mut env, &mut vm, "down(5)").unwrap(), int(0));
}

#[test]
fn vm_recovers_after_errors() {
    let mut env = Environment::new();
    let mut vm = Vm::new();
    assert!(eval_in(&mut env, &mut vm, "f = |a| a f()").is_err());
    assert_eq!(eval_in(&mut env, &mut vm, "f(9)").unwrap(), int(9));
    assert_eq!(vm.open_upvalue_count(), 0);
}
