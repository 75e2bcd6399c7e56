//! Whole-program scenarios

use lusp_foundation::ErrorKind;
use lusp_language::{Environment, Value, Vm, compile, eval, eval_in};

fn int(n: i64) -> Value {
    Value::Integer(n)
}

// =============================================================================
// Reference programs
// =============================================================================

#[test]
fn assignment_inside_conditional() {
    assert_eq!(eval("let x = 1 if x == 1 { x = 2 } x").unwrap(), int(2));
}

#[test]
fn counter_closure() {
    let source = "let make = |n| { let x = n |() x = x + 1 x| } let c = make(5) c() c()";
    assert_eq!(eval(source).unwrap(), int(7));
}

#[test]
fn nested_expression_is_true() {
    assert_eq!(eval("((1+2)*3) == 9").unwrap(), Value::Boolean(true));
}

#[test]
fn undeclared_identifier_reads_null() {
    let mut env = Environment::new();
    let mut vm = Vm::new();
    assert_eq!(eval_in(&mut env, &mut vm, "nowhere").unwrap(), Value::Null);
    assert!(env.slot("nowhere").is_some());
}

// =============================================================================
// Shared captures
// =============================================================================

const SHARED_SUM: &str = "
outer = || {
    let i = 0
    while i < 1 {
        let sum = 0
        a = || { sum = sum + 1 sum }
        b = || sum
        a()
        seen = b()
        i = i + 1
    }
}
";

#[test]
fn sibling_closures_share_an_open_cell() {
    let mut env = Environment::new();
    let mut vm = Vm::new();
    eval_in(&mut env, &mut vm, SHARED_SUM).unwrap();
    eval_in(&mut env, &mut vm, "outer()").unwrap();
    assert_eq!(env.get("seen"), int(1));
    assert_eq!(vm.open_upvalue_count(), 0);
}

#[test]
fn sibling_closures_share_the_closed_cell() {
    let mut env = Environment::new();
    let mut vm = Vm::new();
    eval_in(&mut env, &mut vm, SHARED_SUM).unwrap();
    eval_in(&mut env, &mut vm, "outer()").unwrap();
    assert_eq!(eval_in(&mut env, &mut vm, "a()").unwrap(), int(2));
    assert_eq!(eval_in(&mut env, &mut vm, "b()").unwrap(), int(2));
}

#[test]
fn closed_copies_diverge_between_calls() {
    let mut env = Environment::new();
    let mut vm = Vm::new();
    eval_in(&mut env, &mut vm, SHARED_SUM).unwrap();
    eval_in(&mut env, &mut vm, "outer() first_a = a first_b = b").unwrap();
    eval_in(&mut env, &mut vm, "outer()").unwrap();

    assert_eq!(eval_in(&mut env, &mut vm, "first_a()").unwrap(), int(2));
    assert_eq!(eval_in(&mut env, &mut vm, "first_a()").unwrap(), int(3));
    assert_eq!(eval_in(&mut env, &mut vm, "first_b()").unwrap(), int(3));
    assert_eq!(eval_in(&mut env, &mut vm, "b()").unwrap(), int(1));
}

#[test]
fn each_loop_iteration_gets_a_fresh_cell() {
    let source = "
        let i = 0
        while i < 3 {
            let n = i * 10
            if i == 0 { g0 = || n }
            if i == 2 { g2 = || n }
            i = i + 1
        }
        g0() + g2()
    ";
    assert_eq!(eval(source).unwrap(), int(20));
}

// =============================================================================
// Error recovery
// =============================================================================

#[test]
fn compile_error_leaves_environment_usable() {
    let mut env = Environment::new();
    let mut vm = Vm::new();
    eval_in(&mut env, &mut vm, "x = 4").unwrap();
    let err = eval_in(&mut env, &mut vm, "x = (x").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Compile { .. }));
    assert_eq!(eval_in(&mut env, &mut vm, "x").unwrap(), int(4));
}

#[test]
fn runtime_error_keeps_earlier_effects() {
    let mut env = Environment::new();
    let mut vm = Vm::new();
    assert!(eval_in(&mut env, &mut vm, "done = 1 1 % 0 done = 2").is_err());
    assert_eq!(env.get("done"), int(1));
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn compiling_twice_gives_identical_code() {
    let source = "let make = |n| { let x = n |() x = x + 1 x| } let c = make(5) c() c()";
    let mut first_env = Environment::new();
    let mut second_env = Environment::new();
    let first = compile(&mut first_env, source).unwrap();
    let second = compile(&mut second_env, source).unwrap();
    assert_eq!(
        first.code().disassemble(true),
        second.code().disassemble(true)
    );
}

#[test]
fn fibonacci() {
    let source = "fib = |n| if n < 2 { n } else { fib(n - 1) + fib(n - 2) } fib(20)";
    assert_eq!(eval(source).unwrap(), int(6765));
}
