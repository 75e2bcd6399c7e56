//! Integration tests for closures and upvalues

use lusp_language::{Environment, Value, Vm, eval, eval_in};

fn int(n: i64) -> Value {
    Value::Integer(n)
}

#[test]
fn both_closure_syntaxes() {
    assert_eq!(eval("let f = |a, b| a - b f(5, 2)").unwrap(), int(3));
    assert_eq!(eval("let f = |(a, b) a - b| f(5, 2)").unwrap(), int(3));
    assert_eq!(eval("let f = |(a) let d = a + a d| f(4)").unwrap(), int(8));
}

#[test]
fn closure_reads_enclosing_local() {
    assert_eq!(eval("let x = 10 let f = || x f()").unwrap(), int(10));
}

#[test]
fn writes_through_upvalue_are_visible_to_enclosing_scope() {
    assert_eq!(eval("let x = 1 let bump = || x = x + 1 bump() bump() x").unwrap(), int(3));
}

#[test]
fn writes_in_enclosing_scope_are_visible_to_open_closure() {
    assert_eq!(eval("let x = 1 let get = || x x = 42 get()").unwrap(), int(42));
}

#[test]
fn transitive_capture_through_middle_closure() {
    let source = "let x = 1 let mid = || || x = x + 10 let inner = mid() inner() inner() x";
    assert_eq!(eval(source).unwrap(), int(21));
}

#[test]
fn counters_are_independent() {
    let mut env = Environment::new();
    let mut vm = Vm::new();
    let source = "make = |n| { let x = n |() x = x + 1 x| } c1 = make(0) c2 = make(100)";
    eval_in(&mut env, &mut vm, source).unwrap();
    let (c1, c2) = (env.get("c1"), env.get("c2"));
    assert_eq!(vm.call(&env, &c1, &[]).unwrap(), int(1));
    assert_eq!(vm.call(&env, &c1, &[]).unwrap(), int(2));
    assert_eq!(vm.call(&env, &c2, &[]).unwrap(), int(101));
    assert_eq!(vm.call(&env, &c1, &[]).unwrap(), int(3));
}

#[test]
fn closed_cells_survive_their_frame() {
    let mut env = Environment::new();
    let mut vm = Vm::new();
    let source = "pair = |v| { let cell = v get = || cell set = |n| cell = n } pair(7)";
    eval_in(&mut env, &mut vm, source).unwrap();
    assert_eq!(vm.open_upvalue_count(), 0);
    assert_eq!(eval_in(&mut env, &mut vm, "get()").unwrap(), int(7));
    eval_in(&mut env, &mut vm, "set(8)").unwrap();
    assert_eq!(eval_in(&mut env, &mut vm, "get()").unwrap(), int(8));
}

#[test]
fn parameters_can_be_captured() {
    let source = "let adder = |n| |x| x + n let add3 = adder(3) add3(4)";
    assert_eq!(eval(source).unwrap(), int(7));
}
