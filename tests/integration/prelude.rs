//! Programs using the runtime prelude

use lusp_foundation::ErrorKind;
use lusp_language::{Environment, Value, Vm, eval_in};
use lusp_runtime::prelude;

fn run(source: &str) -> lusp_foundation::Result<Value> {
    let mut env = Environment::new();
    prelude::install(&mut env);
    eval_in(&mut env, &mut Vm::new(), source)
}

#[test]
fn builds_and_walks_lists() {
    assert_eq!(run("list(1, 2, 3)").unwrap().to_string(), "(1 2 3)");
    assert_eq!(run("car(cdr(list(1, 2, 3)))").unwrap(), Value::Integer(2));
    assert_eq!(run("cons(1, 2)").unwrap().to_string(), "(1 . 2)");
    assert_eq!(run("null?(cdr(list(1)))").unwrap(), Value::Boolean(true));
}

#[test]
fn closures_over_lists() {
    let source = "
        length = |xs| if null?(xs) { 0 } else { 1 + length(cdr(xs)) }
        length(list(4, 5, 6, 7))
    ";
    assert_eq!(run(source).unwrap(), Value::Integer(4));
}

#[test]
fn procedures_print_by_name() {
    assert_eq!(run("car").unwrap().to_string(), "#<procedure:car>");
}

#[test]
fn native_errors_are_recoverable() {
    let err = run("car(5)").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Native { name: "car", .. }));
    assert!(!err.is_fatal());
    assert_eq!(err.to_string(), "car: expected a pair, got integer");
}

#[test]
fn print_returns_null() {
    assert_eq!(run(r#"print("hello", 1)"#).unwrap(), Value::Null);
}
