//! Native procedures available to every program run by the REPL.

use std::io::{self, Write};

use lusp_foundation::{Error, ErrorKind, Result};
use lusp_language::{Environment, NativeFn, Value};

/// Name and implementation of every prelude procedure.
pub const PROCEDURES: &[(&str, NativeFn)] = &[
    ("print", print),
    ("cons", cons),
    ("car", car),
    ("cdr", cdr),
    ("list", list),
    ("null?", is_null),
];

/// Binds every prelude procedure in `env`.
pub fn install(env: &mut Environment) {
    for &(name, func) in PROCEDURES {
        env.define_native(name, func);
    }
}

fn expect_args(name: &'static str, args: &[Value], count: usize) -> Result<()> {
    if args.len() == count {
        Ok(())
    } else {
        Err(Error::native(
            name,
            format!("expected {count} argument(s), got {}", args.len()),
        ))
    }
}

/// Renders arguments the way `print` writes them: strings raw, everything
/// else in written form, separated by spaces.
#[must_use]
pub fn display_args(args: &[Value]) -> String {
    args.iter()
        .map(|arg| match arg {
            Value::String(s) => s.to_string(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn print(_env: &Environment, args: &[Value]) -> Result<Value> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", display_args(args))
        .map_err(|e| Error::new(ErrorKind::Internal(format!("print: {e}"))))?;
    Ok(Value::Null)
}

fn cons(_env: &Environment, args: &[Value]) -> Result<Value> {
    expect_args("cons", args, 2)?;
    Ok(Value::cons(args[0].clone(), args[1].clone()))
}

fn car(_env: &Environment, args: &[Value]) -> Result<Value> {
    expect_args("car", args, 1)?;
    match &args[0] {
        Value::Cons(pair) => Ok(pair.car.clone()),
        other => Err(Error::native(
            "car",
            format!("expected a pair, got {}", other.type_name()),
        )),
    }
}

fn cdr(_env: &Environment, args: &[Value]) -> Result<Value> {
    expect_args("cdr", args, 1)?;
    match &args[0] {
        Value::Cons(pair) => Ok(pair.cdr.clone()),
        other => Err(Error::native(
            "cdr",
            format!("expected a pair, got {}", other.type_name()),
        )),
    }
}

fn list(_env: &Environment, args: &[Value]) -> Result<Value> {
    Ok(Value::list(args.iter().cloned()))
}

fn is_null(_env: &Environment, args: &[Value]) -> Result<Value> {
    expect_args("null?", args, 1)?;
    Ok(Value::Boolean(args[0].is_null()))
}
