//! Binary operators over runtime values.
//!
//! Integers use wrapping `i64` arithmetic. A real on either side promotes the
//! other operand to `f64`. Equality accepts any values; everything else needs
//! numbers.

#![allow(clippy::cast_precision_loss)]

use std::cmp::Ordering;

use lusp_foundation::{Error, ErrorKind, Result};

use crate::opcode::BinaryOp;
use crate::value::Value;

enum Numbers {
    Integers(i64, i64),
    Reals(f64, f64),
}

fn numbers(op: BinaryOp, left: &Value, right: &Value) -> Result<Numbers> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Numbers::Integers(*a, *b)),
        (Value::Integer(a), Value::Real(b)) => Ok(Numbers::Reals(*a as f64, *b)),
        (Value::Real(a), Value::Integer(b)) => Ok(Numbers::Reals(*a, *b as f64)),
        (Value::Real(a), Value::Real(b)) => Ok(Numbers::Reals(*a, *b)),
        _ => Err(Error::corrupt(format!(
            "{} expects numbers, got {} and {}",
            op.mnemonic(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Integer(a), Value::Real(b)) | (Value::Real(b), Value::Integer(a)) => {
            (*a as f64) == *b
        }
        (Value::Real(a), Value::Real(b)) => a == b,
        _ => left == right,
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Option<Ordering>> {
    Ok(match numbers(op, left, right)? {
        Numbers::Integers(a, b) => Some(a.cmp(&b)),
        Numbers::Reals(a, b) => a.partial_cmp(&b),
    })
}

/// Applies `op` to two operands.
///
/// # Errors
///
/// Returns [`ErrorKind::DivisionByZero`] for integer `/` or `%` by zero, and
/// a corrupt-bytecode error when arithmetic or ordering meets a non-number.
pub fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    let value = match op {
        BinaryOp::Equal => Value::Boolean(equal(left, right)),
        BinaryOp::NotEqual => Value::Boolean(!equal(left, right)),
        BinaryOp::Less => Value::Boolean(compare(op, left, right)? == Some(Ordering::Less)),
        BinaryOp::LessEqual => Value::Boolean(matches!(
            compare(op, left, right)?,
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Greater => {
            Value::Boolean(compare(op, left, right)? == Some(Ordering::Greater))
        }
        BinaryOp::GreaterEqual => Value::Boolean(matches!(
            compare(op, left, right)?,
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::Add
        | BinaryOp::Subtract
        | BinaryOp::Multiply
        | BinaryOp::Divide
        | BinaryOp::Modulo => match numbers(op, left, right)? {
            Numbers::Integers(a, b) => Value::Integer(integer(op, a, b)?),
            Numbers::Reals(a, b) => Value::Real(real(op, a, b)),
        },
    };
    Ok(value)
}

fn integer(op: BinaryOp, a: i64, b: i64) -> Result<i64> {
    Ok(match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Subtract => a.wrapping_sub(b),
        BinaryOp::Multiply => a.wrapping_mul(b),
        BinaryOp::Divide | BinaryOp::Modulo if b == 0 => {
            return Err(Error::new(ErrorKind::DivisionByZero));
        }
        BinaryOp::Divide => a.wrapping_div(b),
        _ => a.wrapping_rem(b),
    })
}

fn real(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Subtract => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide => a / b,
        _ => a % b,
    }
}
