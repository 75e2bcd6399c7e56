//! Runtime values.
//!
//! `Value` is the tagged union every register, global slot and upvalue cell
//! holds. Heap-shaped variants share their payload through `Rc`, so cloning
//! a value is cheap.

use std::fmt;
use std::rc::Rc;

use lusp_foundation::{Result, Symbol};

use crate::closure::Closure;
use crate::environment::Environment;

/// Host function signature for native procedures.
pub type NativeFn = fn(&Environment, &[Value]) -> Result<Value>;

/// A runtime value.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// The empty list, also the value of anything uninitialized.
    #[default]
    Null,
    /// Interned symbol.
    Symbol(Symbol),
    /// `#t` or `#f`.
    Boolean(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Real(f64),
    /// Immutable string.
    String(Rc<str>),
    /// Pair of values.
    Cons(Rc<Pair>),
    /// Compiled function with captured upvalues.
    Closure(Rc<Closure>),
    /// Host function.
    Procedure(NativeProcedure),
}

/// A cons cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Pair {
    /// First element.
    pub car: Value,
    /// Rest of the list.
    pub cdr: Value,
}

/// A named host function callable from bytecode.
#[derive(Clone, Copy)]
pub struct NativeProcedure {
    /// Name used in diagnostics and when printing.
    pub name: &'static str,
    /// The function itself.
    pub func: NativeFn,
}

impl NativeProcedure {
    /// Creates a new native procedure.
    #[must_use]
    pub const fn new(name: &'static str, func: NativeFn) -> Self {
        Self { name, func }
    }
}

impl fmt::Debug for NativeProcedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeProcedure({})", self.name)
    }
}

impl PartialEq for NativeProcedure {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Value {
    /// Creates a string value.
    #[must_use]
    pub fn string(s: &str) -> Self {
        Self::String(Rc::from(s))
    }

    /// Creates a pair.
    #[must_use]
    pub fn cons(car: Value, cdr: Value) -> Self {
        Self::Cons(Rc::new(Pair { car, cdr }))
    }

    /// Builds a proper list from the given items.
    #[must_use]
    pub fn list(items: impl IntoIterator<Item = Value, IntoIter: DoubleEndedIterator>) -> Self {
        items
            .into_iter()
            .rev()
            .fold(Self::Null, |tail, item| Self::cons(item, tail))
    }

    /// Returns true unless this is `#f`.
    #[must_use]
    pub const fn is_truthy(&self) -> bool {
        !matches!(self, Self::Boolean(false))
    }

    /// Returns true if this is the empty list.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the integer payload, if any.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean payload, if any.
    #[must_use]
    pub const fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the closure payload, if any.
    #[must_use]
    pub fn as_closure(&self) -> Option<&Rc<Closure>> {
        match self {
            Self::Closure(c) => Some(c),
            _ => None,
        }
    }

    /// Returns a short name for this value's type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Symbol(_) => "symbol",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::String(_) => "string",
            Self::Cons(_) => "pair",
            Self::Closure(_) => "closure",
            Self::Procedure(_) => "procedure",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Real(a), Self::Real(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Cons(a), Self::Cons(b)) => Rc::ptr_eq(a, b) || a == b,
            (Self::Closure(a), Self::Closure(b)) => Rc::ptr_eq(a, b),
            (Self::Procedure(a), Self::Procedure(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Real(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Self::Symbol(s)
    }
}

/// Writes values in Scheme notation.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "()"),
            Self::Symbol(s) => write!(f, "{s}"),
            Self::Boolean(true) => write!(f, "#t"),
            Self::Boolean(false) => write!(f, "#f"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Real(n) if n.is_finite() && n.fract() == 0.0 => write!(f, "{n:.1}"),
            Self::Real(n) => write!(f, "{n}"),
            Self::String(s) => {
                write!(f, "\"")?;
                for c in s.chars() {
                    match c {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        c => write!(f, "{c}")?,
                    }
                }
                write!(f, "\"")
            }
            Self::Cons(pair) => {
                write!(f, "({}", pair.car)?;
                let mut rest = &pair.cdr;
                loop {
                    match rest {
                        Self::Null => break,
                        Self::Cons(next) => {
                            write!(f, " {}", next.car)?;
                            rest = &next.cdr;
                        }
                        tail => {
                            write!(f, " . {tail}")?;
                            break;
                        }
                    }
                }
                write!(f, ")")
            }
            Self::Closure(_) => write!(f, "#<closure>"),
            Self::Procedure(p) => write!(f, "#<procedure:{}>", p.name),
        }
    }
}
