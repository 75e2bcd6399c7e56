//! Closures and upvalue cells.
//!
//! An upvalue cell is open while the register it captured is still part of a
//! live frame, and closed once that register range is about to be reused.
//! Closing copies the register's value into the cell; from then on the cell
//! and the register are independent storage.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::opcode::{Bytecode, Reg};
use crate::value::Value;

/// Shared handle to an upvalue cell.
pub type UpvalueRef = Rc<Upvalue>;

/// Where an upvalue's value currently lives.
#[derive(Clone, Debug, PartialEq)]
pub enum UpvalueState {
    /// Aliases register `register` of the frame whose window starts at `base`.
    Open {
        /// Absolute index of the frame's first register.
        base: usize,
        /// Register within that frame.
        register: Reg,
    },
    /// Owns its value.
    Closed(Value),
}

/// A captured variable shared between a frame and the closures it created.
#[derive(Debug)]
pub struct Upvalue {
    state: RefCell<UpvalueState>,
}

impl Upvalue {
    /// Creates an open cell aliasing `register` of the frame at `base`.
    #[must_use]
    pub fn open(base: usize, register: Reg) -> UpvalueRef {
        Rc::new(Self {
            state: RefCell::new(UpvalueState::Open { base, register }),
        })
    }

    /// Creates a cell that already owns `value`.
    #[must_use]
    pub fn closed(value: Value) -> UpvalueRef {
        Rc::new(Self {
            state: RefCell::new(UpvalueState::Closed(value)),
        })
    }

    /// Returns the current state.
    pub fn state(&self) -> Ref<'_, UpvalueState> {
        self.state.borrow()
    }

    /// Returns the absolute register index this cell aliases, if open.
    #[must_use]
    pub fn slot(&self) -> Option<usize> {
        match *self.state.borrow() {
            UpvalueState::Open { base, register } => Some(base + usize::from(register)),
            UpvalueState::Closed(_) => None,
        }
    }

    /// Returns true while the cell still aliases a register.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.slot().is_some()
    }

    /// Moves `value` into the cell, detaching it from its register.
    pub fn close(&self, value: Value) {
        *self.state.borrow_mut() = UpvalueState::Closed(value);
    }

    /// Overwrites the value of a closed cell. Returns false if the cell is
    /// still open, in which case the caller must write the register instead.
    pub fn set_closed(&self, value: Value) -> bool {
        let mut state = self.state.borrow_mut();
        match &mut *state {
            UpvalueState::Closed(slot) => {
                *slot = value;
                true
            }
            UpvalueState::Open { .. } => false,
        }
    }
}

/// A function value: bytecode plus the upvalue cells it captured.
pub struct Closure {
    code: Rc<Bytecode>,
    upvalues: Box<[UpvalueRef]>,
}

impl Closure {
    /// Creates a closure over `code` with the given captured cells.
    #[must_use]
    pub fn new(code: Rc<Bytecode>, upvalues: Box<[UpvalueRef]>) -> Self {
        Self { code, upvalues }
    }

    /// Returns the bytecode this closure runs.
    #[must_use]
    pub fn code(&self) -> &Rc<Bytecode> {
        &self.code
    }

    /// Returns the captured cells.
    #[must_use]
    pub fn upvalues(&self) -> &[UpvalueRef] {
        &self.upvalues
    }

    /// Returns the upvalue cell at `index`.
    #[must_use]
    pub fn upvalue(&self, index: u16) -> Option<&UpvalueRef> {
        self.upvalues.get(usize::from(index))
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("params", &self.code.param_count())
            .field("upvalues", &self.upvalues.len())
            .finish_non_exhaustive()
    }
}
