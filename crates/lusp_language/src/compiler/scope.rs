//! Scope, binding and per-function bookkeeping for the compiler.

use lusp_foundation::SymbolId;

use crate::environment::GlobalSlot;
use crate::opcode::{Capture, CodeBuffer, Reg};

/// A named register in some scope.
#[derive(Clone, Copy, Debug)]
pub(super) struct Binding {
    pub symbol: SymbolId,
    pub register: Reg,
}

/// One lexical scope.
///
/// Scopes of every function being compiled live in a single stack, so a
/// nested function's chain continues into its parents' scopes.
#[derive(Debug)]
pub(super) struct Scope {
    /// Index of the owning function in the function stack.
    pub function: usize,
    pub bindings: Vec<Binding>,
    /// Set once any binding here is captured by a nested function.
    pub has_upvals: bool,
    /// First register this scope may allocate; restored on exit.
    pub base: usize,
}

impl Scope {
    pub fn new(function: usize, base: usize) -> Self {
        Self {
            function,
            bindings: Vec::new(),
            has_upvals: false,
            base,
        }
    }

    pub fn find(&self, symbol: SymbolId) -> Option<usize> {
        self.bindings.iter().rposition(|b| b.symbol == symbol)
    }
}

/// A captured binding, identified by its position in the scope stack.
#[derive(Clone, Copy, Debug)]
pub(super) struct UpvalueDesc {
    pub scope: usize,
    pub binding: usize,
    pub capture: Capture,
}

/// Compilation state of one function body (the top level counts as one).
#[derive(Debug)]
pub(super) struct FunctionState {
    pub param_count: u16,
    /// Next unused register.
    pub free_reg: usize,
    /// High-water mark of `free_reg`; the frame's window size.
    pub reg_count: usize,
    pub upvals: Vec<UpvalueDesc>,
    pub code: CodeBuffer,
}

impl FunctionState {
    pub fn new() -> Self {
        Self {
            param_count: 0,
            free_reg: 0,
            reg_count: 0,
            upvals: Vec::new(),
            code: CodeBuffer::new(),
        }
    }

    /// Returns the upvalue index already assigned to a binding, if any.
    pub fn find_upval(&self, scope: usize, binding: usize) -> Option<usize> {
        self.upvals
            .iter()
            .position(|u| u.scope == scope && u.binding == binding)
    }

    pub fn captures(&self) -> Box<[Capture]> {
        self.upvals.iter().map(|u| u.capture).collect()
    }
}

/// Where a name lives, as seen from the function being compiled.
#[derive(Clone, Debug)]
pub(super) enum Resolved {
    Local(Reg),
    Upvalue(u16),
    Global(GlobalSlot),
}
