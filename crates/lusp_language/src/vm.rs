//! Register-based virtual machine for lusp bytecode.
//!
//! All frames share one register stack. A call's window starts at the
//! callee's first argument, so arguments arrive in `r0..rN` without copying.
//! Closure calls recurse on the host stack; native procedures are called
//! directly on a slice of the caller's registers.
//!
//! # Upvalues
//!
//! The VM keeps the list of open upvalue cells, at most one per register
//! slot. `Close` and `Return` move the values of cells at or above a
//! threshold into the cells and drop them from the list.

mod arithmetic;
mod evaluator;

pub use arithmetic::apply_binary;
pub use evaluator::{Backend, Evaluator, Frame, Interpreter, InterpreterBackend, TracingInterpreter};

use std::rc::Rc;

use lusp_foundation::{CapacityLimit, Error, Result};
use tracing::debug;

use crate::closure::{Closure, Upvalue, UpvalueRef, UpvalueState};
use crate::environment::Environment;
use crate::opcode::{Bytecode, Reg};
use crate::value::Value;

/// Runtime bounds for the VM.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VmConfig {
    /// Maximum nesting of closure calls.
    pub max_call_depth: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 200,
        }
    }
}

/// A frame's slice of the register stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    base: usize,
    size: usize,
}

impl Window {
    /// Absolute index of the window's first register.
    #[must_use]
    pub const fn base(self) -> usize {
        self.base
    }

    /// Number of registers in the window.
    #[must_use]
    pub const fn size(self) -> usize {
        self.size
    }

    /// Absolute stack index of `reg`.
    ///
    /// # Errors
    ///
    /// Returns a corrupt-bytecode error if `reg` lies outside the window.
    pub fn slot(self, reg: Reg) -> Result<usize> {
        let reg = usize::from(reg);
        if reg < self.size {
            Ok(self.base + reg)
        } else {
            Err(Error::corrupt(format!(
                "register r{reg} outside a window of {}",
                self.size
            )))
        }
    }

    /// Absolute start of `count` consecutive registers starting at `reg`.
    ///
    /// # Errors
    ///
    /// Returns a corrupt-bytecode error if the range leaves the window.
    pub fn range(self, reg: Reg, count: usize) -> Result<usize> {
        let start = usize::from(reg);
        if start + count <= self.size {
            Ok(self.base + start)
        } else {
            Err(Error::corrupt(format!(
                "registers r{start}..r{} outside a window of {}",
                start + count,
                self.size
            )))
        }
    }
}

/// Register-based virtual machine.
pub struct Vm {
    /// Register stack shared by all frames.
    registers: Vec<Value>,
    /// Open upvalue cells, one per captured slot.
    open_upvalues: Vec<UpvalueRef>,
    /// Chooses an evaluator for each bytecode on its first call.
    backend: Rc<dyn Backend>,
    config: VmConfig,
    /// Current closure call depth.
    depth: usize,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    /// Creates a VM that interprets bytecode.
    #[must_use]
    pub fn new() -> Self {
        Self::with_backend(Rc::new(InterpreterBackend::new()))
    }

    /// Creates a VM using `backend` to pick evaluators.
    #[must_use]
    pub fn with_backend(backend: Rc<dyn Backend>) -> Self {
        Self {
            registers: Vec::with_capacity(256),
            open_upvalues: Vec::new(),
            backend,
            config: VmConfig::default(),
            depth: 0,
        }
    }

    /// Replaces the runtime bounds.
    #[must_use]
    pub fn with_config(mut self, config: VmConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the runtime bounds.
    #[must_use]
    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Runs a compiled program.
    ///
    /// # Errors
    ///
    /// Propagates any runtime error raised while executing.
    pub fn execute(&mut self, env: &Environment, closure: &Rc<Closure>) -> Result<Value> {
        self.call(env, &Value::Closure(Rc::clone(closure)), &[])
    }

    /// Runs bytecode that needs no upvalues, without wrapping it in a closure.
    ///
    /// # Errors
    ///
    /// Propagates any runtime error raised while executing; loading an
    /// upvalue is a corrupt-bytecode error.
    pub fn execute_bytecode(&mut self, env: &Environment, code: &Rc<Bytecode>) -> Result<Value> {
        let result = self.invoke(env, code, None, 0, 0);
        self.registers.clear();
        result
    }

    /// Calls a closure or native procedure from the host.
    ///
    /// The VM is not re-entrant: natives have no access to it, so host calls
    /// always start on an empty register stack.
    ///
    /// # Errors
    ///
    /// Returns a corrupt-bytecode error if `callee` is not callable, an arity
    /// error on a parameter count mismatch, or whatever the call raises.
    pub fn call(&mut self, env: &Environment, callee: &Value, args: &[Value]) -> Result<Value> {
        self.registers.clear();
        self.registers.extend_from_slice(args);
        let result = self.call_value(env, callee, 0, args.len());
        self.registers.clear();
        result
    }

    /// Calls `callee` with the `count` arguments stored at absolute index
    /// `arg_base`.
    ///
    /// # Errors
    ///
    /// Returns a corrupt-bytecode error if `callee` is not callable.
    pub fn call_value(
        &mut self,
        env: &Environment,
        callee: &Value,
        arg_base: usize,
        count: usize,
    ) -> Result<Value> {
        match callee {
            Value::Closure(closure) => {
                let code = Rc::clone(closure.code());
                self.invoke(env, &code, Some(closure), arg_base, count)
            }
            Value::Procedure(procedure) => {
                let args = self
                    .registers
                    .get(arg_base..arg_base + count)
                    .ok_or_else(|| Error::corrupt("native arguments outside the register stack"))?;
                (procedure.func)(env, args)
            }
            other => Err(Error::corrupt(format!(
                "cannot call a value of type {}",
                other.type_name()
            ))),
        }
    }

    /// Sets up a frame for `code` at `base` and runs it with the evaluator
    /// the backend picked for it.
    fn invoke(
        &mut self,
        env: &Environment,
        code: &Rc<Bytecode>,
        closure: Option<&Rc<Closure>>,
        base: usize,
        arg_count: usize,
    ) -> Result<Value> {
        if self.depth >= self.config.max_call_depth {
            debug!(depth = self.depth, "call depth limit reached");
            return Err(Error::limit_exceeded(
                CapacityLimit::CallDepth(self.config.max_call_depth),
                0,
            ));
        }
        let expected = usize::from(code.param_count());
        if arg_count != expected {
            return Err(Error::arity_mismatch(expected, arg_count));
        }

        let window = self.enter_frame(base, code, arg_count);
        let evaluator = code.evaluator(self.backend.as_ref());
        let frame = Frame {
            code,
            closure,
            window,
            arg_count,
        };

        self.depth += 1;
        let result = evaluator.evaluate(self, env, &frame);
        self.depth -= 1;

        if let Err(err) = &result {
            debug!(base, error = %err, "unwinding frame");
            self.close_upvalues(base);
        }
        result
    }

    /// Grows the stack to cover the frame and clears its non-argument
    /// registers.
    fn enter_frame(&mut self, base: usize, code: &Bytecode, arg_count: usize) -> Window {
        let size = usize::from(code.reg_count());
        let top = base + size;
        if self.registers.len() < top {
            self.registers.resize(top, Value::Null);
        }
        for reg in &mut self.registers[base + arg_count.min(size)..top] {
            *reg = Value::Null;
        }
        Window { base, size }
    }

    // =========================================================================
    // Registers
    // =========================================================================

    /// Reads a register of the given window.
    ///
    /// # Errors
    ///
    /// Returns a corrupt-bytecode error if `reg` lies outside the window.
    pub fn load(&self, window: Window, reg: Reg) -> Result<&Value> {
        let slot = window.slot(reg)?;
        self.registers
            .get(slot)
            .ok_or_else(|| Error::corrupt(format!("slot {slot} beyond the register stack")))
    }

    /// Writes a register of the given window.
    ///
    /// # Errors
    ///
    /// Returns a corrupt-bytecode error if `reg` lies outside the window.
    pub fn store(&mut self, window: Window, reg: Reg, value: Value) -> Result<()> {
        let slot = window.slot(reg)?;
        let cell = self
            .registers
            .get_mut(slot)
            .ok_or_else(|| Error::corrupt(format!("slot {slot} beyond the register stack")))?;
        *cell = value;
        Ok(())
    }

    // =========================================================================
    // Upvalues
    // =========================================================================

    /// Returns the open cell for `reg`, creating it if this is the first
    /// capture of that slot.
    ///
    /// # Errors
    ///
    /// Returns a corrupt-bytecode error if `reg` lies outside the window.
    pub fn capture_register(&mut self, window: Window, reg: Reg) -> Result<UpvalueRef> {
        let slot = window.slot(reg)?;
        if let Some(cell) = self.open_upvalues.iter().find(|cell| cell.slot() == Some(slot)) {
            return Ok(Rc::clone(cell));
        }
        let cell = Upvalue::open(window.base, reg);
        self.open_upvalues.push(Rc::clone(&cell));
        Ok(cell)
    }

    /// Reads through an upvalue cell.
    ///
    /// # Errors
    ///
    /// Returns a corrupt-bytecode error if an open cell points past the stack.
    pub fn read_upvalue(&self, cell: &Upvalue) -> Result<Value> {
        if let UpvalueState::Closed(value) = &*cell.state() {
            return Ok(value.clone());
        }
        let slot = cell.slot().unwrap_or(usize::MAX);
        self.registers
            .get(slot)
            .cloned()
            .ok_or_else(|| Error::corrupt(format!("open upvalue slot {slot} is dead")))
    }

    /// Writes through an upvalue cell.
    ///
    /// # Errors
    ///
    /// Returns a corrupt-bytecode error if an open cell points past the stack.
    pub fn write_upvalue(&mut self, cell: &Upvalue, value: Value) -> Result<()> {
        let Some(slot) = cell.slot() else {
            cell.set_closed(value);
            return Ok(());
        };
        let target = self
            .registers
            .get_mut(slot)
            .ok_or_else(|| Error::corrupt(format!("open upvalue slot {slot} is dead")))?;
        *target = value;
        Ok(())
    }

    /// Closes every open cell aliasing absolute slot `threshold` or above.
    pub fn close_upvalues(&mut self, threshold: usize) {
        let registers = &self.registers;
        self.open_upvalues.retain(|cell| match cell.slot() {
            Some(slot) if slot >= threshold => {
                cell.close(registers.get(slot).cloned().unwrap_or_default());
                false
            }
            _ => true,
        });
    }

    /// Number of cells currently open.
    #[must_use]
    pub fn open_upvalue_count(&self) -> usize {
        self.open_upvalues.len()
    }
}

/// Compiles and runs `source` in a fresh environment and VM.
///
/// # Errors
///
/// Returns the compile error or runtime error, whichever comes first.
pub fn eval(source: &str) -> Result<Value> {
    let mut env = Environment::new();
    let mut vm = Vm::new();
    eval_in(&mut env, &mut vm, source)
}

/// Compiles `source` against `env` and runs it on `vm`.
///
/// # Errors
///
/// Returns the compile error or runtime error, whichever comes first.
pub fn eval_in(env: &mut Environment, vm: &mut Vm, source: &str) -> Result<Value> {
    let program = crate::compiler::compile(env, source)?;
    vm.execute(env, &program)
}
