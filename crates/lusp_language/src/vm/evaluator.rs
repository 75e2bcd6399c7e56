//! Execution strategies for bytecode.
//!
//! Each [`Bytecode`] resolves its [`Evaluator`] lazily on its first call by
//! asking the VM's [`Backend`]; the choice is cached in the bytecode. Every
//! evaluator must give the same observable results for the same code.

use std::rc::Rc;

use lusp_foundation::{Error, Result};
use tracing::trace;

use super::{Vm, Window, apply_binary};
use crate::closure::{Closure, UpvalueRef};
use crate::environment::Environment;
use crate::opcode::{Bytecode, Capture, Op};
use crate::value::Value;

/// Everything an evaluator needs to run one activation.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    /// Code being run.
    pub code: &'a Rc<Bytecode>,
    /// Closure being run, or `None` for bare top-level bytecode.
    pub closure: Option<&'a Rc<Closure>>,
    /// This activation's registers.
    pub window: Window,
    /// Number of arguments placed in `r0..`.
    pub arg_count: usize,
}

impl Frame<'_> {
    /// Returns upvalue cell `index` of the running closure.
    ///
    /// # Errors
    ///
    /// Returns a corrupt-bytecode error if there is no such cell.
    pub fn upvalue(&self, index: u16) -> Result<UpvalueRef> {
        self.closure
            .and_then(|closure| closure.upvalue(index))
            .cloned()
            .ok_or_else(|| Error::corrupt(format!("no upvalue {index} in this frame")))
    }
}

/// A strategy for running one bytecode object.
pub trait Evaluator {
    /// Short name shown in debug output.
    fn name(&self) -> &'static str;

    /// Runs `frame` to completion and returns its result.
    ///
    /// # Errors
    ///
    /// Propagates runtime errors raised by the code or anything it calls.
    fn evaluate(&self, vm: &mut Vm, env: &Environment, frame: &Frame<'_>) -> Result<Value>;
}

/// Chooses the evaluator a bytecode object will use for its lifetime.
pub trait Backend {
    /// Picks an evaluator for `code`. Called at most once per bytecode.
    fn select(&self, code: &Bytecode) -> Rc<dyn Evaluator>;
}

/// The reference interpreter: a plain dispatch loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct Interpreter;

impl Evaluator for Interpreter {
    fn name(&self) -> &'static str {
        "interpreter"
    }

    fn evaluate(&self, vm: &mut Vm, env: &Environment, frame: &Frame<'_>) -> Result<Value> {
        run::<false>(vm, env, frame)
    }
}

/// The interpreter, emitting a `trace!` event before every instruction.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingInterpreter;

impl Evaluator for TracingInterpreter {
    fn name(&self) -> &'static str {
        "tracing-interpreter"
    }

    fn evaluate(&self, vm: &mut Vm, env: &Environment, frame: &Frame<'_>) -> Result<Value> {
        run::<true>(vm, env, frame)
    }
}

/// Backend handing out one shared interpreter to every bytecode.
pub struct InterpreterBackend {
    evaluator: Rc<dyn Evaluator>,
}

impl InterpreterBackend {
    /// Backend using the plain [`Interpreter`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            evaluator: Rc::new(Interpreter),
        }
    }

    /// Backend using the [`TracingInterpreter`].
    #[must_use]
    pub fn tracing() -> Self {
        Self {
            evaluator: Rc::new(TracingInterpreter),
        }
    }
}

impl Default for InterpreterBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for InterpreterBackend {
    fn select(&self, _code: &Bytecode) -> Rc<dyn Evaluator> {
        Rc::clone(&self.evaluator)
    }
}

/// Applies a relative jump; `pc` already points past the jump.
fn jump(pc: usize, offset: i32, len: usize) -> Result<usize> {
    isize::try_from(offset)
        .ok()
        .and_then(|offset| pc.checked_add_signed(offset))
        .filter(|target| *target <= len)
        .ok_or_else(|| Error::corrupt(format!("jump {offset:+} from {pc} leaves the code")))
}

fn run<const TRACE: bool>(vm: &mut Vm, env: &Environment, frame: &Frame<'_>) -> Result<Value> {
    let ops = frame.code.ops();
    let window = frame.window;
    let mut pc = 0;

    loop {
        let op = ops
            .get(pc)
            .ok_or_else(|| Error::corrupt("execution ran past the last instruction"))?;
        if TRACE {
            trace!(base = window.base(), pc, op = %op, "dispatch");
        }
        pc += 1;

        match op {
            Op::LoadConst(dst, value) => vm.store(window, *dst, value.clone())?,
            Op::LoadGlobal(dst, slot) => vm.store(window, *dst, slot.get())?,
            Op::StoreGlobal(src, slot) => slot.set(vm.load(window, *src)?.clone()),
            Op::LoadUpval(dst, index) => {
                let cell = frame.upvalue(*index)?;
                let value = vm.read_upvalue(&cell)?;
                vm.store(window, *dst, value)?;
            }
            Op::StoreUpval(src, index) => {
                let cell = frame.upvalue(*index)?;
                let value = vm.load(window, *src)?.clone();
                vm.write_upvalue(&cell, value)?;
            }
            Op::Move(dst, src) => {
                let value = vm.load(window, *src)?.clone();
                vm.store(window, *dst, value)?;
            }

            Op::Call(func, args, count) => {
                let callee = vm.load(window, *func)?.clone();
                let count = usize::from(*count);
                let arg_base = window.range(*args, count)?;
                let result = vm.call_value(env, &callee, arg_base, count)?;
                vm.store(window, *func, result)?;
            }
            Op::Return(src) => {
                let value = vm.load(window, *src)?.clone();
                vm.close_upvalues(window.base());
                return Ok(value);
            }

            Op::Jump(offset) => pc = jump(pc, *offset, ops.len())?,
            Op::JumpIf(cond, offset) => {
                if vm.load(window, *cond)?.is_truthy() {
                    pc = jump(pc, *offset, ops.len())?;
                }
            }
            Op::JumpIfNot(cond, offset) => {
                if !vm.load(window, *cond)?.is_truthy() {
                    pc = jump(pc, *offset, ops.len())?;
                }
            }

            Op::CreateClosure(dst, code, captures) => {
                let cells = captures
                    .iter()
                    .map(|capture| match capture {
                        Capture::Register(reg) => vm.capture_register(window, *reg),
                        Capture::Upvalue(index) => frame.upvalue(*index),
                    })
                    .collect::<Result<Box<[_]>>>()?;
                let closure = Closure::new(Rc::clone(code), cells);
                vm.store(window, *dst, Value::Closure(Rc::new(closure)))?;
            }
            Op::Close(begin) => vm.close_upvalues(window.base() + usize::from(*begin)),

            Op::Binary(operator, dst, left, right) => {
                let value = apply_binary(*operator, vm.load(window, *left)?, vm.load(window, *right)?)?;
                vm.store(window, *dst, value)?;
            }
        }
    }
}
