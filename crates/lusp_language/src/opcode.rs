//! Bytecode instruction set for the lusp VM.
//!
//! The VM is register-based: every instruction names the registers it reads
//! and writes within the current frame's window. Jump offsets are relative
//! to the instruction after the jump.

use std::cell::OnceCell;
use std::fmt::{self, Write as _};
use std::rc::Rc;

use crate::environment::GlobalSlot;
use crate::value::Value;
use crate::vm::{Backend, Evaluator};

/// Register index within a frame's window.
pub type Reg = u16;

/// How one entry of a new closure's upvalue array is populated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capture {
    /// Capture a register of the creating frame (shared open cell).
    Register(Reg),
    /// Forward an upvalue of the creating closure.
    Upvalue(u16),
}

/// Arithmetic and comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Modulo,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
}

impl BinaryOp {
    /// Returns the mnemonic used by the disassembler.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
            Self::Modulo => "modulo",
            Self::Equal => "equal",
            Self::NotEqual => "not_equal",
            Self::Less => "less",
            Self::LessEqual => "less_equal",
            Self::Greater => "greater",
            Self::GreaterEqual => "greater_equal",
        }
    }
}

/// A single bytecode instruction.
#[derive(Clone, Debug)]
pub enum Op {
    // === Data Movement ===
    /// `r <- value`
    LoadConst(Reg, Value),
    /// `r <- global`
    LoadGlobal(Reg, GlobalSlot),
    /// `global <- r`
    StoreGlobal(Reg, GlobalSlot),
    /// `r <- upvalue[idx]`
    LoadUpval(Reg, u16),
    /// `upvalue[idx] <- r`
    StoreUpval(Reg, u16),
    /// `dst <- src`
    Move(Reg, Reg),

    // === Calls ===
    /// Call the value in `r` with `count` arguments starting at `args`;
    /// the result replaces the callee in `r`.
    Call(Reg, Reg, u16),
    /// Return the value in `r`, closing every upvalue still open in this frame.
    Return(Reg),

    // === Control Flow ===
    /// Unconditional relative jump.
    Jump(i32),
    /// Jump if `r` is anything but `#f`.
    JumpIf(Reg, i32),
    /// Jump if `r` is `#f`.
    JumpIfNot(Reg, i32),

    // === Closures ===
    /// Build a closure over `code`, populating its upvalues from the
    /// capture list, and store it in `r`.
    CreateClosure(Reg, Rc<Bytecode>, Box<[Capture]>),
    /// Close every open upvalue aliasing register `begin` or above.
    Close(Reg),

    // === Arithmetic / Comparison ===
    /// `dst <- left op right`
    Binary(BinaryOp, Reg, Reg, Reg),
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadConst(r, value) => write!(f, "load_const r{r}, {value}"),
            Self::LoadGlobal(r, slot) => write!(f, "load_global r{r}, {}", slot.symbol()),
            Self::StoreGlobal(r, slot) => write!(f, "store_global {}, r{r}", slot.symbol()),
            Self::LoadUpval(r, idx) => write!(f, "load_upval r{r}, u{idx}"),
            Self::StoreUpval(r, idx) => write!(f, "store_upval u{idx}, r{r}"),
            Self::Move(dst, src) => write!(f, "move r{dst}, r{src}"),
            Self::Call(r, args, count) => write!(f, "call r{r}, r{args}, {count}"),
            Self::Return(r) => write!(f, "return r{r}"),
            Self::Jump(offset) => write!(f, "jump {offset:+}"),
            Self::JumpIf(r, offset) => write!(f, "jump_if r{r}, {offset:+}"),
            Self::JumpIfNot(r, offset) => write!(f, "jump_ifnot r{r}, {offset:+}"),
            Self::CreateClosure(r, _, captures) => {
                write!(f, "create_closure r{r}, [")?;
                for (i, capture) in captures.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match capture {
                        Capture::Register(reg) => write!(f, "r{reg}")?,
                        Capture::Upvalue(idx) => write!(f, "u{idx}")?,
                    }
                }
                write!(f, "]")
            }
            Self::Close(begin) => write!(f, "close r{begin}"),
            Self::Binary(op, dst, left, right) => {
                write!(f, "{} r{dst}, r{left}, r{right}", op.mnemonic())
            }
        }
    }
}

/// Growable instruction buffer used while a function is being compiled.
#[derive(Clone, Debug, Default)]
pub struct CodeBuffer {
    /// The instructions.
    ops: Vec<Op>,
    /// Source line of each instruction.
    lines: Vec<u32>,
}

impl CodeBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an instruction and returns its index.
    pub fn emit(&mut self, op: Op, line: u32) -> usize {
        let idx = self.ops.len();
        self.ops.push(op);
        self.lines.push(line);
        idx
    }

    /// Returns the current instruction count (next instruction index).
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if there are no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Returns the emitted instructions.
    #[must_use]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Patches the jump instruction at `idx` with a new offset.
    ///
    /// # Panics
    /// Panics if the instruction at `idx` is not a jump instruction.
    pub fn patch_jump(&mut self, idx: usize, offset: i32) {
        match &mut self.ops[idx] {
            Op::Jump(o) | Op::JumpIf(_, o) | Op::JumpIfNot(_, o) => {
                *o = offset;
            }
            other => panic!("Cannot patch non-jump instruction: {other}"),
        }
    }
}

/// An immutable compiled function body.
///
/// Shared by every closure created from it. The evaluator used to run it is
/// chosen by the VM's backend on the first call and cached here.
pub struct Bytecode {
    param_count: u16,
    reg_count: u16,
    upval_count: u16,
    ops: Box<[Op]>,
    lines: Box<[u32]>,
    evaluator: OnceCell<Rc<dyn Evaluator>>,
}

impl Bytecode {
    /// Bakes a finished code buffer into a bytecode record.
    #[must_use]
    pub fn new(param_count: u16, reg_count: u16, upval_count: u16, code: CodeBuffer) -> Self {
        Self {
            param_count,
            reg_count,
            upval_count,
            ops: code.ops.into_boxed_slice(),
            lines: code.lines.into_boxed_slice(),
            evaluator: OnceCell::new(),
        }
    }

    /// Number of declared parameters.
    #[must_use]
    pub fn param_count(&self) -> u16 {
        self.param_count
    }

    /// Size of the register window a call needs.
    #[must_use]
    pub fn reg_count(&self) -> u16 {
        self.reg_count
    }

    /// Number of upvalues a closure over this code carries.
    #[must_use]
    pub fn upval_count(&self) -> u16 {
        self.upval_count
    }

    /// The instruction array.
    #[must_use]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Source line of the instruction at `pc`.
    #[must_use]
    pub fn line(&self, pc: usize) -> Option<u32> {
        self.lines.get(pc).copied()
    }

    /// Returns the evaluator for this code, asking `backend` on first use.
    pub fn evaluator(&self, backend: &dyn Backend) -> Rc<dyn Evaluator> {
        self.evaluator.get_or_init(|| backend.select(self)).clone()
    }

    /// Returns the evaluator if one has been resolved.
    #[must_use]
    pub fn resolved_evaluator(&self) -> Option<&Rc<dyn Evaluator>> {
        self.evaluator.get()
    }

    /// Installs an evaluator ahead of the first call. Returns false if one
    /// was already resolved.
    pub fn set_evaluator(&self, evaluator: Rc<dyn Evaluator>) -> bool {
        self.evaluator.set(evaluator).is_ok()
    }

    /// Renders a listing; `deep` also lists nested closure bodies.
    #[must_use]
    pub fn disassemble(&self, deep: bool) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_listing(&mut out, "", deep);
        out
    }

    fn write_listing(&self, out: &mut String, indent: &str, deep: bool) -> fmt::Result {
        writeln!(
            out,
            "{indent}{} params, {} registers, {} upvals",
            self.param_count, self.reg_count, self.upval_count
        )?;
        for (pc, op) in self.ops.iter().enumerate() {
            writeln!(out, "{indent}{pc:02}: {op}")?;
            if let (true, Op::CreateClosure(_, code, _)) = (deep, op) {
                code.write_listing(out, &format!("{indent}    "), deep)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.disassemble(false))
    }
}

impl fmt::Debug for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bytecode")
            .field("param_count", &self.param_count)
            .field("reg_count", &self.reg_count)
            .field("upval_count", &self.upval_count)
            .field("ops", &self.ops)
            .field(
                "evaluator",
                &self.evaluator.get().map(|evaluator| evaluator.name()),
            )
            .finish()
    }
}
